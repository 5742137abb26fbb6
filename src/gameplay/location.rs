/// One slot in the server-indexed row of locations.
///
/// Cards may be placed at an index before the location itself is revealed,
/// so a slot can be a placeholder: empty `card_id`, synthetic name, all
/// flags false. The authoritative location event later fills it in without
/// disturbing the cards already parked there.
#[derive(Debug, Default, Clone)]
pub struct LocationInPlay {
    pub card_id: String,
    pub blueprint_id: String,
    pub owner: String,
    pub location_index: usize,
    pub system_name: String,
    pub site_name: String,
    pub is_site: bool,
    pub is_space: bool,
    pub is_ground: bool,
    pub my_cards: Vec<String>,
    pub their_cards: Vec<String>,
}

impl LocationInPlay {
    pub fn placeholder(index: usize) -> Self {
        Self {
            location_index: index,
            system_name: format!("Location {}", index),
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.card_id.is_empty()
    }

    pub fn display_name(&self) -> &str {
        match (self.site_name.is_empty(), self.system_name.is_empty()) {
            (false, _) => &self.site_name,
            (true, false) => &self.system_name,
            (true, true) => &self.blueprint_id,
        }
    }

    /// Prefix before the first ':' of the full title, or the whole name for
    /// system cards.
    pub fn system_of(name: &str) -> String {
        name.split(':').next().unwrap_or(name).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prefix_extraction() {
        assert_eq!(
            LocationInPlay::system_of("Yavin 4: Massassi Throne Room"),
            "Yavin 4"
        );
        assert_eq!(LocationInPlay::system_of("Coruscant"), "Coruscant");
    }

    #[test]
    fn placeholder_has_synthetic_name() {
        let slot = LocationInPlay::placeholder(2);
        assert!(slot.is_placeholder());
        assert_eq!(slot.display_name(), "Location 2");
        assert!(!slot.is_ground && !slot.is_space && !slot.is_site);
    }
}
