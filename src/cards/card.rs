use super::kind::CardKind;
use super::side::Side;

/// Immutable card metadata loaded from the JSON corpus.
///
/// Stats are kept as the raw printed strings because the corpus carries
/// non-numeric values ("*", "X", "1-3"); the `*_value` accessors parse what
/// they can and fall back to 0. Icons are free-form strings, so every
/// predicate is case-insensitive substring containment over a small fixed
/// vocabulary.
#[derive(Debug, Default, Clone)]
pub struct Card {
    pub blueprint_id: String,
    pub title: String,
    pub side: Option<Side>,
    pub kind: CardKind,
    pub sub_type: Option<String>,

    pub power: Option<String>,
    pub ability: Option<String>,
    pub deploy: Option<String>,
    pub forfeit: Option<String>,
    pub destiny: Option<String>,

    pub parsec: Option<String>,
    pub hyperspeed: Option<String>,

    pub light_side_icons: i32,
    pub dark_side_icons: i32,

    pub gametext: String,
    pub lore: String,
    pub characteristics: Vec<String>,
    pub icons: Vec<String>,
    pub matching: Option<String>,

    pub is_unique: bool,
    pub is_defensive_shield: bool,
}

impl Card {
    fn numeric(stat: &Option<String>) -> i32 {
        stat.as_deref()
            .and_then(|s| s.trim().parse::<i32>().ok())
            .unwrap_or(0)
    }

    pub fn power_value(&self) -> i32 {
        Self::numeric(&self.power)
    }
    pub fn ability_value(&self) -> i32 {
        Self::numeric(&self.ability)
    }
    pub fn deploy_value(&self) -> i32 {
        Self::numeric(&self.deploy)
    }
    pub fn forfeit_value(&self) -> i32 {
        Self::numeric(&self.forfeit)
    }
    pub fn parsec_value(&self) -> Option<i32> {
        self.parsec.as_deref().and_then(|s| s.trim().parse().ok())
    }
    pub fn hyperspeed_value(&self) -> i32 {
        Self::numeric(&self.hyperspeed)
    }

    fn has_icon(&self, needle: &str) -> bool {
        self.icons
            .iter()
            .any(|icon| icon.to_ascii_lowercase().contains(needle))
    }

    pub fn is_character(&self) -> bool {
        self.kind == CardKind::Character
    }
    pub fn is_starship(&self) -> bool {
        self.kind == CardKind::Starship
    }
    pub fn is_vehicle(&self) -> bool {
        self.kind == CardKind::Vehicle
    }
    pub fn is_location(&self) -> bool {
        self.kind == CardKind::Location
    }
    pub fn is_effect(&self) -> bool {
        self.kind == CardKind::Effect
    }
    pub fn is_interrupt(&self) -> bool {
        self.kind == CardKind::Interrupt
    }
    pub fn is_weapon(&self) -> bool {
        self.kind == CardKind::Weapon
    }
    pub fn is_device(&self) -> bool {
        self.kind == CardKind::Device
    }

    /// Pilot icon on a character. Ships with built-in pilots also carry the
    /// icon but are not themselves pilots; see `has_permanent_pilot`.
    pub fn is_pilot(&self) -> bool {
        self.is_character() && self.has_icon("pilot")
    }

    pub fn is_warrior(&self) -> bool {
        self.has_icon("warrior")
    }

    /// Pilot icon on a starship or vehicle means the crew is printed on.
    pub fn has_permanent_pilot(&self) -> bool {
        (self.is_starship() || self.is_vehicle()) && self.has_icon("pilot")
    }

    /// Presence requires a character with ability; droids do not qualify.
    pub fn provides_presence(&self) -> bool {
        self.is_character() && self.ability_value() > 0
    }

    pub fn is_interior(&self) -> bool {
        self.has_icon("interior")
    }
    pub fn is_exterior(&self) -> bool {
        self.has_icon("exterior")
    }
    pub fn has_planet_icon(&self) -> bool {
        self.has_icon("planet")
    }
    pub fn has_space_icon(&self) -> bool {
        self.has_icon("space") || self.has_icon("starship")
    }

    pub fn is_docking_bay(&self) -> bool {
        self.title.to_ascii_lowercase().contains("docking bay") || self.has_icon("docking")
    }

    pub fn is_site(&self) -> bool {
        self.sub_type
            .as_deref()
            .map(|s| s.to_ascii_lowercase().contains("site"))
            .unwrap_or(false)
    }

    /// Systems and sectors are space-only locations even when they carry a
    /// Planet icon.
    pub fn is_system_or_sector(&self) -> bool {
        self.sub_type
            .as_deref()
            .map(|s| {
                let s = s.to_ascii_lowercase();
                s.contains("system") || s.contains("sector")
            })
            .unwrap_or(false)
    }

    /// Allowed system names parsed from a "Deploys only on ..." clause in the
    /// gametext, or None when the card deploys freely.
    pub fn deploy_restrictions(&self) -> Option<Vec<String>> {
        let text = self.gametext.to_ascii_lowercase();
        let start = ["deploys only on ", "deploy only on ", "deploys only to "]
            .iter()
            .find_map(|pat| text.find(pat).map(|i| i + pat.len()))?;
        let clause = &text[start..];
        let clause = clause.split(['.', ';', '(']).next().unwrap_or(clause);
        let systems = clause
            .split(" or ")
            .flat_map(|part| part.split(','))
            .map(|name| name.trim().trim_end_matches('.').to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        match systems.is_empty() {
            true => None,
            false => Some(systems),
        }
    }

    /// Whether a location with the given system name satisfies this card's
    /// deploy restriction. Unrestricted cards go anywhere.
    pub fn may_deploy_at(&self, system_name: &str) -> bool {
        match self.deploy_restrictions() {
            None => true,
            Some(allowed) => {
                let system = system_name.to_ascii_lowercase();
                allowed.iter().any(|name| system.contains(name.as_str()))
            }
        }
    }
}
