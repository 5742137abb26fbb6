use super::card_in_play::CardInPlay;
use super::location::LocationInPlay;
#[cfg(test)]
use super::zone::Zone;
use crate::cards::Side;
use crate::planner::DeployPlan;
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-player pile counters plus the ordered hand. Only our own hand has
/// visible card ids; the opponent's stays empty and `hand_size` carries the
/// server-reported count for both.
#[derive(Debug, Default, Clone)]
pub struct ZoneState {
    pub hand: Vec<String>,
    pub hand_size: u32,
    pub force_pile: u32,
    pub used_pile: u32,
    pub lost_pile: u32,
    pub reserve_deck: u32,
    pub out_of_play: u32,
}

/// Canonical in-memory game state: the deterministic fold target of the
/// event stream. Owned and mutated only by the worker's processor; brains
/// and observers get shared references or snapshots.
#[derive(Debug, Default)]
pub struct BoardState {
    pub my_name: String,
    pub opponent_name: Option<String>,
    pub my_side: Option<Side>,

    pub cards: HashMap<String, CardInPlay>,
    pub locations: Vec<LocationInPlay>,
    pub my_zones: ZoneState,
    pub their_zones: ZoneState,

    /// Authoritative per-location sums straight off GS events, raw. Negative
    /// readings encode force icons, not power, and are clamped in queries.
    pub dark_power: HashMap<usize, i32>,
    pub light_power: HashMap<usize, i32>,
    pub dark_generation: i32,
    pub light_generation: i32,

    pub current_phase: String,
    pub current_player: Option<String>,
    pub starting_player: Option<String>,
    pub turn_number: u32,
    pub in_battle: bool,

    pub game_over: bool,
    pub game_winner: Option<String>,
    pub game_win_reason: Option<String>,

    /// In-flight deployment plan; the processor binds ship card ids into it
    /// as deploys land, the brain rebuilds it each deploy phase.
    pub plan: Mutex<DeployPlan>,
}

impl BoardState {
    pub fn new(my_name: &str) -> Self {
        Self {
            my_name: my_name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_player.as_deref() == Some(self.my_name.as_str())
    }

    pub fn is_mine(&self, owner: &str) -> bool {
        owner == self.my_name
    }

    // ---- locations -------------------------------------------------------

    /// Grows the location row with placeholders so index `i` always exists.
    pub fn ensure_location(&mut self, index: usize) -> &mut LocationInPlay {
        while self.locations.len() <= index {
            let placeholder = LocationInPlay::placeholder(self.locations.len());
            self.locations.push(placeholder);
        }
        &mut self.locations[index]
    }

    /// Installs an authoritative location at its index. A placeholder slot
    /// is filled in place, inheriting any cards parked there; a slot already
    /// holding a real location means the server opened a new slot, so the
    /// tail shifts right and every shifted card is re-indexed.
    pub fn add_location(&mut self, mut location: LocationInPlay) {
        let index = location.location_index;
        self.ensure_location(index);
        if self.locations[index].is_placeholder() {
            let previous = std::mem::replace(&mut self.locations[index], LocationInPlay::default());
            location.my_cards = previous.my_cards;
            location.their_cards = previous.their_cards;
            self.locations[index] = location;
        } else {
            self.locations.insert(index, location);
            for shifted in index + 1..self.locations.len() {
                self.locations[shifted].location_index = shifted;
                let residents = self.locations[shifted]
                    .my_cards
                    .iter()
                    .chain(self.locations[shifted].their_cards.iter())
                    .cloned()
                    .collect::<Vec<_>>();
                for card_id in residents {
                    if let Some(card) = self.cards.get_mut(&card_id) {
                        card.location_index = Some(shifted);
                    }
                }
            }
        }
    }

    pub fn location_at(&self, index: usize) -> Option<&LocationInPlay> {
        self.locations.get(index)
    }

    pub fn location_by_card_id(&self, card_id: &str) -> Option<&LocationInPlay> {
        self.locations
            .iter()
            .find(|loc| !loc.is_placeholder() && loc.card_id == card_id)
    }

    pub fn system_name_at(&self, index: usize) -> String {
        self.location_at(index)
            .map(|loc| LocationInPlay::system_of(loc.display_name()))
            .unwrap_or_default()
    }

    // ---- power queries ---------------------------------------------------

    fn power_raw(&self, side: Side, index: usize) -> i32 {
        let array = match side {
            Side::Dark => &self.dark_power,
            Side::Light => &self.light_power,
        };
        array.get(&index).copied().unwrap_or(0)
    }

    /// Clamped to 0: negative readings are force icons, not power.
    pub fn my_power_at(&self, index: usize) -> i32 {
        match self.my_side {
            Some(side) => self.power_raw(side, index).max(0),
            None => 0,
        }
    }

    pub fn their_power_at(&self, index: usize) -> i32 {
        match self.my_side {
            Some(side) => self.power_raw(side.opponent(), index).max(0),
            None => 0,
        }
    }

    pub fn total_my_power(&self) -> i32 {
        (0..self.locations.len()).map(|i| self.my_power_at(i)).sum()
    }

    pub fn total_their_power(&self) -> i32 {
        (0..self.locations.len())
            .map(|i| self.their_power_at(i))
            .sum()
    }

    pub fn power_advantage(&self) -> i32 {
        self.total_my_power() - self.total_their_power()
    }

    pub fn force_advantage(&self) -> i32 {
        self.my_zones.force_pile as i32 - self.their_zones.force_pile as i32
    }

    // ---- resource queries ------------------------------------------------

    pub fn hand_size(&self) -> usize {
        match self.my_zones.hand.is_empty() {
            true => self.my_zones.hand_size as usize,
            false => self.my_zones.hand.len(),
        }
    }

    pub fn can_afford(&self, cost: i32) -> bool {
        self.my_zones.force_pile as i32 >= cost
    }

    /// Life force: everything that is not yet lost.
    pub fn total_reserve_force(&self) -> u32 {
        self.my_zones.reserve_deck + self.my_zones.used_pile + self.my_zones.force_pile
    }

    pub fn their_total_life_force(&self) -> u32 {
        self.their_zones.reserve_deck + self.their_zones.used_pile + self.their_zones.force_pile
    }

    pub fn my_generation(&self) -> i32 {
        match self.my_side {
            Some(Side::Dark) => self.dark_generation,
            Some(Side::Light) => self.light_generation,
            None => self.dark_generation.max(self.light_generation),
        }
    }

    // ---- card queries ----------------------------------------------------

    pub fn hand_cards(&self) -> Vec<&CardInPlay> {
        self.my_zones
            .hand
            .iter()
            .filter_map(|id| self.cards.get(id))
            .collect()
    }

    pub fn cards_at(&self, index: usize, mine: bool) -> Vec<&CardInPlay> {
        self.location_at(index)
            .map(|loc| match mine {
                true => &loc.my_cards,
                false => &loc.their_cards,
            })
            .map(|ids| ids.iter().filter_map(|id| self.cards.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every occurrence of a card id across hand, location lists, and the
    /// instance map. Invariant: each id occupies exactly one zone.
    #[cfg(test)]
    pub fn occurrences(&self, card_id: &str) -> usize {
        let in_hand = self.my_zones.hand.iter().filter(|id| *id == card_id).count();
        let at_locations = self
            .locations
            .iter()
            .map(|loc| {
                loc.my_cards.iter().filter(|id| *id == card_id).count()
                    + loc.their_cards.iter().filter(|id| *id == card_id).count()
            })
            .sum::<usize>();
        let floating = self
            .cards
            .get(card_id)
            .map(|card| {
                let placed = matches!(card.zone, Zone::AtLocation) || matches!(card.zone, Zone::Hand);
                !placed as usize
            })
            .unwrap_or(0);
        in_hand + at_locations + floating
    }

    /// Resets everything game-scoped; identity and config survive.
    pub fn clear(&mut self) {
        let my_name = std::mem::take(&mut self.my_name);
        *self = Self::new(&my_name);
    }
}
