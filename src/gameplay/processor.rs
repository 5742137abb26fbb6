use super::board::BoardState;
use super::card_in_play::CardInPlay;
use super::event::GameEvent;
use super::event::StateSync;
use super::location::LocationInPlay;
use super::zone::Zone;
use crate::cards::CardRegistry;
use std::sync::Arc;

/// Result of folding one event. An event either applies fully or is skipped
/// with a reason; the fold never panics and never leaves the board half
/// mutated.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Outcome {
    Applied,
    Skipped(&'static str),
}

/// The deterministic fold `(BoardState, GameEvent) -> BoardState`.
pub struct Processor {
    registry: Arc<CardRegistry>,
}

impl Processor {
    pub fn new(registry: Arc<CardRegistry>) -> Self {
        Self { registry }
    }

    pub fn apply(&self, board: &mut BoardState, event: &GameEvent) -> Outcome {
        match event {
            GameEvent::PutCardInPlay {
                card_id,
                blueprint_id,
                zone,
                owner,
                location_index,
                target_card_id,
                system_name,
            } => match zone {
                Zone::Locations => self.place_location(
                    board,
                    card_id,
                    blueprint_id,
                    owner,
                    *location_index,
                    system_name.as_deref(),
                ),
                _ => self.place_card(
                    board,
                    card_id,
                    blueprint_id,
                    zone.clone(),
                    owner,
                    *location_index,
                    target_card_id.as_deref(),
                ),
            },
            GameEvent::RemoveCardInPlay { card_ids } => {
                for card_id in card_ids {
                    self.remove_card(board, card_id);
                }
                Outcome::Applied
            }
            GameEvent::MoveCardInPlay {
                card_id,
                zone,
                location_index,
                target_card_id,
            } => self.move_card(
                board,
                card_id,
                zone.clone(),
                *location_index,
                target_card_id.as_deref(),
            ),
            GameEvent::GameState(sync) => self.sync_state(board, sync),
            GameEvent::Participant { name, side, all } => {
                for participant in all {
                    if participant != &board.my_name && board.opponent_name.is_none() {
                        log::info!("opponent: {}", participant);
                        board.opponent_name = Some(participant.clone());
                    }
                }
                if name == &board.my_name {
                    if let Some(side) = side {
                        log::info!("playing the {} side", side);
                        board.my_side = Some(*side);
                    }
                }
                Outcome::Applied
            }
            GameEvent::TurnChange { player } => {
                board.current_player = Some(player.clone());
                match board.starting_player.clone() {
                    None => {
                        board.starting_player = Some(player.clone());
                        board.turn_number = board.turn_number.max(1);
                    }
                    Some(first) if &first == player => board.turn_number += 1,
                    Some(_) => {}
                }
                log::info!("turn {} of {}", board.turn_number, player);
                Outcome::Applied
            }
            GameEvent::PhaseChange { phase } => {
                board.current_phase = phase.clone();
                if let Some(turn) = Self::turn_of(phase) {
                    board.turn_number = turn;
                }
                log::info!("phase: {} (turn {})", phase, board.turn_number);
                Outcome::Applied
            }
            GameEvent::StartBattle => {
                board.in_battle = true;
                Outcome::Applied
            }
            GameEvent::EndBattle => {
                board.in_battle = false;
                Outcome::Applied
            }
            GameEvent::Message { text } => self.read_message(board, text),
            GameEvent::Decision(_) => Outcome::Applied,
            GameEvent::Chat { from, text } => {
                log::info!("chat <{}> {}", from, text);
                Outcome::Applied
            }
            GameEvent::GameEnd => {
                board.game_over = true;
                Outcome::Applied
            }
            GameEvent::Unknown { tag } => {
                log::debug!("ignoring unknown event tag {}", tag);
                Outcome::Skipped("unrecognized tag")
            }
        }
    }

    // ---- placement -------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn place_card(
        &self,
        board: &mut BoardState,
        card_id: &str,
        blueprint_id: &str,
        zone: Zone,
        owner: &str,
        location_index: Option<usize>,
        target_card_id: Option<&str>,
    ) -> Outcome {
        // all validation happens before any mutation
        if zone == Zone::Attached {
            let Some(target_id) = target_card_id else {
                return Outcome::Skipped("attach without target");
            };
            if target_id == card_id {
                return Outcome::Skipped("card cannot attach to itself");
            }
            if !board.cards.contains_key(target_id) {
                return Outcome::Skipped("attach target unknown");
            }
            if Self::would_cycle(board, card_id, target_id) {
                return Outcome::Skipped("attachment cycle");
            }
        }
        if zone == Zone::AtLocation && location_index.is_none() {
            return Outcome::Skipped("placement without location index");
        }

        Self::unplace(board, card_id);

        let entry = board
            .cards
            .entry(card_id.to_string())
            .or_insert_with(|| CardInPlay::new(card_id, blueprint_id, owner, Zone::Unknown));
        entry.zone = zone.clone();
        entry.owner = owner.to_string();
        if !blueprint_id.is_empty() {
            entry.blueprint_id = blueprint_id.to_string();
        }
        entry.location_index = location_index;
        entry.attached_to = None;
        if entry.title.is_empty() {
            if let Some(card) = self.registry.get(&entry.blueprint_id) {
                entry.absorb(card);
            }
        }

        match zone {
            Zone::AtLocation => {
                let index = location_index.expect("validated above");
                let mine = board.is_mine(owner);
                let location = board.ensure_location(index);
                let list = match mine {
                    true => &mut location.my_cards,
                    false => &mut location.their_cards,
                };
                if !list.iter().any(|id| id == card_id) {
                    list.push(card_id.to_string());
                }
            }
            Zone::Hand => {
                if board.is_mine(owner) && !board.my_zones.hand.iter().any(|id| id == card_id) {
                    board.my_zones.hand.push(card_id.to_string());
                }
            }
            Zone::Attached => {
                let target_id = target_card_id.expect("validated above");
                let inherited = board.cards.get(target_id).and_then(|t| t.location_index);
                if let Some(parent) = board.cards.get_mut(target_id) {
                    if !parent.attachments.iter().any(|id| id == card_id) {
                        parent.attachments.push(card_id.to_string());
                    }
                }
                if let Some(child) = board.cards.get_mut(card_id) {
                    child.attached_to = Some(target_id.to_string());
                    child.location_index = inherited;
                }
            }
            _ => {}
        }

        if zone == Zone::AtLocation && board.is_mine(owner) {
            if let Ok(mut plan) = board.plan.lock() {
                plan.on_friendly_deploy(card_id, blueprint_id);
            }
        }
        Outcome::Applied
    }

    fn place_location(
        &self,
        board: &mut BoardState,
        card_id: &str,
        blueprint_id: &str,
        owner: &str,
        location_index: Option<usize>,
        system_name: Option<&str>,
    ) -> Outcome {
        let Some(index) = location_index else {
            return Outcome::Skipped("location without index");
        };
        let metadata = self.registry.get(blueprint_id);
        let site_name = metadata
            .map(|card| card.title.clone())
            .or_else(|| system_name.map(String::from))
            .unwrap_or_else(|| format!("Location {}", index));
        let system = system_name
            .filter(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| LocationInPlay::system_of(&site_name));

        let mut is_site = false;
        let mut is_space = false;
        let mut is_ground = false;
        if let Some(card) = metadata {
            is_site = card.is_site();
            if card.is_system_or_sector() {
                is_space = true;
            }
            if is_site {
                if card.is_interior() || card.is_exterior() || card.has_planet_icon() {
                    is_ground = true;
                }
                if card.has_space_icon() {
                    is_space = true;
                }
                if card.is_docking_bay() {
                    is_space = true;
                    is_ground = true;
                }
                // a site the metadata cannot classify defaults to ground
                if !is_ground && !is_space {
                    is_ground = true;
                }
            }
        }

        board.add_location(LocationInPlay {
            card_id: card_id.to_string(),
            blueprint_id: blueprint_id.to_string(),
            owner: owner.to_string(),
            location_index: index,
            system_name: system,
            site_name: site_name.clone(),
            is_site,
            is_space,
            is_ground,
            my_cards: Vec::new(),
            their_cards: Vec::new(),
        });

        let mut entry = CardInPlay::new(card_id, blueprint_id, owner, Zone::Locations);
        if let Some(card) = metadata {
            entry.absorb(card);
        }
        board.cards.insert(card_id.to_string(), entry);
        log::info!("location {} at index {}", site_name, index);
        Outcome::Applied
    }

    fn remove_card(&self, board: &mut BoardState, card_id: &str) -> Outcome {
        if !board.cards.contains_key(card_id) {
            // first sighting followed by removal nets out to nothing
            log::warn!("remove of unknown card {}", card_id);
            return Outcome::Applied;
        }
        if let Some(slot) = board
            .locations
            .iter()
            .position(|loc| loc.card_id == card_id)
        {
            // location slots keep their index; only the identity clears
            let location = &mut board.locations[slot];
            location.card_id.clear();
            location.blueprint_id.clear();
            location.site_name.clear();
            location.system_name = format!("Location {}", slot);
            board.cards.remove(card_id);
            return Outcome::Applied;
        }
        Self::unplace(board, card_id);
        let children = board
            .cards
            .get(card_id)
            .map(|card| card.attachments.clone())
            .unwrap_or_default();
        for child_id in children {
            if let Some(child) = board.cards.get_mut(&child_id) {
                child.attached_to = None;
            }
        }
        board.cards.remove(card_id);
        Outcome::Applied
    }

    fn move_card(
        &self,
        board: &mut BoardState,
        card_id: &str,
        zone: Option<Zone>,
        location_index: Option<usize>,
        target_card_id: Option<&str>,
    ) -> Outcome {
        let (blueprint_id, owner, current_zone, current_index) = match board.cards.get(card_id) {
            Some(card) => (
                card.blueprint_id.clone(),
                card.owner.clone(),
                card.zone.clone(),
                card.location_index,
            ),
            None => {
                // unknown id: treat the move as a first sighting
                log::warn!("move of unknown card {}, creating", card_id);
                (String::new(), String::new(), Zone::Unknown, None)
            }
        };
        let zone = zone.unwrap_or(current_zone);
        let index = location_index.or(current_index);
        self.place_card(board, card_id, &blueprint_id, zone, &owner, index, target_card_id)
    }

    // ---- bookkeeping -----------------------------------------------------

    /// Pulls a card out of whatever container currently holds it, clearing
    /// both directions of any attachment edge. Zone changes are moves, not
    /// duplications.
    fn unplace(board: &mut BoardState, card_id: &str) {
        let Some((parent, index)) = board
            .cards
            .get(card_id)
            .map(|card| (card.attached_to.clone(), card.location_index))
        else {
            return;
        };
        if let Some(parent_id) = parent {
            if let Some(parent) = board.cards.get_mut(&parent_id) {
                parent.attachments.retain(|id| id != card_id);
            }
            if let Some(card) = board.cards.get_mut(card_id) {
                card.attached_to = None;
            }
        }
        if let Some(index) = index {
            if let Some(location) = board.locations.get_mut(index) {
                location.my_cards.retain(|id| id != card_id);
                location.their_cards.retain(|id| id != card_id);
            }
        }
        board.my_zones.hand.retain(|id| id != card_id);
    }

    fn would_cycle(board: &BoardState, card_id: &str, target_id: &str) -> bool {
        let mut cursor = Some(target_id.to_string());
        let mut hops = 0;
        while let Some(id) = cursor {
            if id == card_id {
                return true;
            }
            cursor = board.cards.get(&id).and_then(|card| card.attached_to.clone());
            hops += 1;
            if hops > 64 {
                return true;
            }
        }
        false
    }

    fn sync_state(&self, board: &mut BoardState, sync: &StateSync) -> Outcome {
        board.dark_generation = sync.dark_generation;
        board.light_generation = sync.light_generation;
        for zones in &sync.zones {
            let target = match zones.name == board.my_name {
                true => &mut board.my_zones,
                false => &mut board.their_zones,
            };
            target.force_pile = zones.force_pile;
            target.used_pile = zones.used_pile;
            target.reserve_deck = zones.reserve_deck;
            target.lost_pile = zones.lost_pile;
            target.out_of_play = zones.out_of_play;
            target.hand_size = zones.hand;
        }
        // arrays are replaced wholesale, never accumulated
        if let Some(power) = &sync.dark_power {
            board.dark_power = power.clone();
        }
        if let Some(power) = &sync.light_power {
            board.light_power = power.clone();
        }
        Outcome::Applied
    }

    fn read_message(&self, board: &mut BoardState, text: &str) -> Outcome {
        if let Some((winner, reason)) = text.split_once(" is the winner due to: ") {
            board.game_winner = Some(winner.to_string());
            board.game_win_reason = Some(reason.to_string());
            log::info!("winner: {} ({})", winner, reason);
        } else if let Some((loser, reason)) = text.split_once(" lost due to: ") {
            if board.game_winner.is_none() {
                let winner = match loser == board.my_name {
                    true => board
                        .opponent_name
                        .clone()
                        .unwrap_or_else(|| "opponent".to_string()),
                    false => board.my_name.clone(),
                };
                board.game_winner = Some(winner);
                board.game_win_reason = Some(reason.to_string());
            }
        }
        Outcome::Applied
    }

    /// Turn number embedded in phase strings like "Deploy (turn #2)".
    fn turn_of(phase: &str) -> Option<u32> {
        let start = phase.find("turn #")? + "turn #".len();
        let digits = phase[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>();
        digits.parse().ok()
    }
}
