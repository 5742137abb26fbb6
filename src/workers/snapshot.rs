use super::phase::Phase;
use crate::gameplay::BoardState;
use crate::players::GameHistory;
use serde::Serialize;
use std::collections::HashMap;

/// A consistent, serializable digest of the worker's state, published at
/// event-batch boundaries. Admin observers read these instead of touching
/// live state, so they can never see a half-applied event.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Snapshot {
    pub phase: String,
    pub game_phase: String,
    pub turn_number: u32,
    pub my_side: String,
    pub opponent: String,
    pub force_pile: u32,
    pub their_force_pile: u32,
    pub reserve_deck: u32,
    pub hand_size: usize,
    pub my_power: i32,
    pub their_power: i32,
    pub power_advantage: i32,
    pub force_advantage: i32,
    pub locations: Vec<LocationDigest>,
    pub deploy_plan: String,
    pub decisions_answered: usize,
    pub decisions_by_kind: HashMap<String, usize>,
    pub wedges_broken: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LocationDigest {
    pub index: usize,
    pub name: String,
    pub my_power: i32,
    pub their_power: i32,
    pub my_cards: usize,
    pub their_cards: usize,
}

impl Snapshot {
    pub fn of(phase: Phase, board: &BoardState, history: &GameHistory) -> Self {
        Self {
            phase: phase.to_string(),
            game_phase: board.current_phase.clone(),
            turn_number: board.turn_number,
            my_side: board
                .my_side
                .map(|side| side.to_string())
                .unwrap_or_default(),
            // the board learns the opponent from participant events; until
            // then the history carries the name from the hall listing
            opponent: board
                .opponent_name
                .clone()
                .unwrap_or_else(|| history.opponent_name.clone()),
            force_pile: board.my_zones.force_pile,
            their_force_pile: board.their_zones.force_pile,
            reserve_deck: board.my_zones.reserve_deck,
            hand_size: board.hand_size(),
            my_power: board.total_my_power(),
            their_power: board.total_their_power(),
            power_advantage: board.power_advantage(),
            force_advantage: board.force_advantage(),
            locations: board
                .locations
                .iter()
                .enumerate()
                .map(|(index, location)| LocationDigest {
                    index,
                    name: location.display_name().to_string(),
                    my_power: board.my_power_at(index),
                    their_power: board.their_power_at(index),
                    my_cards: location.my_cards.len(),
                    their_cards: location.their_cards.len(),
                })
                .collect(),
            deploy_plan: board
                .plan
                .lock()
                .map(|plan| plan.summary())
                .unwrap_or_default(),
            decisions_answered: history.decisions_total,
            decisions_by_kind: history.decisions_by_kind.clone(),
            wedges_broken: history.wedges_broken,
        }
    }
}
