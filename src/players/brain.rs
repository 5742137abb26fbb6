use crate::cards::CardRegistry;
use crate::config::Config;
use crate::decision::DecisionKind;
use crate::decision::DecisionRequest;
use crate::gameplay::BoardState;
use std::collections::HashMap;

/// Everything a brain may consult for one decision: a read-only view of the
/// projected board, the card registry, the decision itself, running history,
/// and the tuning knobs.
pub struct BrainContext<'a> {
    pub board: &'a BoardState,
    pub registry: &'a CardRegistry,
    pub request: &'a DecisionRequest,
    pub history: &'a GameHistory,
    pub config: &'a Config,
}

/// The brain's answer: which option to take and why. `choice` is the raw
/// option id posted to the server; empty means pass.
#[derive(Debug, Default, Clone)]
pub struct BrainDecision {
    pub choice: String,
    pub reasoning: String,
    pub confidence: f64,
    pub alternative: Option<String>,
}

impl BrainDecision {
    pub fn pass(reason: &str) -> Self {
        Self {
            choice: String::new(),
            reasoning: reason.to_string(),
            confidence: 0.0,
            alternative: None,
        }
    }
}

/// Running counters across one game, for pattern recognition and logging.
/// Deliberately cheap: updated once per decision, never on the hot path of
/// event folding.
#[derive(Debug, Default)]
pub struct GameHistory {
    pub decisions_total: usize,
    pub decisions_by_kind: HashMap<String, usize>,
    pub opponent_name: String,
    pub wedges_broken: usize,
}

impl GameHistory {
    pub fn record(&mut self, kind: &DecisionKind) {
        self.decisions_total += 1;
        *self.decisions_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn reset(&mut self, opponent: &str) {
        *self = Self {
            opponent_name: opponent.to_string(),
            ..Self::default()
        };
    }
}

/// The decision-making contract. The core owns zero strategy; it owns this
/// interface and the safety net around it. Async so future brains can await
/// remote inference without changing the worker.
#[async_trait::async_trait]
pub trait Brain: Send {
    /// The single call on the hot path. Errors are tolerated: the pipeline
    /// falls back to a safe answer and the worker keeps playing.
    async fn make_decision(&mut self, context: &BrainContext<'_>) -> anyhow::Result<BrainDecision>;

    fn on_game_start(&mut self, opponent: &str, deck: &str, side: &str);

    fn on_game_end(&mut self, won: bool, final_state: &BoardState);

    fn personality(&self) -> &str;
}
