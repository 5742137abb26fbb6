use super::brain::Brain;
use super::brain::BrainContext;
use super::brain::BrainDecision;
use crate::gameplay::BoardState;
use rand::seq::SliceRandom;

/// Picks any selectable option uniformly. Exists for soak testing the
/// transport and fold without strategy in the way.
#[derive(Debug, Default)]
pub struct RandomBrain;

#[async_trait::async_trait]
impl Brain for RandomBrain {
    async fn make_decision(&mut self, context: &BrainContext<'_>) -> anyhow::Result<BrainDecision> {
        let options = context.request.selectable_options();
        let choice = options
            .choose(&mut rand::thread_rng())
            .map(|option| option.option_id.clone())
            .unwrap_or_default();
        Ok(BrainDecision {
            choice,
            reasoning: "random".to_string(),
            confidence: 0.0,
            alternative: None,
        })
    }

    fn on_game_start(&mut self, opponent: &str, _deck: &str, _side: &str) {
        log::info!("random brain vs {}", opponent);
    }

    fn on_game_end(&mut self, _won: bool, _final_state: &BoardState) {}

    fn personality(&self) -> &str {
        "Random"
    }
}
