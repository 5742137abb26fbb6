use super::brain::Brain;
use super::brain::BrainContext;
use super::brain::BrainDecision;
use crate::config::Config;
use crate::decision::DecisionKind;
use crate::evaluation::ActivationEvaluator;
use crate::evaluation::BattleEvaluator;
use crate::evaluation::CombinedEvaluator;
use crate::evaluation::DeployEvaluator;
use crate::evaluation::DrawEvaluator;
use crate::evaluation::Evaluator;
use crate::evaluation::MoveEvaluator;
use crate::evaluation::PassEvaluator;
use crate::evaluation::SelectionEvaluator;
use crate::evaluation::TextEvaluator;
use crate::gameplay::BoardState;
use crate::planner::DeployPlanner;

/// The reference brain: a fixed evaluator pipeline with weighted scoring.
///
/// Strategy lives entirely in the evaluator list and the deploy planner;
/// this type only wires them together and keeps per-game counters.
pub struct StaticBrain {
    combined: CombinedEvaluator,
    decisions_made: usize,
    games_played: usize,
}

impl StaticBrain {
    pub fn new(_config: &Config) -> Self {
        let evaluators: Vec<Box<dyn Evaluator>> = vec![
            Box::new(DeployEvaluator),
            Box::new(SelectionEvaluator),
            Box::new(BattleEvaluator),
            Box::new(MoveEvaluator),
            Box::new(DrawEvaluator),
            Box::new(TextEvaluator),
            Box::new(ActivationEvaluator),
            Box::new(PassEvaluator),
        ];
        Self {
            combined: CombinedEvaluator::new(evaluators),
            decisions_made: 0,
            games_played: 0,
        }
    }

    /// The first strategic decision of each deploy phase rebuilds the
    /// deployment plan; later decisions in the same phase reuse it.
    fn refresh_plan(&self, context: &BrainContext<'_>) {
        let phase = &context.board.current_phase;
        if !phase.to_ascii_lowercase().contains("deploy") {
            return;
        }
        if !matches!(
            context.request.kind,
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice
        ) {
            return;
        }
        if let Ok(mut plan) = context.board.plan.lock() {
            if !plan.is_current(phase) {
                *plan = DeployPlanner::build(context.board, context.registry, context.config);
            }
        }
    }
}

#[async_trait::async_trait]
impl Brain for StaticBrain {
    async fn make_decision(&mut self, context: &BrainContext<'_>) -> anyhow::Result<BrainDecision> {
        self.refresh_plan(context);
        self.decisions_made += 1;
        let ranked = self.combined.ranked(context);
        match ranked.first() {
            Some(best) => Ok(BrainDecision {
                choice: best.action_id.clone(),
                reasoning: match best.reasoning.is_empty() {
                    true => best.display_text.clone(),
                    false => format!("{} | {}", best.display_text, best.rationale()),
                },
                confidence: (best.score / 100.0).clamp(0.0, 1.0),
                alternative: ranked.get(1).map(|a| a.action_id.clone()),
            }),
            None => match context.request.must_choose() {
                true => Ok(BrainDecision {
                    choice: context
                        .request
                        .first_selectable()
                        .map(|o| o.option_id.clone())
                        .unwrap_or_default(),
                    reasoning: "no evaluator applied, first option".to_string(),
                    confidence: 0.0,
                    alternative: None,
                }),
                false => Ok(BrainDecision::pass("no evaluator applied")),
            },
        }
    }

    fn on_game_start(&mut self, opponent: &str, deck: &str, side: &str) {
        self.decisions_made = 0;
        log::info!("game start vs {} with {} ({})", opponent, deck, side);
    }

    fn on_game_end(&mut self, won: bool, final_state: &BoardState) {
        self.games_played += 1;
        log::info!(
            "game over: {} after {} decisions (power {} vs {})",
            match won {
                true => "won",
                false => "lost",
            },
            self.decisions_made,
            final_state.total_my_power(),
            final_state.total_their_power(),
        );
    }

    fn personality(&self) -> &str {
        "Static"
    }
}
