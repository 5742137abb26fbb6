use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;

/// Draw-phase pacing: refill toward the soft cap, never past the hard cap,
/// and stop when the force pile cannot spare the card.
pub struct DrawEvaluator;

impl Evaluator for DrawEvaluator {
    fn name(&self) -> &str {
        "draw"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        matches!(
            context.request.kind,
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice
        ) && context
            .request
            .options
            .iter()
            .any(|o| o.display_text.contains("Draw"))
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let board = context.board;
        let hand = board.hand_size();
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            if !option.display_text.contains("Draw") {
                continue;
            }
            let mut action = EvaluatedAction::new(&option.option_id, 25.0, &option.display_text);
            if hand >= context.config.max_hand_size {
                action.add_reason("hand at hard cap", -60.0);
            } else if hand >= context.config.hand_soft_cap {
                action.add_reason("hand above soft cap", -20.0);
            } else if hand < 7 {
                action.add_reason("refill a thin hand", 20.0);
            }
            if board.my_zones.force_pile < 2 {
                action.add_reason("force pile nearly empty", -15.0);
            }
            actions.push(action);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;
    use crate::config::Config;
    use crate::decision::DecisionOption;
    use crate::decision::DecisionRequest;
    use crate::gameplay::BoardState;
    use crate::players::GameHistory;

    fn draw_request() -> DecisionRequest {
        DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::CardActionChoice,
            prompt: "Draw phase".into(),
            options: vec![DecisionOption {
                option_id: "0".into(),
                display_text: "Draw card into hand from Force Pile".into(),
                selectable: true,
                ..DecisionOption::default()
            }],
            no_pass: false,
            ..DecisionRequest::default()
        }
    }

    #[test]
    fn thin_hand_draws_and_capped_hand_stops() {
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = draw_request();

        let mut thin = BoardState::new("bot");
        thin.my_zones.hand_size = 3;
        thin.my_zones.force_pile = 6;
        let context = BrainContext {
            board: &thin,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let eager = DrawEvaluator.evaluate(&context).remove(0).score;

        let mut full = BoardState::new("bot");
        full.my_zones.hand_size = 16;
        full.my_zones.force_pile = 6;
        let context = BrainContext {
            board: &full,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let sated = DrawEvaluator.evaluate(&context).remove(0).score;

        assert!(eager > 40.0);
        assert!(sated < 5.0);
    }
}
