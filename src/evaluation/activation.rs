use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;

/// Answers INTEGER decisions, which in practice means force activation.
///
/// The server's default is used when it supplies one. The "allow opponent
/// to activate" prompt is answered with 0; guessing other prompt patterns
/// is deliberately avoided.
pub struct ActivationEvaluator;

impl Evaluator for ActivationEvaluator {
    fn name(&self) -> &str {
        "activation"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        context.request.kind == DecisionKind::Integer
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let request = context.request;
        let board = context.board;
        let mut action = EvaluatedAction::new("", 50.0, "Choose amount");
        let amount = match request.default_value {
            Some(default) => {
                action.add_reason("server default", 0.0);
                default
            }
            None if request
                .prompt
                .to_ascii_lowercase()
                .contains("allow opponent to activate") =>
            {
                action.add_reason("never fund the opponent", 0.0);
                0
            }
            None => {
                let mut amount = request.max;
                if board.my_zones.force_pile > 12 {
                    action.add_reason("force pile already deep", 0.0);
                    amount = amount.min(2);
                }
                let reserve = board.my_zones.reserve_deck as i64;
                if reserve <= amount {
                    action.add_reason("keep destiny cards in reserve", 0.0);
                    amount = (reserve - 3).max(0);
                }
                amount
            }
        };
        let amount = amount.clamp(request.min, request.max.max(request.min));
        action.action_id = amount.to_string();
        action.display_text = format!("Activate {}", amount);
        vec![action]
    }
}
