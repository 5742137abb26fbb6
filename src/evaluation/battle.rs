use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;
use crate::Score;

/// Battle initiation: fight only where the power math is favorable.
pub struct BattleEvaluator;

impl Evaluator for BattleEvaluator {
    fn name(&self) -> &str {
        "battle"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        matches!(
            context.request.kind,
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice
        ) && context
            .request
            .options
            .iter()
            .any(|o| o.display_text.contains("battle") || o.display_text.contains("Battle"))
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let board = context.board;
        // the best contested location decides how eager we are overall
        let best_edge = (0..board.locations.len())
            .filter(|i| board.their_power_at(*i) > 0 && board.my_power_at(*i) > 0)
            .map(|i| board.my_power_at(i) - board.their_power_at(i))
            .max();
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let text = &option.display_text;
            if !text.contains("battle") && !text.contains("Battle") {
                continue;
            }
            let mut action = EvaluatedAction::new(&option.option_id, 30.0, text);
            match best_edge {
                Some(edge) if edge >= context.config.battle_favorable_threshold => {
                    action.add_reason("favorable power advantage", 30.0 + edge as Score * 2.0)
                }
                Some(edge) if edge <= context.config.battle_danger_threshold => {
                    action.add_reason("badly outmatched", -80.0)
                }
                Some(_) => action.add_reason("even fight, not worth the force", -20.0),
                None => action.add_reason("no contested location", -25.0),
            }
            actions.push(action);
        }
        actions
    }
}
