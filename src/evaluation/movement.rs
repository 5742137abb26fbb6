use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;
use crate::Score;

/// Move-phase choices. Holding position is the default; fleeing becomes
/// attractive only where we are outmatched past the danger threshold.
pub struct MoveEvaluator;

impl Evaluator for MoveEvaluator {
    fn name(&self) -> &str {
        "move"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        matches!(
            context.request.kind,
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice
        ) && context
            .request
            .options
            .iter()
            .any(|o| o.display_text.contains("Move"))
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let board = context.board;
        let endangered = (0..board.locations.len()).any(|i| {
            board.my_power_at(i) > 0
                && board.my_power_at(i) - board.their_power_at(i)
                    <= context.config.battle_danger_threshold
        });
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            if !option.display_text.contains("Move") {
                continue;
            }
            let mut action = EvaluatedAction::new(&option.option_id, 10.0, &option.display_text);
            match endangered {
                true => action.add_reason("retreat from a lost position", 20.0),
                false => action.add_reason("movement costs force", -5.0 as Score),
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
    use crate::cards::Side;
    use crate::config::Config;
    use crate::decision::DecisionOption;
    use crate::decision::DecisionRequest;
    use crate::gameplay::BoardState;
    use crate::gameplay::LocationInPlay;
    use crate::players::GameHistory;
    use std::collections::HashMap;

    fn move_request(texts: &[&str]) -> DecisionRequest {
        DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::CardActionChoice,
            prompt: "Move phase".into(),
            options: texts
                .iter()
                .enumerate()
                .map(|(i, text)| DecisionOption {
                    option_id: i.to_string(),
                    display_text: text.to_string(),
                    selectable: true,
                    ..DecisionOption::default()
                })
                .collect(),
            no_pass: false,
            ..DecisionRequest::default()
        }
    }

    fn contested_board(my: i32, their: i32) -> BoardState {
        let mut board = BoardState::new("bot");
        board.my_side = Some(Side::Dark);
        board.add_location(LocationInPlay {
            card_id: "l0".into(),
            location_index: 0,
            ..LocationInPlay::default()
        });
        board.dark_power = HashMap::from([(0, my)]);
        board.light_power = HashMap::from([(0, their)]);
        board
    }

    #[test]
    fn losing_positions_reward_retreat_and_safe_ones_stay_put() {
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = move_request(&["Move to Mos Eisley"]);

        let outmatched = contested_board(2, 10);
        let context = BrainContext {
            board: &outmatched,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let fleeing = MoveEvaluator.evaluate(&context).remove(0).score;

        let holding = contested_board(5, 3);
        let context = BrainContext {
            board: &holding,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let staying = MoveEvaluator.evaluate(&context).remove(0).score;

        assert_eq!(fleeing, 30.0);
        assert_eq!(staying, 5.0);
        assert!(fleeing > staying);
    }

    #[test]
    fn only_move_actions_are_scored() {
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = move_request(&["Move to Mos Eisley", "Deploy Vader"]);
        let board = contested_board(5, 3);
        let context = BrainContext {
            board: &board,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let actions = MoveEvaluator.evaluate(&context);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_id, "0");
    }
}
