use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;

/// Catch-all ranking over action text and the well-known multiple-choice
/// prompts. Guarantees every action decision has at least one scored
/// candidate so the combined evaluator never comes back empty-handed.
pub struct TextEvaluator;

impl Evaluator for TextEvaluator {
    fn name(&self) -> &str {
        "text"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        matches!(
            context.request.kind,
            DecisionKind::CardActionChoice
                | DecisionKind::ActionChoice
                | DecisionKind::MultipleChoice
        )
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        match context.request.kind {
            DecisionKind::MultipleChoice => self.multiple_choice(context),
            _ => self.action_text(context),
        }
    }
}

impl TextEvaluator {
    fn action_text(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let text = &option.display_text;
            let lowered = text.to_ascii_lowercase();
            let mut action = EvaluatedAction::new(&option.option_id, 20.0, text);
            if lowered.contains("reserve deck") {
                action.add_reason("reserve deck digging invites loops", -30.0);
            }
            if option.is_cancelish() {
                // barely above the pass score so cancels beat silence when
                // a response is mandatory
                action.add_reason("cancel-flavored action", -14.0);
            }
            if lowered.contains("activate") && context.board.my_zones.force_pile < 4 {
                action.add_reason("force pile needs refilling", 15.0);
            }
            if lowered.contains("force drain") {
                action.add_reason("drain their life force", 25.0);
            }
            actions.push(action);
        }
        actions
    }

    /// The handful of multiple-choice prompts with known right answers; the
    /// first option is the fallback for everything else.
    fn multiple_choice(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let prompt = &context.request.prompt;
        let lowered = prompt.to_ascii_lowercase();
        let preferred = if prompt == "Select OK to start game" {
            "0"
        } else if lowered.contains("do you want to deploy") {
            "0"
        } else if prompt.contains("Both players have chosen the same starting location") {
            // let the opponent keep it rather than re-picking forever
            "1"
        } else if lowered.contains("concede") || lowered.contains("forfeit the game") {
            "1"
        } else {
            "0"
        };
        let ids = match context.request.options.is_empty() {
            true => vec!["0".to_string(), "1".to_string()],
            false => context
                .request
                .options
                .iter()
                .filter(|o| o.selectable)
                .map(|o| o.option_id.clone())
                .collect(),
        };
        ids.into_iter()
            .map(|id| {
                let mut action = EvaluatedAction::new(&id, 10.0, &format!("Answer {}", id));
                if id == preferred {
                    action.add_reason("known prompt answer", 40.0);
                }
                action
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;
    use crate::config::Config;
    use crate::decision::DecisionRequest;
    use crate::gameplay::BoardState;
    use crate::players::GameHistory;

    #[test]
    fn start_game_prompt_answers_ok() {
        let board = BoardState::new("bot");
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::MultipleChoice,
            prompt: "Select OK to start game".into(),
            no_pass: true,
            ..DecisionRequest::default()
        };
        let context = BrainContext {
            board: &board,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let actions = TextEvaluator.evaluate(&context);
        let best = actions
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(best.action_id, "0");
    }

    #[test]
    fn concede_prompt_declines() {
        let board = BoardState::new("bot");
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::MultipleChoice,
            prompt: "Do you want to concede the game?".into(),
            no_pass: true,
            ..DecisionRequest::default()
        };
        let context = BrainContext {
            board: &board,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let actions = TextEvaluator.evaluate(&context);
        let best = actions
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(best.action_id, "1");
    }
}
