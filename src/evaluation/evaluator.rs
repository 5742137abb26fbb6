use super::action::EvaluatedAction;
use crate::players::BrainContext;

/// A pure scoring function over one decision context. Evaluators are
/// composed in a fixed list; several may score the same decision and the
/// best action across all of them wins.
pub trait Evaluator: Send {
    fn name(&self) -> &str;

    /// Whether this evaluator has anything to say about the decision.
    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool;

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction>;
}

/// Runs every applicable evaluator and ranks the produced actions.
///
/// Ties break by evaluator order then option index, which falls out of the
/// stable sort over insertion order. Actions naming non-selectable options
/// are dropped before ranking.
pub struct CombinedEvaluator {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl CombinedEvaluator {
    pub fn new(evaluators: Vec<Box<dyn Evaluator>>) -> Self {
        Self { evaluators }
    }

    /// All candidate actions, best first. Empty when nothing applied.
    pub fn ranked(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        for evaluator in &self.evaluators {
            if evaluator.can_evaluate(context) {
                for action in evaluator.evaluate(context) {
                    log::debug!(
                        "[{}] {} -> {:.1} ({})",
                        evaluator.name(),
                        action.display_text,
                        action.score,
                        action.rationale()
                    );
                    actions.push(action);
                }
            }
        }
        let blocked = context
            .request
            .options
            .iter()
            .filter(|option| !option.selectable)
            .map(|option| option.option_id.as_str())
            .collect::<Vec<_>>();
        actions.retain(|action| !blocked.contains(&action.action_id.as_str()));
        actions.sort_by(|a, b| b.score.total_cmp(&a.score));
        actions
    }
}

/// The do-nothing option. Only applies when the server allows passing, and
/// grows more attractive as force and hand run thin.
pub struct PassEvaluator;

impl Evaluator for PassEvaluator {
    fn name(&self) -> &str {
        "pass"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        !context.request.no_pass
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut action = EvaluatedAction::new("", 5.0, "Pass");
        action.add_reason("default pass option", 0.0);
        let board = context.board;
        if board.my_zones.force_pile < 3 {
            action.add_reason("low on force", 5.0);
        }
        if board.my_zones.reserve_deck <= 14 {
            action.add_reason("reserve deck low", 3.0);
        }
        let hand = board.hand_size();
        if hand < 5 {
            action.add_reason("small hand, save force for drawing", 15.0);
        } else if hand < 7 {
            action.add_reason("hand below target", 8.0);
        }
        vec![action]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;
    use crate::config::Config;
    use crate::decision::DecisionKind;
    use crate::decision::DecisionOption;
    use crate::decision::DecisionRequest;
    use crate::gameplay::BoardState;
    use crate::players::GameHistory;

    struct Fixed(&'static str, f64);

    impl Evaluator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn can_evaluate(&self, _context: &BrainContext<'_>) -> bool {
            true
        }
        fn evaluate(&self, _context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
            vec![EvaluatedAction::new(self.0, self.1, self.0)]
        }
    }

    #[test]
    fn ranked_drops_non_selectable_and_orders_by_score() {
        let board = BoardState::new("bot");
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::CardSelection,
            prompt: "Choose".into(),
            options: vec![
                DecisionOption {
                    option_id: "a".into(),
                    display_text: "a".into(),
                    selectable: false,
                    ..DecisionOption::default()
                },
                DecisionOption {
                    option_id: "b".into(),
                    display_text: "b".into(),
                    selectable: true,
                    ..DecisionOption::default()
                },
            ],
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
        let combined = CombinedEvaluator::new(vec![
            Box::new(Fixed("a", 90.0)),
            Box::new(Fixed("b", 40.0)),
        ]);
        let ranked = combined.ranked(&context);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].action_id, "b");
    }

    #[test]
    fn ties_prefer_earlier_evaluators() {
        let board = BoardState::new("bot");
        let registry = CardRegistry::default();
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "1".into(),
            kind: DecisionKind::CardSelection,
            prompt: "Choose".into(),
            options: vec![
                DecisionOption {
                    option_id: "a".into(),
                    display_text: "a".into(),
                    selectable: true,
                    ..DecisionOption::default()
                },
                DecisionOption {
                    option_id: "b".into(),
                    display_text: "b".into(),
                    selectable: true,
                    ..DecisionOption::default()
                },
            ],
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
        let combined = CombinedEvaluator::new(vec![
            Box::new(Fixed("a", 40.0)),
            Box::new(Fixed("b", 40.0)),
        ]);
        let ranked = combined.ranked(&context);
        assert_eq!(ranked[0].action_id, "a");
    }
}
