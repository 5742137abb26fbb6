use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::decision::DecisionKind;
use crate::players::BrainContext;
use crate::Score;
use crate::BAD_DELTA;
use crate::GOOD_DELTA;
use crate::VERY_BAD_DELTA;
use crate::VERY_GOOD_DELTA;

/// Card selections outside the deploy flow: forfeits, cancels, pilots
/// boarding, and the catch-all "choose a card" prompts.
pub struct SelectionEvaluator;

impl Evaluator for SelectionEvaluator {
    fn name(&self) -> &str {
        "selection"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        matches!(
            context.request.kind,
            DecisionKind::CardSelection | DecisionKind::ArbitraryCards
        )
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let prompt = context.request.prompt.to_ascii_lowercase();
        if prompt.contains("forfeit") {
            return self.forfeit(context);
        }
        if prompt.contains("pilot") {
            return self.pilot(context);
        }
        if prompt.contains("cancel") && prompt.contains("target") {
            return self.cancel(context);
        }
        if prompt.contains("if desired") {
            return self.optional(context);
        }
        self.generic(context)
    }
}

impl SelectionEvaluator {
    /// Losing a battle: give up pilots before their ship, cheap forfeit
    /// values before expensive ones.
    fn forfeit(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let card_id = option.card_id.as_deref().unwrap_or(&option.option_id);
            let mut action = EvaluatedAction::new(&option.option_id, 40.0, "Forfeit");
            if let Some(card) = context.board.cards.get(card_id) {
                action.display_text = format!("Forfeit {}", card.display_name());
                if !card.attachments.is_empty() {
                    action.add_reason("still carrying attached cards", VERY_BAD_DELTA * 2.0);
                }
                if card.attached_to.is_some() {
                    action.add_reason("attached card goes first", GOOD_DELTA * 2.0);
                }
                action.add_reason("forfeit value", (10 - card.forfeit).max(0) as Score * 2.0);
            }
            actions.push(action);
        }
        actions
    }

    /// Boarding a ship is almost always right once it was planned; the
    /// bound ship target gets the full boost from the plan.
    fn pilot(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let plan = context.board.plan.lock().ok();
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let card_id = option.card_id.as_deref().unwrap_or(&option.option_id);
            let mut action =
                EvaluatedAction::new(&option.option_id, VERY_GOOD_DELTA, "Deploy pilot");
            if let Some(plan) = plan.as_ref() {
                let bonus = plan.target_bonus(card_id);
                if bonus != 0.0 {
                    action.add_reason("plan target", bonus);
                }
            }
            actions.push(action);
        }
        actions
    }

    /// Cancel opponent cards, never our own.
    fn cancel(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let card_id = option.card_id.as_deref().unwrap_or(&option.option_id);
            let mut action = EvaluatedAction::new(&option.option_id, 0.0, "Cancel");
            if let Some(card) = context.board.cards.get(card_id) {
                action.display_text = format!("Cancel {}", card.display_name());
                match card.owner == context.board.my_name {
                    true => action.add_reason("never cancel our own card", BAD_DELTA),
                    false => action.add_reason("cancel the opponent's card", GOOD_DELTA),
                }
            }
            actions.push(action);
        }
        actions
    }

    /// "... if desired" prompts are almost always traps; let pass win.
    fn optional(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        context
            .request
            .options
            .iter()
            .filter(|o| o.selectable)
            .map(|option| {
                let mut action =
                    EvaluatedAction::new(&option.option_id, VERY_BAD_DELTA, "Optional action");
                action.add_reason("optional action, prefer passing", 0.0);
                action
            })
            .collect()
    }

    fn generic(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        context
            .request
            .options
            .iter()
            .filter(|o| o.selectable)
            .map(|option| {
                let card_id = option.card_id.as_deref().unwrap_or(&option.option_id);
                let name = context
                    .board
                    .cards
                    .get(card_id)
                    .map(|card| card.display_name().to_string())
                    .unwrap_or_else(|| card_id.to_string());
                let mut action = EvaluatedAction::new(
                    &option.option_id,
                    GOOD_DELTA,
                    &format!("Select {}", name),
                );
                action.add_reason("neutral selection", 0.0);
                action
            })
            .collect()
    }
}
