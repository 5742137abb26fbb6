use crate::Score;

/// A candidate answer with its score and the trail of reasons behind it.
///
/// Score bands, by convention: at or below 0 means illegal or never, 5-20
/// low-priority defaults, 20-50 moderate, 50-80 preferred, above 80
/// decisive. Every adjustment carries a reason so logs explain the play.
#[derive(Debug, Default, Clone)]
pub struct EvaluatedAction {
    pub action_id: String,
    pub score: Score,
    pub display_text: String,
    pub reasoning: Vec<String>,
}

impl EvaluatedAction {
    pub fn new(action_id: &str, score: Score, display_text: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
            score,
            display_text: display_text.to_string(),
            reasoning: Vec::new(),
        }
    }

    pub fn add_reason(&mut self, reason: &str, delta: Score) {
        match delta == 0.0 {
            true => self.reasoning.push(reason.to_string()),
            false => {
                self.reasoning.push(format!("{}: {:+.1}", reason, delta));
                self.score += delta;
            }
        }
    }

    pub fn rationale(&self) -> String {
        self.reasoning.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_travel_with_score_changes() {
        let mut action = EvaluatedAction::new("0", 50.0, "Deploy Vader");
        action.add_reason("can drain here", 15.0);
        action.add_reason("already committed", -5.0);
        assert_eq!(action.score, 60.0);
        assert_eq!(action.rationale(), "can drain here: +15.0 | already committed: -5.0");
    }
}
