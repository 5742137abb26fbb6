use super::request::DecisionKind;
use super::request::DecisionRequest;

/// Identity of one answered decision. The prompt is part of the key because
/// the server reuses decision ids across unrelated decisions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WedgeKey {
    pub decision_id: String,
    pub kind: DecisionKind,
    pub prompt: String,
    pub chosen: String,
}

impl WedgeKey {
    pub fn new(request: &DecisionRequest, chosen: &str) -> Self {
        Self {
            decision_id: request.decision_id.clone(),
            kind: request.kind.clone(),
            prompt: request.prompt.clone(),
            chosen: chosen.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WedgeVerdict {
    Clear,
    /// The same tuple just repeated for the third consecutive time.
    Wedged,
    /// The wedge persisted for another full window; give up on the game.
    Fatal,
}

/// Detects the server re-issuing an identical decision that we keep
/// answering identically, which means our answer is illegal or
/// misunderstood and the game would otherwise spin forever.
#[derive(Debug, Default)]
pub struct Tracker {
    last: Option<WedgeKey>,
    consecutive: usize,
}

impl Tracker {
    /// Records an answered decision. Fires `Wedged` exactly once, on the
    /// third consecutive identical tuple, and `Fatal` exactly once more if
    /// the identical tuple survives a second window.
    pub fn record(&mut self, key: WedgeKey) -> WedgeVerdict {
        match self.last.as_ref() == Some(&key) {
            true => self.consecutive += 1,
            false => {
                self.last = Some(key);
                self.consecutive = 1;
            }
        }
        match self.consecutive {
            n if n == crate::WEDGE_REPEATS => WedgeVerdict::Wedged,
            n if n == crate::WEDGE_REPEATS * 2 => WedgeVerdict::Fatal,
            _ => WedgeVerdict::Clear,
        }
    }

    /// Phase changes break loops by construction; forget the window.
    pub fn reset(&mut self) {
        self.last = None;
        self.consecutive = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, prompt: &str, chosen: &str) -> WedgeKey {
        WedgeKey {
            decision_id: id.to_string(),
            kind: DecisionKind::CardActionChoice,
            prompt: prompt.to_string(),
            chosen: chosen.to_string(),
        }
    }

    #[test]
    fn three_identical_tuples_trigger_once() {
        let mut tracker = Tracker::default();
        assert_eq!(tracker.record(key("1", "Optional responses", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Optional responses", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Optional responses", "0")), WedgeVerdict::Wedged);
        assert_eq!(tracker.record(key("1", "Optional responses", "0")), WedgeVerdict::Clear);
    }

    #[test]
    fn same_id_different_prompt_never_triggers() {
        let mut tracker = Tracker::default();
        assert_eq!(tracker.record(key("1", "Choose a card", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Choose a target", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Choose a card", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Choose a target", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Choose a card", "0")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "Choose a target", "0")), WedgeVerdict::Clear);
    }

    #[test]
    fn persistent_wedge_escalates_to_fatal() {
        let mut tracker = Tracker::default();
        for _ in 0..5 {
            tracker.record(key("1", "stuck", "0"));
        }
        assert_eq!(tracker.record(key("1", "stuck", "0")), WedgeVerdict::Fatal);
    }

    #[test]
    fn different_choice_resets_the_window() {
        let mut tracker = Tracker::default();
        tracker.record(key("1", "stuck", "0"));
        tracker.record(key("1", "stuck", "0"));
        assert_eq!(tracker.record(key("1", "stuck", "2")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "stuck", "2")), WedgeVerdict::Clear);
        assert_eq!(tracker.record(key("1", "stuck", "2")), WedgeVerdict::Wedged);
    }

    #[test]
    fn reset_clears_the_window() {
        let mut tracker = Tracker::default();
        tracker.record(key("1", "stuck", "0"));
        tracker.record(key("1", "stuck", "0"));
        tracker.reset();
        assert_eq!(tracker.record(key("1", "stuck", "0")), WedgeVerdict::Clear);
    }
}
