use super::request::DecisionKind;
use super::request::DecisionRequest;
use super::tracker::Tracker;
use super::tracker::WedgeKey;
use super::tracker::WedgeVerdict;
use crate::cards::CardRegistry;
use crate::config::Config;
use crate::gameplay::BoardState;
use crate::players::Brain;
use crate::players::BrainContext;
use crate::players::BrainDecision;
use crate::players::GameHistory;
use rand::seq::SliceRandom;

/// What the worker should do with an answered decision.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PipelineResponse {
    /// Post this value for this decision id.
    Post { decision_id: String, value: String },
    /// Wedge break for non-choice decisions: answer nothing and let the
    /// channel advance.
    Abandon,
    /// The wedge survived a second window; the game is unrecoverable.
    Fatal,
}

/// Builds the brain context, invokes the brain, applies the safety
/// overrides, and guards the whole exchange with the wedge detector.
///
/// Every decision gets a response: a bad answer stalls one exchange, a
/// missing answer hangs the game forever.
#[derive(Default)]
pub struct DecisionPipeline {
    tracker: Tracker,
    pub history: GameHistory,
}

impl DecisionPipeline {
    pub fn on_phase_change(&mut self) {
        self.tracker.reset();
    }

    pub fn on_game_start(&mut self, opponent: &str) {
        self.tracker.reset();
        self.history.reset(opponent);
    }

    pub async fn respond(
        &mut self,
        request: &DecisionRequest,
        board: &BoardState,
        registry: &CardRegistry,
        config: &Config,
        brain: &mut dyn Brain,
    ) -> PipelineResponse {
        self.history.record(&request.kind);

        let decision = match &request.kind {
            DecisionKind::Unknown(tag) => {
                log::warn!("unknown decision type {}, answering default", tag);
                Self::unknown_kind_default(request)
            }
            _ => self.consult(request, board, registry, config, brain).await,
        };

        let value = Self::override_choice(request, decision);
        let verdict = self.tracker.record(WedgeKey::new(request, &value));
        match verdict {
            WedgeVerdict::Clear => PipelineResponse::Post {
                decision_id: request.decision_id.clone(),
                value,
            },
            WedgeVerdict::Wedged => self.break_wedge(request, &value),
            WedgeVerdict::Fatal => {
                log::error!("wedge persisted on '{}', giving up", request.prompt);
                PipelineResponse::Fatal
            }
        }
    }

    async fn consult(
        &self,
        request: &DecisionRequest,
        board: &BoardState,
        registry: &CardRegistry,
        config: &Config,
        brain: &mut dyn Brain,
    ) -> BrainDecision {
        let context = BrainContext {
            board,
            registry,
            request,
            history: &self.history,
            config,
        };
        match brain.make_decision(&context).await {
            Ok(decision) => {
                log::info!(
                    "brain chose '{}': {}",
                    decision.choice,
                    decision.reasoning
                );
                decision
            }
            Err(e) => {
                // the worker never stops for a brain failure
                log::error!("brain failed on '{}': {}", request.prompt, e);
                match request.must_choose() {
                    false => BrainDecision::pass("brain failure, passing"),
                    true => BrainDecision {
                        choice: request
                            .first_selectable()
                            .map(|o| o.option_id.clone())
                            .unwrap_or_default(),
                        reasoning: "brain failure, first option".to_string(),
                        confidence: 0.0,
                        alternative: None,
                    },
                }
            }
        }
    }

    /// The three safety rules from the decision contract, first match wins.
    fn override_choice(request: &DecisionRequest, decision: BrainDecision) -> String {
        let chosen = decision.choice.clone();
        if chosen.is_empty() && request.must_choose() {
            let forced = request
                .first_non_cancel()
                .map(|o| o.option_id.clone())
                .unwrap_or_else(|| "0".to_string());
            log::warn!("empty choice on a required decision, forcing '{}'", forced);
            return forced;
        }
        if let Some(option) = request.option(&chosen) {
            if option.is_cancelish() && request.no_pass {
                let forced = request
                    .first_non_cancel()
                    .map(|o| o.option_id.clone())
                    .unwrap_or(chosen);
                log::warn!("cancel chosen on a required decision, forcing '{}'", forced);
                return forced;
            }
            if !option.selectable {
                let forced = decision
                    .alternative
                    .as_ref()
                    .and_then(|alt| request.option(alt))
                    .filter(|o| o.selectable)
                    .or_else(|| request.first_selectable())
                    .map(|o| o.option_id.clone())
                    .unwrap_or_default();
                log::warn!("non-selectable choice '{}', forcing '{}'", chosen, forced);
                return forced;
            }
        }
        chosen
    }

    /// Wedge break: multiple choice gets a different random legal answer;
    /// other kinds pass when passing is legal, else abandon the decision so
    /// the channel can advance. Passes are deliberately not recorded, so a
    /// wedge that survives the break keeps counting toward fatal.
    fn break_wedge(&mut self, request: &DecisionRequest, stuck: &str) -> PipelineResponse {
        self.history.wedges_broken += 1;
        log::warn!(
            "wedge detected on '{}' (answer '{}'), breaking",
            request.prompt,
            stuck
        );
        match request.kind {
            DecisionKind::MultipleChoice => {
                let legal = request
                    .selectable_options()
                    .into_iter()
                    .map(|o| o.option_id.clone())
                    .filter(|id| id != stuck)
                    .collect::<Vec<_>>();
                let fallback = match stuck {
                    "0" => "1".to_string(),
                    _ => "0".to_string(),
                };
                let value = legal
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .unwrap_or(fallback);
                self.tracker.record(WedgeKey::new(request, &value));
                PipelineResponse::Post {
                    decision_id: request.decision_id.clone(),
                    value,
                }
            }
            _ if !request.must_choose() => PipelineResponse::Post {
                decision_id: request.decision_id.clone(),
                value: String::new(),
            },
            _ => PipelineResponse::Abandon,
        }
    }

    /// Unrecognized decision types are answered with the first option when a
    /// response is required, else passed.
    fn unknown_kind_default(request: &DecisionRequest) -> BrainDecision {
        match request.must_choose() {
            true => BrainDecision {
                choice: request
                    .options
                    .first()
                    .map(|o| o.option_id.clone())
                    .unwrap_or_else(|| "0".to_string()),
                reasoning: "unknown decision type, first option".to_string(),
                confidence: 0.0,
                alternative: None,
            },
            false => BrainDecision::pass("unknown decision type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionOption;

    fn request(kind: DecisionKind, no_pass: bool, options: &[(&str, &str, bool)]) -> DecisionRequest {
        DecisionRequest {
            decision_id: "9".into(),
            kind,
            prompt: "Optional responses".into(),
            options: options
                .iter()
                .map(|(id, text, selectable)| DecisionOption {
                    option_id: id.to_string(),
                    display_text: text.to_string(),
                    selectable: *selectable,
                    ..DecisionOption::default()
                })
                .collect(),
            no_pass,
            ..DecisionRequest::default()
        }
    }

    struct Scripted(String);

    #[async_trait::async_trait]
    impl Brain for Scripted {
        async fn make_decision(
            &mut self,
            _context: &BrainContext<'_>,
        ) -> anyhow::Result<BrainDecision> {
            Ok(BrainDecision {
                choice: self.0.clone(),
                reasoning: "scripted".into(),
                confidence: 1.0,
                alternative: None,
            })
        }
        fn on_game_start(&mut self, _opponent: &str, _deck: &str, _side: &str) {}
        fn on_game_end(&mut self, _won: bool, _final_state: &BoardState) {}
        fn personality(&self) -> &str {
            "Scripted"
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Brain for Failing {
        async fn make_decision(
            &mut self,
            _context: &BrainContext<'_>,
        ) -> anyhow::Result<BrainDecision> {
            anyhow::bail!("boom")
        }
        fn on_game_start(&mut self, _opponent: &str, _deck: &str, _side: &str) {}
        fn on_game_end(&mut self, _won: bool, _final_state: &BoardState) {}
        fn personality(&self) -> &str {
            "Failing"
        }
    }

    async fn answer(
        pipeline: &mut DecisionPipeline,
        request: &DecisionRequest,
        brain: &mut dyn Brain,
    ) -> PipelineResponse {
        let board = BoardState::new("bot");
        let registry = CardRegistry::default();
        let config = Config::sample();
        pipeline.respond(request, &board, &registry, &config, brain).await
    }

    #[tokio::test]
    async fn empty_choice_on_required_decision_is_forced() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardActionChoice,
            true,
            &[("cancel", "Cancel", true), ("1", "Deploy", true)],
        );
        let mut brain = Scripted(String::new());
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_on_no_pass_decision_is_replaced() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::ActionChoice,
            true,
            &[("0", "Pass - no action", true), ("1", "Fire blaster", true)],
        );
        let mut brain = Scripted("0".into());
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_selectable_choice_is_replaced() {
        // the posted choice never names a non-selectable option
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardSelection,
            true,
            &[("c1", "c1", false), ("c2", "c2", true)],
        );
        let mut brain = Scripted("c1".into());
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "c2"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn sole_selectable_option_is_forced() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardSelection,
            true,
            &[("c1", "c1", false), ("c2", "c2", false), ("c3", "c3", true)],
        );
        let mut brain = Scripted(String::new());
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "c3"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn brain_failure_falls_back_and_keeps_playing() {
        let mut pipeline = DecisionPipeline::default();
        let optional = request(DecisionKind::CardActionChoice, false, &[("0", "Act", true)]);
        let mut brain = Failing;
        match answer(&mut pipeline, &optional, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, ""),
            other => panic!("unexpected {:?}", other),
        }
        let required = request(DecisionKind::CardActionChoice, true, &[("0", "Act", true)]);
        match answer(&mut pipeline, &required, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "0"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn third_identical_exchange_breaks_the_wedge() {
        // on the third repeat the worker emits a different legal answer
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardActionChoice,
            false,
            &[("0", "Fire blaster", true)],
        );
        let mut brain = Scripted("0".into());
        for _ in 0..2 {
            match answer(&mut pipeline, &request, &mut brain).await {
                PipelineResponse::Post { value, .. } => assert_eq!(value, "0"),
                other => panic!("unexpected {:?}", other),
            }
        }
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, ""),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(pipeline.history.wedges_broken, 1);
    }

    #[tokio::test]
    async fn wedged_required_decision_is_abandoned() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardSelection,
            true,
            &[("c1", "c1", true)],
        );
        let mut brain = Scripted("c1".into());
        for _ in 0..2 {
            answer(&mut pipeline, &request, &mut brain).await;
        }
        assert_eq!(
            answer(&mut pipeline, &request, &mut brain).await,
            PipelineResponse::Abandon
        );
    }

    #[tokio::test]
    async fn multiple_choice_wedge_answers_differently() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::MultipleChoice,
            true,
            &[("0", "Yes", true), ("1", "No", true)],
        );
        let mut brain = Scripted("0".into());
        for _ in 0..2 {
            answer(&mut pipeline, &request, &mut brain).await;
        }
        match answer(&mut pipeline, &request, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn persistent_wedge_is_fatal() {
        let mut pipeline = DecisionPipeline::default();
        let request = request(
            DecisionKind::CardActionChoice,
            false,
            &[("0", "Fire blaster", true)],
        );
        let mut brain = Scripted("0".into());
        let mut outcomes = Vec::new();
        for _ in 0..6 {
            outcomes.push(answer(&mut pipeline, &request, &mut brain).await);
        }
        match &outcomes[2] {
            PipelineResponse::Post { value, .. } => assert_eq!(value, ""),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcomes[5], PipelineResponse::Fatal);
    }

    #[tokio::test]
    async fn unknown_kind_answers_default() {
        let mut pipeline = DecisionPipeline::default();
        let mut required = request(
            DecisionKind::Unknown("MYSTERY".into()),
            true,
            &[("7", "??", true)],
        );
        required.prompt = "mystery".into();
        let mut brain = Failing;
        match answer(&mut pipeline, &required, &mut brain).await {
            PipelineResponse::Post { value, .. } => assert_eq!(value, "7"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
