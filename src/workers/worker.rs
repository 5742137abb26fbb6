use super::phase::Phase;
use super::snapshot::Snapshot;
use crate::cards::CardRegistry;
use crate::config::Config;
use crate::decision::DecisionPipeline;
use crate::decision::PipelineResponse;
use crate::gameplay::BoardState;
use crate::gameplay::GameEvent;
use crate::gameplay::Outcome;
use crate::gameplay::Processor;
use crate::players::Brain;
use crate::transport::DeckInfo;
use crate::transport::Element;
use crate::transport::GempClient;
use crate::transport::TransportError;
use crate::transport::Update;
use crate::Channel;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// One bot identity: a single task owning the transport session, the board
/// projection, the decision pipeline, and the brain. Multiple workers can
/// run in one process; they share nothing but the read-only card registry.
pub struct Worker {
    config: Config,
    registry: Arc<CardRegistry>,
    client: GempClient,
    brain: Box<dyn Brain>,
    processor: Processor,
    pipeline: DecisionPipeline,
    phase: Phase,
    board: BoardState,
    channel: Channel,
    game_id: Option<String>,
    table_id: Option<String>,
    deck: Option<DeckInfo>,
    timeouts: usize,
    game_reported: bool,
    stop: Arc<AtomicBool>,
    snapshots: watch::Sender<Snapshot>,
}

impl Worker {
    pub fn new(
        config: Config,
        registry: Arc<CardRegistry>,
        brain: Box<dyn Brain>,
    ) -> (Self, watch::Receiver<Snapshot>) {
        let client = GempClient::new(
            &config.server_url,
            &config.username,
            Duration::from_secs(config.request_timeout_seconds),
            Duration::from_secs(config.game_state_timeout_seconds),
        );
        let (snapshots, receiver) = watch::channel(Snapshot::default());
        let board = BoardState::new(&config.username);
        let worker = Self {
            processor: Processor::new(registry.clone()),
            pipeline: DecisionPipeline::default(),
            phase: Phase::Stopped,
            board,
            channel: 0,
            game_id: None,
            table_id: None,
            deck: None,
            timeouts: 0,
            game_reported: true,
            stop: Arc::new(AtomicBool::new(false)),
            snapshots,
            config,
            registry,
            client,
            brain,
        };
        (worker, receiver)
    }

    /// Cooperative stop: the flag is checked between suspension points and
    /// the worker winds down within one poll interval.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || crate::interrupted()
    }

    fn publish(&self) {
        let snapshot = Snapshot::of(self.phase, &self.board, &self.pipeline.history);
        let _ = self.snapshots.send(snapshot);
    }

    async fn nap(&self) {
        tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
    }

    pub async fn run(mut self) {
        log::info!("worker starting as {}", self.config.username);
        self.phase = Phase::Connecting;
        loop {
            if self.should_stop() && self.phase != Phase::GameEnded {
                self.phase = Phase::Stopped;
            }
            match self.phase {
                Phase::Stopped => break,
                Phase::Error => {
                    log::error!("worker stopping on error");
                    break;
                }
                Phase::Connecting => self.connect().await,
                Phase::InLobby => self.lobby().await,
                Phase::WaitingForOpponent => self.wait_for_opponent().await,
                Phase::Joining => self.join().await,
                Phase::Playing => self.play().await,
                Phase::GameEnded => self.finish().await,
            }
            self.publish();
        }
        log::info!("worker stopped");
    }

    // ---- lobby flow ------------------------------------------------------

    async fn connect(&mut self) {
        match self.client.login(&self.config.password).await {
            Ok(()) => {
                self.load_decks().await;
                self.phase = Phase::InLobby;
            }
            Err(e) if e.is_transient() => {
                log::warn!("login failed, retrying: {}", e);
                self.nap().await;
            }
            Err(e) => {
                // bad credentials never fix themselves
                log::error!("login rejected: {}", e);
                self.phase = Phase::Error;
            }
        }
    }

    async fn load_decks(&mut self) {
        let decks = match self.client.library_decks().await {
            Ok(decks) => decks,
            Err(e) => {
                log::warn!("deck listing failed: {}", e);
                Vec::new()
            }
        };
        self.deck = match &self.config.deck_name {
            Some(name) => decks.iter().find(|d| &d.name == name).cloned(),
            None => decks.first().cloned(),
        };
        match &self.deck {
            Some(deck) => log::info!("playing deck '{}' ({})", deck.name, deck.side),
            None => log::warn!("no library deck available"),
        }
    }

    async fn lobby(&mut self) {
        let tables = match self.client.hall_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                log::warn!("hall poll failed: {}", e);
                self.nap().await;
                return;
            }
        };
        let mine = tables
            .iter()
            .find(|t| t.has_player(&self.config.username) && !t.is_finished());
        match mine {
            Some(table) => {
                self.table_id = Some(table.table_id.clone());
                self.phase = Phase::WaitingForOpponent;
            }
            None => {
                let Some(deck) = self.deck.clone() else {
                    log::error!("cannot create a table without a deck");
                    self.phase = Phase::Error;
                    return;
                };
                match self
                    .client
                    .create_table(
                        &deck.name,
                        deck.is_library,
                        &self.config.table_name,
                        &self.config.game_format,
                    )
                    .await
                {
                    Ok(Some(table_id)) => {
                        self.table_id = Some(table_id);
                        self.phase = Phase::WaitingForOpponent;
                    }
                    Ok(None) => self.nap().await,
                    Err(e) => {
                        log::warn!("table creation failed: {}", e);
                        self.nap().await;
                    }
                }
            }
        }
    }

    async fn wait_for_opponent(&mut self) {
        let tables = match self.client.hall_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                log::warn!("hall poll failed: {}", e);
                self.nap().await;
                return;
            }
        };
        let table_id = self.table_id.clone().unwrap_or_default();
        match tables.iter().find(|t| t.table_id == table_id) {
            None => {
                log::info!("table vanished, back to lobby");
                self.table_id = None;
                self.phase = Phase::InLobby;
            }
            Some(table) => match &table.game_id {
                Some(game_id) => {
                    let opponent = table
                        .opponent_of(&self.config.username)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    log::info!("game {} starting vs {}", game_id, opponent);
                    self.game_id = Some(game_id.clone());
                    self.board = BoardState::new(&self.config.username);
                    self.board.opponent_name = Some(opponent);
                    self.phase = Phase::Joining;
                }
                None => self.nap().await,
            },
        }
    }

    async fn join(&mut self) {
        let Some(game_id) = self.game_id.clone() else {
            self.phase = Phase::InLobby;
            return;
        };
        match self.client.join_game(&game_id).await {
            Ok(update) => {
                let opponent = self.board.opponent_name.clone().unwrap_or_default();
                let deck = self
                    .deck
                    .as_ref()
                    .map(|d| d.name.clone())
                    .unwrap_or_default();
                self.pipeline.on_game_start(&opponent);
                self.game_reported = false;
                self.channel = update.channel;
                self.timeouts = 0;
                self.brain.on_game_start(&opponent, &deck, "unknown");
                match self.absorb(update).await {
                    Ok(finished) if finished || self.board.game_over => {
                        self.phase = Phase::GameEnded
                    }
                    Ok(_) => {
                        log::info!("in game {} at channel {}", game_id, self.channel);
                        self.phase = Phase::Playing;
                    }
                    Err(e) => {
                        log::error!("initial event batch failed: {}", e);
                        self.concede().await;
                        self.phase = Phase::GameEnded;
                    }
                }
            }
            Err(e) if e.is_transient() => {
                log::warn!("join failed, retrying: {}", e);
                self.nap().await;
            }
            Err(e) => {
                log::error!("join rejected: {}", e);
                self.phase = Phase::Error;
            }
        }
    }

    // ---- game flow -------------------------------------------------------

    async fn play(&mut self) {
        let Some(game_id) = self.game_id.clone() else {
            self.phase = Phase::InLobby;
            return;
        };
        match self.client.game_state(&game_id, self.channel).await {
            Ok(update) => {
                self.timeouts = 0;
                match self.absorb(update).await {
                    Ok(finished) => {
                        if finished || self.board.game_over || self.board.game_winner.is_some() {
                            self.phase = Phase::GameEnded;
                        }
                    }
                    Err(e) => {
                        log::error!("unrecoverable game state: {}", e);
                        self.concede().await;
                        self.phase = Phase::GameEnded;
                    }
                }
            }
            Err(TransportError::Timeout) => {
                // the long poll simply had nothing to say; same channel again
                self.timeouts += 1;
                if self.timeouts >= crate::MAX_CONSECUTIVE_TIMEOUTS {
                    log::warn!("{} consecutive timeouts, reconnecting", self.timeouts);
                    self.reconnect().await;
                }
            }
            Err(TransportError::SessionExpired) => self.reconnect().await,
            Err(TransportError::Http(404)) => {
                log::info!("game no longer exists, treating as ended");
                self.phase = Phase::GameEnded;
            }
            Err(e) if e.is_transient() => {
                log::warn!("game poll failed: {}", e);
                self.timeouts += 1;
                if self.timeouts >= crate::MAX_CONSECUTIVE_TIMEOUTS {
                    self.reconnect().await;
                } else {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
            Err(e) => {
                log::error!("game poll rejected: {}", e);
                self.phase = Phase::Error;
            }
        }
    }

    /// Applies one update batch: advances the channel, folds events in
    /// server order, and answers decisions inline. A decision response may
    /// carry further events, which join the back of the queue; a hard cap
    /// bounds pathological exchanges.
    async fn absorb(&mut self, update: Update) -> anyhow::Result<bool> {
        if update.channel > self.channel {
            self.channel = update.channel;
        }
        let mut finished = update.finished;
        let mut queue: VecDeque<Element> = update.events.into();
        let mut handled = 0usize;
        while let Some(element) = queue.pop_front() {
            handled += 1;
            if handled > crate::EVENT_BATCH_LIMIT {
                anyhow::bail!("event batch exceeded {} events", crate::EVENT_BATCH_LIMIT);
            }
            let Some(event) = GameEvent::from_element(&element) else {
                continue;
            };
            match event {
                GameEvent::Decision(request) => {
                    let response = self
                        .pipeline
                        .respond(
                            &request,
                            &self.board,
                            &self.registry,
                            &self.config,
                            self.brain.as_mut(),
                        )
                        .await;
                    match response {
                        PipelineResponse::Post { decision_id, value } => {
                            let game_id = self.game_id.clone().unwrap_or_default();
                            match self
                                .client
                                .respond(&game_id, self.channel, &decision_id, &value)
                                .await
                            {
                                Ok(reply) => {
                                    if reply.channel > self.channel {
                                        self.channel = reply.channel;
                                    }
                                    finished = finished || reply.finished;
                                    queue.extend(reply.events);
                                }
                                Err(e) if e.is_transient() => {
                                    // the server re-issues unanswered decisions
                                    log::warn!("decision post lost: {}", e);
                                }
                                Err(e) => return Err(e.into()),
                            }
                        }
                        PipelineResponse::Abandon => {
                            log::warn!("abandoning wedged decision '{}'", request.prompt);
                        }
                        PipelineResponse::Fatal => {
                            anyhow::bail!("decision wedge persisted on '{}'", request.prompt)
                        }
                    }
                }
                other => {
                    if matches!(other, GameEvent::PhaseChange { .. }) {
                        self.pipeline.on_phase_change();
                    }
                    if let Outcome::Skipped(reason) = self.processor.apply(&mut self.board, &other)
                    {
                        log::warn!("event skipped: {}", reason);
                    }
                }
            }
        }
        Ok(finished)
    }

    /// Transport lost its session: re-authenticate and resume polling from
    /// the last known channel number.
    async fn reconnect(&mut self) {
        self.timeouts = 0;
        log::warn!("re-authenticating");
        match self.client.login(&self.config.password).await {
            Ok(()) => {
                if let Some(game_id) = self.game_id.clone() {
                    match self.client.join_game(&game_id).await {
                        Ok(update) => {
                            // the board already reflects these events; only
                            // the cursor matters, and it never regresses
                            self.channel = self.channel.max(update.channel);
                            log::info!("resumed game {} at channel {}", game_id, self.channel);
                        }
                        Err(e) if e.is_transient() => log::warn!("rejoin failed: {}", e),
                        Err(e) => {
                            log::error!("rejoin rejected: {}", e);
                            self.phase = Phase::Error;
                        }
                    }
                }
            }
            Err(e) if e.is_transient() => {
                log::warn!("re-login failed: {}", e);
                self.nap().await;
            }
            Err(e) => {
                log::error!("re-login rejected: {}", e);
                self.phase = Phase::Error;
            }
        }
    }

    async fn concede(&mut self) {
        if let Some(game_id) = self.game_id.clone() {
            if let Err(e) = self.client.concede(&game_id).await {
                log::warn!("concede failed: {}", e);
            }
        }
    }

    // ---- game end --------------------------------------------------------

    /// Reports the result to the brain exactly once per game, however many
    /// times the terminal event replays.
    fn report_game_end(&mut self) {
        if self.game_reported {
            return;
        }
        self.game_reported = true;
        let won = match &self.board.game_winner {
            Some(winner) => winner == &self.board.my_name,
            // the stream ended without a verdict: life force decides
            None => self.board.total_reserve_force() >= self.board.their_total_life_force(),
        };
        self.brain.on_game_end(won, &self.board);
    }

    async fn finish(&mut self) {
        self.report_game_end();
        if let Some(table_id) = self.table_id.take() {
            self.client.leave_table(&table_id).await;
        }
        self.game_id = None;
        self.channel = 0;
        self.phase = match self.should_stop() {
            true => Phase::Stopped,
            false => Phase::InLobby,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::PlayerZones;
    use crate::gameplay::StateSync;
    use crate::players::BrainContext;
    use crate::players::BrainDecision;
    use std::sync::atomic::AtomicUsize;

    struct CountingBrain(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Brain for CountingBrain {
        async fn make_decision(
            &mut self,
            _context: &BrainContext<'_>,
        ) -> anyhow::Result<BrainDecision> {
            Ok(BrainDecision::pass("test"))
        }
        fn on_game_start(&mut self, _opponent: &str, _deck: &str, _side: &str) {}
        fn on_game_end(&mut self, _won: bool, _final_state: &BoardState) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
        fn personality(&self) -> &str {
            "Counting"
        }
    }

    fn worker() -> (Worker, Arc<AtomicUsize>) {
        let endings = Arc::new(AtomicUsize::new(0));
        let brain = Box::new(CountingBrain(endings.clone()));
        let registry = Arc::new(CardRegistry::default());
        let (worker, _) = Worker::new(Config::sample(), registry, brain);
        (worker, endings)
    }

    fn phase_event(phase: &str) -> Element {
        Element::parse(&format!(r#"<ge type="GPC" phase="{}"/>"#, phase)).unwrap()
    }

    #[tokio::test]
    async fn channel_never_regresses() {
        // identical-channel responses change nothing
        let (mut worker, _) = worker();
        let update = Update {
            channel: 5,
            finished: false,
            events: vec![phase_event("Deploy (turn #1)")],
        };
        assert!(!worker.absorb(update).await.unwrap());
        assert_eq!(worker.channel, 5);
        assert_eq!(worker.board.current_phase, "Deploy (turn #1)");

        let stale = Update {
            channel: 5,
            finished: false,
            events: vec![],
        };
        worker.absorb(stale).await.unwrap();
        assert_eq!(worker.channel, 5);
        assert_eq!(worker.board.current_phase, "Deploy (turn #1)");

        let regress = Update {
            channel: 3,
            finished: false,
            events: vec![],
        };
        worker.absorb(regress).await.unwrap();
        assert_eq!(worker.channel, 5);
    }

    #[tokio::test]
    async fn batches_apply_in_server_order() {
        let (mut worker, _) = worker();
        let update = Update {
            channel: 2,
            finished: false,
            events: vec![
                phase_event("Activate (turn #1)"),
                phase_event("Deploy (turn #1)"),
            ],
        };
        worker.absorb(update).await.unwrap();
        assert_eq!(worker.board.current_phase, "Deploy (turn #1)");
    }

    #[tokio::test]
    async fn game_end_reports_exactly_once() {
        // replayed terminal events report a single result
        let (mut worker, endings) = worker();
        worker.game_reported = false;
        let terminal = Update {
            channel: 9,
            finished: true,
            events: vec![
                Element::parse(r#"<ge type="GAME_END"/>"#).unwrap(),
                Element::parse(r#"<ge type="GAME_END"/>"#).unwrap(),
            ],
        };
        let finished = worker.absorb(terminal).await.unwrap();
        assert!(finished);
        assert!(worker.board.game_over);
        worker.report_game_end();
        worker.report_game_end();
        assert_eq!(endings.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn win_falls_back_to_life_force_without_a_verdict() {
        let (mut worker, endings) = worker();
        worker.game_reported = false;
        let sync = GameEvent::GameState(StateSync {
            zones: vec![
                PlayerZones {
                    name: "bot".into(),
                    force_pile: 5,
                    reserve_deck: 10,
                    ..Default::default()
                },
                PlayerZones {
                    name: "foe".into(),
                    force_pile: 1,
                    ..Default::default()
                },
            ],
            ..StateSync::default()
        });
        worker.processor.apply(&mut worker.board, &sync);
        worker.report_game_end();
        assert_eq!(endings.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected() {
        let (mut worker, _) = worker();
        let events = (0..crate::EVENT_BATCH_LIMIT + 1)
            .map(|_| phase_event("Deploy (turn #1)"))
            .collect::<Vec<_>>();
        let update = Update {
            channel: 1,
            finished: false,
            events,
        };
        assert!(worker.absorb(update).await.is_err());
    }
}
