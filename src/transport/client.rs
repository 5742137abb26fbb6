use super::error::TransportError;
use super::hall::DeckInfo;
use super::hall::GameTable;
use super::xml::Element;
use super::xml::Update;
use crate::Channel;
use std::time::Duration;

/// Stateful HTTP client for one authenticated session against the remote
/// server. Session cookies live in the reqwest cookie store; one client per
/// worker, never shared.
pub struct GempClient {
    http: reqwest::Client,
    base: String,
    username: String,
    long_poll: Duration,
}

impl GempClient {
    pub fn new(
        server_url: &str,
        username: &str,
        request_timeout: Duration,
        game_state_timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(crate::CONNECT_TIMEOUT_SECS))
            .timeout(request_timeout)
            .build()
            .expect("build http client");
        Self {
            http,
            base: server_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            long_poll: game_state_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn wire(e: reqwest::Error) -> TransportError {
        match e.is_timeout() {
            true => TransportError::Timeout,
            false => TransportError::Network(e),
        }
    }

    /// POST credentials; the session cookie rides back in the jar. A non-2xx
    /// or an error body is fatal, the worker should not retry it.
    pub async fn login(&self, password: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url("login"))
            .form(&[("login", self.username.as_str()), ("password", password)])
            .send()
            .await
            .map_err(Self::wire)?;
        let status = response.status();
        let body = response.text().await.map_err(Self::wire)?;
        if !status.is_success() {
            return Err(TransportError::Credentials(format!("http {}", status)));
        }
        let lowered = body.to_ascii_lowercase();
        if lowered.contains("error") || lowered.contains("invalid") {
            return Err(TransportError::Credentials("rejected by server".into()));
        }
        log::info!("logged in as {}", self.username);
        Ok(())
    }

    /// Full hall listing. Malformed XML degrades to an empty list because a
    /// bad hall payload should never kill the lobby loop.
    pub async fn hall_tables(&self) -> Result<Vec<GameTable>, TransportError> {
        let body = self
            .http
            .get(self.url("hall"))
            .query(&[("participantId", "null")])
            .send()
            .await
            .map_err(Self::wire)?
            .text()
            .await
            .map_err(Self::wire)?;
        match Element::parse(&body) {
            Ok(root) => Ok(root
                .find_all("table")
                .into_iter()
                .filter_map(GameTable::from_element)
                .collect()),
            Err(e) => {
                log::warn!("unparseable hall listing: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Creates a table, then discovers its id by name from a fresh hall
    /// listing since the server does not echo it back.
    pub async fn create_table(
        &self,
        deck_name: &str,
        is_library: bool,
        table_name: &str,
        format: &str,
    ) -> Result<Option<String>, TransportError> {
        let response = self
            .http
            .post(self.url("hall"))
            .form(&[
                ("participantId", "null"),
                ("deckName", deck_name),
                ("sampleDeck", if is_library { "true" } else { "false" }),
                ("format", format),
                ("tableDesc", table_name),
                ("isPrivate", "false"),
            ])
            .send()
            .await
            .map_err(Self::wire)?;
        let status = response.status();
        let body = response.text().await.map_err(Self::wire)?;
        if !status.is_success() {
            log::warn!("create table failed: http {}", status);
            return Ok(None);
        }
        if let Some(message) = Self::error_body(&body) {
            log::warn!("create table rejected: {}", message);
            return Ok(None);
        }
        for attempt in 0..3 {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            let tables = self.hall_tables().await?;
            let found = tables
                .into_iter()
                .find(|t| t.name == table_name && t.has_player(&self.username));
            if let Some(table) = found {
                log::info!("created table {}", table.table_id);
                return Ok(Some(table.table_id));
            }
        }
        log::warn!("table created but not found in hall");
        Ok(None)
    }

    pub async fn join_table(
        &self,
        table_id: &str,
        deck_name: &str,
        is_library: bool,
    ) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url(&format!("hall/{}", table_id)))
            .form(&[
                ("deckName", deck_name),
                ("sampleDeck", if is_library { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(Self::wire)?;
        match response.status().is_success() {
            true => Ok(()),
            false => Err(TransportError::Http(response.status().as_u16())),
        }
    }

    /// Best effort; a failure only means the table lingers until the server
    /// reaps it.
    pub async fn leave_table(&self, table_id: &str) {
        let result = self
            .http
            .post(self.url(&format!("hall/{}", table_id)))
            .form(&[("participantId", "null"), ("action", "drop")])
            .send()
            .await;
        if let Err(e) = result {
            log::warn!("leave table {} failed: {}", table_id, e);
        }
    }

    pub async fn library_decks(&self) -> Result<Vec<DeckInfo>, TransportError> {
        self.deck_list("deck/libraryList", true).await
    }

    pub async fn user_decks(&self) -> Result<Vec<DeckInfo>, TransportError> {
        self.deck_list("deck/list", false).await
    }

    async fn deck_list(
        &self,
        path: &str,
        is_library: bool,
    ) -> Result<Vec<DeckInfo>, TransportError> {
        let body = self
            .http
            .get(self.url(path))
            .query(&[("participantId", "null")])
            .send()
            .await
            .map_err(Self::wire)?
            .text()
            .await
            .map_err(Self::wire)?;
        match Element::parse(&body) {
            Ok(root) => Ok(DeckInfo::from_listing(&root, is_library)),
            Err(e) => {
                log::warn!("unparseable deck listing: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Enters a running game and returns the initial state batch.
    pub async fn join_game(&self, game_id: &str) -> Result<Update, TransportError> {
        let response = self
            .http
            .get(self.url(&format!("game/{}", game_id)))
            .query(&[("participantId", "null")])
            .send()
            .await
            .map_err(Self::wire)?;
        if !response.status().is_success() {
            return Err(TransportError::Http(response.status().as_u16()));
        }
        let body = response.text().await.map_err(Self::wire)?;
        Update::parse(&body, 0)
    }

    /// The long poll. Blocks up to the server-chosen duration; a read
    /// timeout is reported as such so the worker re-issues with the same
    /// channel number.
    pub async fn game_state(
        &self,
        game_id: &str,
        channel: Channel,
    ) -> Result<Update, TransportError> {
        let response = self
            .http
            .post(self.url(&format!("game/{}", game_id)))
            .timeout(self.long_poll)
            .form(&[
                ("participantId", "null"),
                ("channelNumber", &channel.to_string()),
            ])
            .send()
            .await
            .map_err(Self::wire)?;
        match response.status().as_u16() {
            409 => Err(TransportError::SessionExpired),
            status if status >= 300 => Err(TransportError::Http(status)),
            _ => {
                let body = response.text().await.map_err(Self::wire)?;
                Update::parse(&body, channel)
            }
        }
    }

    /// Posts a decision response. Does not consume a channel number; the
    /// response may carry further events and a newer cursor. Retried once on
    /// a transient network error since the post is idempotent server-side.
    pub async fn respond(
        &self,
        game_id: &str,
        channel: Channel,
        decision_id: &str,
        value: &str,
    ) -> Result<Update, TransportError> {
        let mut last = None;
        for _ in 0..2 {
            match self.post_decision(game_id, channel, decision_id, value).await {
                Ok(update) => return Ok(update),
                Err(e) if e.is_transient() && !matches!(e, TransportError::SessionExpired) => {
                    log::warn!("decision post failed, retrying: {}", e);
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last.unwrap_or(TransportError::Timeout))
    }

    async fn post_decision(
        &self,
        game_id: &str,
        channel: Channel,
        decision_id: &str,
        value: &str,
    ) -> Result<Update, TransportError> {
        let response = self
            .http
            .post(self.url(&format!("game/{}", game_id)))
            .form(&[
                ("participantId", "null"),
                ("channelNumber", &channel.to_string()),
                ("decisionId", decision_id),
                ("decisionValue", value),
            ])
            .send()
            .await
            .map_err(Self::wire)?;
        match response.status().as_u16() {
            409 => Err(TransportError::SessionExpired),
            status if status >= 300 => Err(TransportError::Http(status)),
            _ => {
                let body = response.text().await.map_err(Self::wire)?;
                Update::parse(&body, channel)
            }
        }
    }

    pub async fn concede(&self, game_id: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url(&format!("game/{}/concede", game_id)))
            .form(&[("participantId", "null")])
            .send()
            .await
            .map_err(Self::wire)?;
        match response.status().is_success() {
            true => Ok(()),
            false => Err(TransportError::Http(response.status().as_u16())),
        }
    }

    fn error_body(body: &str) -> Option<String> {
        let root = Element::parse(body).ok()?;
        match root.name == "error" {
            true => Some(root.text),
            false => root.find("error").map(|e| e.text.clone()),
        }
    }
}
