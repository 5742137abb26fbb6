use clap::Parser;

/// Runtime configuration for one bot identity.
///
/// Every knob can come from the command line or the environment, which keeps
/// multiple workers in one process trivially configurable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// base url of the remote server, e.g. http://localhost:8082/gemp-swccg-server/
    #[arg(long, env = "GEMP_SERVER_URL")]
    pub server_url: String,

    #[arg(long, env = "GEMP_USERNAME")]
    pub username: String,

    #[arg(long, env = "GEMP_PASSWORD")]
    pub password: String,

    /// directory holding Dark.json and Light.json card corpora
    #[arg(long, env = "CARD_JSON_DIR")]
    pub card_json_dir: String,

    /// seconds between hall polls while in the lobby
    #[arg(long, default_value_t = 3)]
    pub poll_interval_seconds: u64,

    /// connect/read timeout for ordinary requests
    #[arg(long, default_value_t = 10)]
    pub request_timeout_seconds: u64,

    /// read timeout for the long-poll game state request
    #[arg(long, default_value_t = 15)]
    pub game_state_timeout_seconds: u64,

    /// minimum total deployable power before committing cards to the board
    #[arg(long, default_value_t = 6)]
    pub deploy_threshold: i32,

    /// hard cap on hand size, drawing above this is strongly avoided
    #[arg(long, default_value_t = 16)]
    pub max_hand_size: usize,

    /// soft cap on hand size, draws above this are penalized
    #[arg(long, default_value_t = 12)]
    pub hand_soft_cap: usize,

    /// target force generation in icons
    #[arg(long, default_value_t = 6)]
    pub force_gen_target: i32,

    /// power advantage at which a battle counts as favorable
    #[arg(long, default_value_t = 4)]
    pub battle_favorable_threshold: i32,

    /// power disadvantage at which a location should be avoided or fled
    #[arg(long, default_value_t = -6, allow_hyphen_values = true)]
    pub battle_danger_threshold: i32,

    /// brain personality to instantiate
    #[arg(long, default_value = "Static")]
    pub brain_name: String,

    #[arg(long, default_value = "Bot Table")]
    pub table_name: String,

    #[arg(long, default_value = "open")]
    pub game_format: String,

    /// library deck to play; first deck matching our side when unset
    #[arg(long)]
    pub deck_name: Option<String>,
}

impl Config {
    /// A config suitable for unit tests; never talks to a real server.
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            server_url: "http://localhost:8082/gemp-swccg-server/".into(),
            username: "bot".into(),
            password: "hunter2".into(),
            card_json_dir: ".".into(),
            poll_interval_seconds: 3,
            request_timeout_seconds: 10,
            game_state_timeout_seconds: 15,
            deploy_threshold: 6,
            max_hand_size: 16,
            hand_soft_cap: 12,
            force_gen_target: 6,
            battle_favorable_threshold: 4,
            battle_danger_threshold: -6,
            brain_name: "Static".into(),
            table_name: "Bot Table".into(),
            game_format: "open".into(),
            deck_name: None,
        }
    }
}
