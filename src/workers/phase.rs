/// Lifecycle of one bot identity. Transitions are owned exclusively by the
/// worker's run loop; observers only ever see the current value through
/// snapshots.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    #[default]
    Stopped,
    Connecting,
    InLobby,
    WaitingForOpponent,
    Joining,
    Playing,
    GameEnded,
    Error,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Stopped => "stopped",
            Phase::Connecting => "connecting",
            Phase::InLobby => "in lobby",
            Phase::WaitingForOpponent => "waiting for opponent",
            Phase::Joining => "joining",
            Phase::Playing => "playing",
            Phase::GameEnded => "game ended",
            Phase::Error => "error",
        };
        write!(f, "{}", name)
    }
}
