pub mod cards;
pub use cards::*;
pub mod config;
pub use config::*;
pub mod decision;
pub use decision::*;
pub mod evaluation;
pub use evaluation::*;
pub mod gameplay;
pub use gameplay::*;
pub mod planner;
pub use planner::*;
pub mod players;
pub use players::*;
pub mod transport;
pub use transport::*;
pub mod workers;
pub use workers::*;

/// dimensional analysis types
type Score = f64;
type Channel = u64;

// transport timing parameters
const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const GAME_STATE_TIMEOUT_SECS: u64 = 15;
const MAX_CONSECUTIVE_TIMEOUTS: usize = 3;

// decision safety parameters
const WEDGE_REPEATS: usize = 3;
const EVENT_BATCH_LIMIT: usize = 100;

// evaluator score deltas, loosely calibrated to the [0, 100] band
const VERY_GOOD_DELTA: Score = 50.0;
const GOOD_DELTA: Score = 10.0;
const BAD_DELTA: Score = -10.0;
const VERY_BAD_DELTA: Score = -50.0;
const MATCHING_SHIP_BONUS: Score = 150.0;

static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// initialize logging and setup graceful interrupt listener
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// listen for ctrl-c and flip the interrupt flag so workers can wind down
pub fn interrupts() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, stopping workers");
            INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}
