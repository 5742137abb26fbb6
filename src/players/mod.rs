mod brain;
mod random;
mod rulebook;

pub use brain::*;
pub use random::*;
pub use rulebook::*;

use crate::config::Config;

/// Brain personality selection at worker construction.
pub fn build(name: &str, config: &Config) -> Box<dyn Brain> {
    match name.to_ascii_lowercase().as_str() {
        "random" => Box::new(RandomBrain::default()),
        "static" => Box::new(StaticBrain::new(config)),
        other => {
            log::warn!("unknown brain {}, using Static", other);
            Box::new(StaticBrain::new(config))
        }
    }
}
