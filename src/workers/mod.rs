mod phase;
mod snapshot;
mod worker;

pub use phase::*;
pub use snapshot::*;
pub use worker::*;
