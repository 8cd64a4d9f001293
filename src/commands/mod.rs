//! CLI command implementations
//!
//! Every command runs against an engine that has already been initialized,
//! so the clock divisor is set and byte-programmable parts are unlocked.

mod erase;
mod probe;
mod write;

pub use erase::{run_chip_erase, run_erase};
pub use probe::run_probe;
pub use write::run_write;
