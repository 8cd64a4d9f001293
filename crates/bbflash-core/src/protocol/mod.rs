//! Protocol implementations
//!
//! This module contains the flash command sequences built on top of the
//! bit-bang transport, plus the busy-poll state machine.

mod poll;
mod spi25;

pub use poll::{wait_ready, PollMode};
pub use spi25::*;
