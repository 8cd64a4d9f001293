//! Busy polling
//!
//! Every erase, program and status write ends with a status poll. The
//! classic loop has no timeout: a chip that never clears BUSY stalls the
//! caller forever. [`PollMode::Bounded`] caps the number of reads and
//! returns [`Error::Timeout`] instead.

use crate::error::{Error, Result};
use crate::transport::BitbangTransport;

use super::spi25::read_status;

/// How long to keep polling the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// Poll until BUSY clears, however long that takes
    #[default]
    Unbounded,
    /// Give up after `max_polls` status reads
    Bounded {
        /// Maximum number of status reads
        max_polls: u32,
        /// Delay between reads, in microseconds
        backoff_us: u32,
    },
}

/// Wait for the BUSY bit to clear
///
/// Each iteration starts a transaction, sends ReadStatus, clocks 8 idle
/// cycles and tests bit 0 of the read-back register. The loop exits on the
/// first read that reports ready, so a chip that is ready on its Nth read
/// costs exactly N reads.
///
/// Returns the number of status reads issued.
pub fn wait_ready<T: BitbangTransport + ?Sized>(transport: &mut T, mode: PollMode) -> Result<u32> {
    let mut polls = 0u32;

    loop {
        let status = read_status(transport);
        polls = polls.saturating_add(1);

        if !status.is_busy() {
            log::trace!("flash ready after {} status polls", polls);
            return Ok(polls);
        }

        if let PollMode::Bounded {
            max_polls,
            backoff_us,
        } = mode
        {
            if polls >= max_polls {
                log::debug!("flash still busy after {} polls, giving up", polls);
                return Err(Error::Timeout { polls });
            }
            if backoff_us > 0 {
                transport.delay_us(backoff_us);
            }
        }
    }
}
