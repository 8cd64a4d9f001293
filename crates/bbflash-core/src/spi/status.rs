//! Status register bits

use bitflags::bitflags;

bitflags! {
    /// Flash status register
    ///
    /// The engine only interprets `BUSY`. The other bits are named so the
    /// emulator and diagnostics can talk about them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u8 {
        /// Write in progress
        const BUSY = 1 << 0;
        /// Write enable latch
        const WEL  = 1 << 1;
        /// Block protect bit 0
        const BP0  = 1 << 2;
        /// Block protect bit 1
        const BP1  = 1 << 3;
        /// Block protect bit 2
        const BP2  = 1 << 4;
        /// Status register write disable
        const SRWD = 1 << 7;

        /// All block protect bits
        const BLOCK_PROTECT = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits();
    }
}

impl StatusRegister {
    /// Whether an erase or program cycle is still running
    pub fn is_busy(self) -> bool {
        self.contains(Self::BUSY)
    }
}
