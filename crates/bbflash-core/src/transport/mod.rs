//! Bit-bang transport abstraction
//!
//! The engine never touches hardware directly. Everything goes through
//! [`BitbangTransport`], which mirrors the register interface of SoC SPI
//! blocks that only offer a software-clocked shift register:
//!
//! - a clock divisor register
//! - a function select bit that hands the flash from the memory-mapped
//!   read window over to software
//! - byte clocking with chip-select held active
//! - a "go" strobe that deasserts chip-select and commits the command
//! - a read-back register holding the last 32 bits shifted in from MISO
//!
//! The transport is synchronous and infallible at this layer. Errors only
//! surface through the flash status register.
//!
//! [`PinTransport`] implements the contract on top of raw GPIO lines.

pub mod bitbang;

pub use bitbang::{BitbangPins, PinTransport};

use crate::spi::encode_address;

/// Register-level bit-bang SPI transport
///
/// Implementations hold the chip-select and latch state that the flash
/// protocol depends on, so a transport must be owned by exactly one
/// engine at a time.
pub trait BitbangTransport {
    /// Program the SPI clock divisor register
    fn set_clock_divisor(&mut self, divisor: u8);

    /// Hand the flash to software (`true`) or back to the memory-mapped
    /// read window (`false`)
    fn set_function_select(&mut self, enabled: bool);

    /// Start a new transaction
    ///
    /// Chip-select is driven inactive, dropping anything clocked since the
    /// last [`go`](Self::go), and becomes active again with the next byte.
    fn begin(&mut self);

    /// Clock out one byte, MSB first
    ///
    /// The 8 bits sampled on MISO at the same time shift into the
    /// read-back register.
    fn write_byte(&mut self, byte: u8);

    /// Clock out a 24-bit address, big-endian
    fn send_address(&mut self, address: u32) {
        for byte in encode_address(address) {
            self.write_byte(byte);
        }
    }

    /// Clock 8 idle cycles so the chip can shift a response byte out
    fn delay_8(&mut self);

    /// Deassert chip-select, committing the clocked command
    fn go(&mut self);

    /// Read the read-back register (last 32 bits sampled on MISO)
    fn read_data(&mut self) -> u32;

    /// Delay for the specified number of microseconds
    ///
    /// Only used for backoff between bounded status polls.
    fn delay_us(&mut self, _us: u32) {}
}

impl<T: BitbangTransport + ?Sized> BitbangTransport for &mut T {
    fn set_clock_divisor(&mut self, divisor: u8) {
        (**self).set_clock_divisor(divisor)
    }

    fn set_function_select(&mut self, enabled: bool) {
        (**self).set_function_select(enabled)
    }

    fn begin(&mut self) {
        (**self).begin()
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte)
    }

    fn send_address(&mut self, address: u32) {
        (**self).send_address(address)
    }

    fn delay_8(&mut self) {
        (**self).delay_8()
    }

    fn go(&mut self) {
        (**self).go()
    }

    fn read_data(&mut self) -> u32 {
        (**self).read_data()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
