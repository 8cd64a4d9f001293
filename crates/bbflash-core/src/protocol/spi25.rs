//! SPI25 command sequences over a bit-bang transport
//!
//! Every mutating sequence follows the same shape:
//!
//! ```text
//! write_enable -> opcode [-> address] [-> data] -> go -> wait_ready
//! ```
//!
//! The write enable latch clears itself after each write cycle, so it is
//! set again before every erase, program and status write. Skipping it
//! makes the chip silently ignore the command.

use crate::error::Result;
use crate::spi::{Command, StatusRegister};
use crate::transport::BitbangTransport;

use super::poll::{wait_ready, PollMode};

/// JEDEC identification bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JedecId {
    /// Manufacturer ID
    pub manufacturer: u8,
    /// Device ID (memory type, capacity)
    pub device: [u8; 2],
}

impl JedecId {
    /// Decode from the low 24 bits of the read-back register
    pub fn from_read_back(raw: u32) -> Self {
        Self {
            manufacturer: (raw >> 16) as u8,
            device: [(raw >> 8) as u8, raw as u8],
        }
    }

    /// Device ID as a big-endian 16-bit value
    pub fn device_id(&self) -> u16 {
        u16::from_be_bytes(self.device)
    }
}

/// Start a transaction and clock out an opcode
pub fn send_command<T: BitbangTransport + ?Sized>(transport: &mut T, command: Command) {
    transport.begin();
    transport.write_byte(command.opcode());
}

/// Start a transaction and clock out an opcode followed by a 3-byte address
pub fn send_addressed_command<T: BitbangTransport + ?Sized>(
    transport: &mut T,
    command: Command,
    addr: u32,
) {
    send_command(transport, command);
    transport.send_address(addr);
}

/// Set the write enable latch
///
/// Also takes the flash away from the memory-mapped window; call
/// [`release`] when the mutation sequence is finished.
pub fn write_enable<T: BitbangTransport + ?Sized>(transport: &mut T) {
    transport.set_function_select(true);
    send_command(transport, Command::WriteEnable);
    transport.go();
}

/// Hand the flash back to the memory-mapped read window
pub fn release<T: BitbangTransport + ?Sized>(transport: &mut T) {
    transport.set_function_select(false);
}

/// Read the status register
pub fn read_status<T: BitbangTransport + ?Sized>(transport: &mut T) -> StatusRegister {
    send_command(transport, Command::ReadStatus);
    transport.delay_8();
    StatusRegister::from_bits_retain(transport.read_data() as u8)
}

/// Read the JEDEC ID
///
/// The caller must have function select enabled.
pub fn read_jedec_id<T: BitbangTransport + ?Sized>(transport: &mut T) -> JedecId {
    send_command(transport, Command::ReadId);
    transport.delay_8();
    transport.delay_8();
    transport.delay_8();
    transport.go();
    JedecId::from_read_back(transport.read_data())
}

/// Write the status register
///
/// Used to clear the block protect bits on byte-programmable parts.
pub fn write_status<T: BitbangTransport + ?Sized>(
    transport: &mut T,
    value: u8,
    mode: PollMode,
) -> Result<()> {
    write_enable(transport);
    send_command(transport, Command::WriteStatusRegister);
    transport.write_byte(value);
    transport.go();
    wait_ready(transport, mode).map(|_| ())
}

/// Erase the sector starting at `addr`
///
/// `addr` is flash-relative and must be sector aligned; it is not checked.
pub fn sector_erase<T: BitbangTransport + ?Sized>(
    transport: &mut T,
    addr: u32,
    mode: PollMode,
) -> Result<()> {
    write_enable(transport);
    send_addressed_command(transport, Command::SectorErase, addr);
    transport.go();
    wait_ready(transport, mode).map(|_| ())
}

/// Program `data` at `addr` in one PageProgram cycle
///
/// The run must stay within one page: bytes past the page end wrap to the
/// start of the same page on the chip. Byte-programmable parts accept a
/// single byte per cycle.
pub fn program<T: BitbangTransport + ?Sized>(
    transport: &mut T,
    addr: u32,
    data: &[u8],
    mode: PollMode,
) -> Result<()> {
    write_enable(transport);
    send_addressed_command(transport, Command::PageProgram, addr);
    for &byte in data {
        transport.write_byte(byte);
    }
    transport.go();
    wait_ready(transport, mode).map(|_| ())
}

/// Erase the entire chip
pub fn chip_erase<T: BitbangTransport + ?Sized>(transport: &mut T, mode: PollMode) -> Result<()> {
    write_enable(transport);
    send_command(transport, Command::ChipErase);
    transport.go();
    wait_ready(transport, mode).map(|_| ())
}
