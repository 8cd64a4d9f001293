//! SPI types for the bit-banged command set
//!
//! This module provides the fixed opcode set, status register bits and
//! the 24-bit address encoding used on the wire.

mod address;
pub mod opcodes;
mod status;

pub use address::{encode_address, fits_address_space, ADDRESS_BYTES, MAX_ADDRESS};
pub use opcodes::Command;
pub use status::StatusRegister;
