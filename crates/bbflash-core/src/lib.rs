//! bbflash-core - Program/erase engine for bit-banged SPI NOR flash
//!
//! This crate drives a SPI NOR flash chip through a software (bit-banged)
//! SPI transport, the way a bootloader does when the SoC only exposes a
//! shift register and a chip-select bit. It is `no_std` compatible.
//!
//! The layers, leaves first:
//!
//! - [`transport`] - the bit-bang primitives the engine consumes
//! - [`spi`] - opcodes, status register bits and address encoding
//! - [`protocol`] - command sequences, write-enable and busy polling
//! - [`flash`] - program strategies, geometry and the [`flash::FlashEngine`]
//!
//! # Features
//!
//! - `std` - Enable standard library support and TOML board profiles
//!
//! # Example
//!
//! ```ignore
//! use bbflash_core::flash::{FixedGeometry, FlashConfig, FlashEngine, FlashGeometry};
//!
//! let geometry = FlashGeometry::new(4 * 1024 * 1024, 64)?;
//! let mut engine = FlashEngine::initialize(transport, FlashConfig::default(), &mut FixedGeometry(geometry))?;
//! engine.erase(2, 3)?;
//! engine.write(0x9F02_0000, &image)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
pub mod board;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
