//! Per-variant program strategies
//!
//! The two flash families differ in how a buffer is turned into program
//! cycles:
//!
//! - [`GenericPageProgrammer`] bursts up to one page per PageProgram and
//!   splits the buffer at page boundaries.
//! - [`ByteProgrammer`] issues one PageProgram per byte and needs its block
//!   protect bits cleared once at init.
//!
//! The engine picks one through [`FlashVariant::programmer`] and calls it
//! through `&dyn FlashProgrammer` from then on.

use crate::error::{Error, Result};
use crate::protocol;
use crate::transport::BitbangTransport;

use super::config::{FlashConfig, FlashVariant};

/// Clock divisor register value for page-programmable parts
const GENERIC_CLOCK_DIVISOR: u8 = 0x43;
/// Clock divisor register value for byte-programmable parts
const BYTE_CLOCK_DIVISOR: u8 = 0x03;

/// Program strategy for one flash family
pub trait FlashProgrammer: Sync {
    /// The variant this strategy implements
    fn variant(&self) -> FlashVariant;

    /// Value for the SPI clock divisor register
    fn clock_divisor(&self) -> u8;

    /// One-time unlock run during initialization
    fn unlock(&self, _transport: &mut dyn BitbangTransport, _config: &FlashConfig) -> Result<()> {
        Ok(())
    }

    /// Program `data` starting at flash-relative `addr`
    ///
    /// The target range must already be erased. The caller releases
    /// function select afterwards.
    fn write(
        &self,
        transport: &mut dyn BitbangTransport,
        config: &FlashConfig,
        addr: u32,
        data: &[u8],
    ) -> Result<()>;
}

/// Page-burst programming for generic SPI NOR parts
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPageProgrammer;

impl FlashProgrammer for GenericPageProgrammer {
    fn variant(&self) -> FlashVariant {
        FlashVariant::Generic
    }

    fn clock_divisor(&self) -> u8 {
        GENERIC_CLOCK_DIVISOR
    }

    fn write(
        &self,
        transport: &mut dyn BitbangTransport,
        config: &FlashConfig,
        addr: u32,
        data: &[u8],
    ) -> Result<()> {
        let page_size = config.page_size as usize;
        let mut offset = 0usize;
        let mut current_addr = addr;

        while offset < data.len() {
            // Calculate how many bytes until the next page boundary
            let page_offset = current_addr as usize % page_size;
            let bytes_to_page_end = page_size - page_offset;
            let chunk_size = core::cmp::min(bytes_to_page_end, data.len() - offset);

            log::trace!("program 0x{:06X} +{}", current_addr, chunk_size);
            protocol::program(
                transport,
                current_addr,
                &data[offset..offset + chunk_size],
                config.poll,
            )?;

            offset += chunk_size;
            current_addr = current_addr.wrapping_add(chunk_size as u32);
        }

        Ok(())
    }
}

/// Byte-at-a-time programming for SST25 style parts
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteProgrammer;

impl FlashProgrammer for ByteProgrammer {
    fn variant(&self) -> FlashVariant {
        FlashVariant::ByteProgrammable
    }

    fn clock_divisor(&self) -> u8 {
        BYTE_CLOCK_DIVISOR
    }

    /// Clear the block protect bits, which these parts set at power-up
    fn unlock(&self, transport: &mut dyn BitbangTransport, config: &FlashConfig) -> Result<()> {
        log::debug!("clearing block protect bits");
        let result = protocol::write_status(transport, 0x00, config.poll);
        protocol::release(transport);
        result
    }

    fn write(
        &self,
        transport: &mut dyn BitbangTransport,
        config: &FlashConfig,
        addr: u32,
        data: &[u8],
    ) -> Result<()> {
        let mut remaining = data.len();
        let mut current_addr = addr;

        for &byte in data {
            // Write enable must be repeated for every byte
            protocol::program(transport, current_addr, &[byte], config.poll)?;
            current_addr = current_addr.wrapping_add(1);
            remaining -= 1;
        }

        // The loop always drains the buffer; there is no way to observe a
        // dropped byte on this transport.
        if remaining != 0 {
            return Err(Error::ProgramError);
        }

        Ok(())
    }
}
