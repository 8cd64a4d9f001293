//! The flash engine
//!
//! [`FlashEngine`] owns the transport for the whole boot session and is
//! the only way the rest of the bootloader mutates flash. It runs the
//! init sequence once, then serves range erases and buffer writes.
//!
//! Every operation blocks until the chip reports ready. With
//! [`PollMode::Unbounded`](crate::protocol::PollMode::Unbounded) a chip
//! that never clears BUSY hangs the caller; configure
//! [`PollMode::Bounded`](crate::protocol::PollMode::Bounded) to get
//! [`Error::Timeout`] instead.

use crate::error::{Error, Result};
use crate::protocol::{self, JedecId};
use crate::spi::{fits_address_space, MAX_ADDRESS};
use crate::transport::BitbangTransport;

use super::config::{FlashConfig, FlashVariant};
use super::geometry::{FlashGeometry, GeometryProbe};
use super::programmer::FlashProgrammer;

/// Progress callbacks for range erase
pub trait EraseProgress {
    /// Called once before the first sector with the inclusive range
    fn erasing(&mut self, _first: u32, _last: u32) {}

    /// Called after each sector erase completes
    fn sector_erased(&mut self, _index: u32) {}
}

/// No-op progress implementation
pub struct NoProgress;

impl EraseProgress for NoProgress {}

/// Program/erase engine for one bit-banged SPI flash
pub struct FlashEngine<T> {
    transport: T,
    config: FlashConfig,
    geometry: FlashGeometry,
    programmer: &'static dyn FlashProgrammer,
    jedec_id: JedecId,
}

impl<T: BitbangTransport> FlashEngine<T> {
    /// Bring the flash up and discover its geometry
    ///
    /// Sets the clock divisor, unlocks byte-programmable parts, logs the
    /// JEDEC ID and asks `probe` for the geometry. The ID is diagnostic
    /// only; the program strategy comes from `config.variant`.
    pub fn initialize<G: GeometryProbe + ?Sized>(
        mut transport: T,
        config: FlashConfig,
        probe: &mut G,
    ) -> Result<Self> {
        if config.page_size == 0 {
            return Err(Error::InvalidPageSize);
        }

        let programmer = config.variant.programmer();

        log::debug!("SPI clock divisor 0x{:02X}", programmer.clock_divisor());
        transport.set_clock_divisor(programmer.clock_divisor());
        programmer.unlock(&mut transport, &config)?;

        transport.set_function_select(true);
        let jedec_id = protocol::read_jedec_id(&mut transport);
        protocol::release(&mut transport);

        log::info!(
            "Flash manufacturer ID 0x{:02X}, device ID 0x{:02X} 0x{:02X}",
            jedec_id.manufacturer,
            jedec_id.device[0],
            jedec_id.device[1]
        );

        let geometry = probe.probe().ok_or(Error::GeometryNotFound)?;
        log::info!(
            "Flash size {} bytes, {} sectors of {} bytes",
            geometry.total_size(),
            geometry.sector_count(),
            geometry.sector_size()
        );

        Ok(Self {
            transport,
            config,
            geometry,
            programmer,
            jedec_id,
        })
    }

    /// Geometry reported by the probe
    pub fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    /// Active configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Flash family in use
    pub fn variant(&self) -> FlashVariant {
        self.programmer.variant()
    }

    /// ID read during initialization
    pub fn jedec_id(&self) -> JedecId {
        self.jedec_id
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the engine and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Erase sectors `first..=last`
    pub fn erase(&mut self, first: u32, last: u32) -> Result<()> {
        self.erase_with_progress(first, last, &mut NoProgress)
    }

    /// Erase sectors `first..=last`, reporting each completed sector
    ///
    /// Sector indices are not checked against the geometry; an index past
    /// the end is logged and sent to the chip anyway. An empty range
    /// (`first > last`) erases nothing.
    pub fn erase_with_progress<P: EraseProgress + ?Sized>(
        &mut self,
        first: u32,
        last: u32,
        progress: &mut P,
    ) -> Result<()> {
        let sector_size = self.geometry.sector_size();
        log::info!(
            "Erasing sectors {}..={} (sector size 0x{:X})",
            first,
            last,
            sector_size
        );
        progress.erasing(first, last);

        let result = self.erase_sectors(first, last, progress);
        protocol::release(&mut self.transport);
        result
    }

    fn erase_sectors<P: EraseProgress + ?Sized>(
        &mut self,
        first: u32,
        last: u32,
        progress: &mut P,
    ) -> Result<()> {
        for index in first..=last {
            if !self.geometry.contains_sector(index) {
                log::warn!(
                    "sector {} is past the last sector ({})",
                    index,
                    self.geometry.sector_count() - 1
                );
            }
            let addr = self.geometry.sector_address(index);
            log::debug!("erasing sector {} at 0x{:06X}", index, addr);
            protocol::sector_erase(&mut self.transport, addr, self.config.poll)?;
            progress.sector_erased(index);
        }

        Ok(())
    }

    /// Erase the whole chip
    pub fn chip_erase(&mut self) -> Result<()> {
        log::info!("Erasing entire chip");
        let result = protocol::chip_erase(&mut self.transport, self.config.poll);
        protocol::release(&mut self.transport);
        result
    }

    /// Write `data` at memory-mapped address `dst`
    ///
    /// The covering sectors must have been erased. The flash base is
    /// subtracted exactly once before anything is sent to the chip.
    pub fn write(&mut self, dst: u32, data: &[u8]) -> Result<()> {
        let addr = self.config.to_relative(dst)?;
        log::info!(
            "Writing {} bytes to 0x{:08X} (flash offset 0x{:06X})",
            data.len(),
            dst,
            addr
        );
        if !fits_address_space(addr, data.len()) {
            log::warn!(
                "write of {} bytes at 0x{:06X} runs past 0x{:06X}; high address bits are dropped",
                data.len(),
                addr,
                MAX_ADDRESS
            );
        }

        let result = self
            .programmer
            .write(&mut self.transport, &self.config, addr, data);

        // The memory-mapped window stays dead until function select is off
        protocol::release(&mut self.transport);
        result
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::flash::FixedGeometry;
    use crate::protocol::PollMode;
    use crate::spi::opcodes;
    use crate::testing::{Event, RecordingTransport};
    use std::vec::Vec;

    fn geometry() -> FlashGeometry {
        FlashGeometry::new(0x40_0000, 64).unwrap()
    }

    fn engine(config: FlashConfig) -> FlashEngine<RecordingTransport> {
        let t = RecordingTransport::new().with_id(0xEF_4016);
        FlashEngine::initialize(t, config, &mut FixedGeometry(geometry())).unwrap()
    }

    fn addresses(t: &RecordingTransport, opcode: u8) -> Vec<u32> {
        t.payloads(opcode)
            .iter()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        range: Option<(u32, u32)>,
        erased: Vec<u32>,
    }

    impl EraseProgress for Recorder {
        fn erasing(&mut self, first: u32, last: u32) {
            self.range = Some((first, last));
        }

        fn sector_erased(&mut self, index: u32) {
            self.erased.push(index);
        }
    }

    #[test]
    fn test_generic_init_sequence() {
        let engine = engine(FlashConfig::default());

        assert_eq!(engine.jedec_id().manufacturer, 0xEF);
        assert_eq!(engine.jedec_id().device_id(), 0x4016);
        assert_eq!(engine.geometry(), geometry());
        assert_eq!(engine.variant(), FlashVariant::Generic);

        let events = engine.transport().events();
        assert_eq!(events[0], Event::Clock(0x43));
        assert_eq!(events[1], Event::FunctionSelect(true));
        assert_eq!(events.last(), Some(&Event::FunctionSelect(false)));
        assert!(engine.transport().payloads(opcodes::WRSR).is_empty());
    }

    #[test]
    fn test_byte_programmable_init_unlocks_first() {
        let engine = engine(FlashConfig::for_variant(FlashVariant::ByteProgrammable));
        let t = engine.transport();

        assert_eq!(t.events()[0], Event::Clock(0x03));
        let opcodes_in_order: Vec<u8> = t.transactions().iter().map(|tx| tx[0]).collect();
        assert_eq!(
            opcodes_in_order,
            [opcodes::WREN, opcodes::WRSR, opcodes::RDSR, opcodes::RDID]
        );
        assert_eq!(t.payloads(opcodes::WRSR), [[0x00]]);
    }

    #[test]
    fn test_missing_geometry_is_fatal() {
        let t = RecordingTransport::new();
        let mut probe = || -> Option<FlashGeometry> { None };
        let result = FlashEngine::initialize(t, FlashConfig::default(), &mut probe);
        assert!(matches!(result, Err(Error::GeometryNotFound)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let t = RecordingTransport::new();
        let config = FlashConfig::default().with_page_size(0);
        let result = FlashEngine::initialize(t, config, &mut FixedGeometry(geometry()));
        assert!(matches!(result, Err(Error::InvalidPageSize)));
    }

    #[test]
    fn test_erase_single_sector() {
        let mut engine = engine(FlashConfig::default());
        engine.erase(2, 2).unwrap();
        assert_eq!(addresses(engine.transport(), opcodes::SE), [0x2_0000]);
    }

    #[test]
    fn test_erase_range_reports_progress() {
        let mut engine = engine(FlashConfig::default());
        let mut progress = Recorder::default();

        engine.erase_with_progress(3, 5, &mut progress).unwrap();

        assert_eq!(progress.range, Some((3, 5)));
        assert_eq!(progress.erased, [3, 4, 5]);
        assert_eq!(
            addresses(engine.transport(), opcodes::SE),
            [0x3_0000, 0x4_0000, 0x5_0000]
        );
        assert_eq!(
            engine.transport().events().last(),
            Some(&Event::FunctionSelect(false))
        );
    }

    #[test]
    fn test_erase_empty_range() {
        let mut engine = engine(FlashConfig::default());
        engine.erase(5, 4).unwrap();
        assert!(engine.transport().payloads(opcodes::SE).is_empty());
    }

    #[test]
    fn test_erase_past_end_still_sent() {
        let mut engine = engine(FlashConfig::default());
        engine.erase(64, 64).unwrap();
        assert_eq!(addresses(engine.transport(), opcodes::SE), [0x40_0000]);
    }

    #[test]
    fn test_write_subtracts_base_once() {
        let mut engine = engine(FlashConfig::default());
        engine.write(0x9F00_1000, &[0x12, 0x34]).unwrap();

        assert_eq!(addresses(engine.transport(), opcodes::PP), [0x1000]);
        assert_eq!(
            engine.transport().events().last(),
            Some(&Event::FunctionSelect(false))
        );
    }

    #[test]
    fn test_write_past_address_space_still_sent() {
        let mut engine = engine(FlashConfig::default().with_flash_base(0));
        engine.write(0xFF_FFFF, &[0xAA, 0xBB]).unwrap();

        assert_eq!(addresses(engine.transport(), opcodes::PP), [0xFF_FFFF, 0]);
    }

    #[test]
    fn test_write_below_base_rejected() {
        let mut engine = engine(FlashConfig::default());
        assert_eq!(
            engine.write(0x1000, &[0]),
            Err(Error::AddressOutOfBounds { addr: 0x1000 })
        );
        assert!(engine.transport().payloads(opcodes::PP).is_empty());
    }

    #[test]
    fn test_every_mutation_preceded_by_write_enable() {
        let mut engine = engine(FlashConfig::for_variant(FlashVariant::ByteProgrammable));
        engine.erase(0, 1).unwrap();
        engine.write(0x9F00_0010, &[1, 2, 3]).unwrap();
        engine.chip_erase().unwrap();

        let txs = engine.transport().transactions();
        for (i, tx) in txs.iter().enumerate() {
            if matches!(tx[0], opcodes::SE | opcodes::PP | opcodes::CE | opcodes::WRSR) {
                assert!(i > 0 && txs[i - 1][0] == opcodes::WREN, "tx {} not enabled", i);
            }
        }
    }

    #[test]
    fn test_bounded_poll_timeout_releases_flash() {
        let t = RecordingTransport::new().with_busy_reads(1000);
        let config = FlashConfig::default().with_poll(PollMode::Bounded {
            max_polls: 5,
            backoff_us: 0,
        });
        let mut engine = FlashEngine::initialize(t, config, &mut FixedGeometry(geometry())).unwrap();

        assert_eq!(engine.erase(0, 3), Err(Error::Timeout { polls: 5 }));
        assert_eq!(addresses(engine.transport(), opcodes::SE), [0]);
        assert_eq!(
            engine.transport().events().last(),
            Some(&Event::FunctionSelect(false))
        );
    }

    #[test]
    fn test_unlock_timeout_releases_flash() {
        let t = RecordingTransport::new().with_busy_reads(1000);
        let config = FlashConfig::for_variant(FlashVariant::ByteProgrammable).with_poll(
            PollMode::Bounded {
                max_polls: 5,
                backoff_us: 0,
            },
        );
        let result = FlashEngine::initialize(t, config, &mut FixedGeometry(geometry()));

        assert!(matches!(result, Err(Error::Timeout { polls: 5 })));
    }
}
