//! bbflash-dummy - In-memory SPI NOR flash emulator
//!
//! [`DummyFlash`] sits behind [`BitbangTransport`] and decodes the byte
//! stream the way a real chip would: opcodes are latched per transaction,
//! mutations commit on `go`, the write enable latch gates every mutation
//! and the status register reports BUSY for a configurable number of
//! reads after each write cycle. It backs the integration tests and the
//! `bbflash` CLI, which keeps the flash contents in an image file.

mod error;

pub use error::{DummyError, Result};

use std::fs;
use std::path::Path;

use bbflash_core::flash::{FlashGeometry, FlashVariant};
use bbflash_core::spi::{Command, StatusRegister, ADDRESS_BYTES};
use bbflash_core::transport::BitbangTransport;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Sector size for the 0xD8 erase
    pub sector_size: usize,
    /// Program behavior of the emulated part
    pub variant: FlashVariant,
    /// Status reads that report BUSY after each accepted write cycle
    pub busy_reads: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4016,     // W25Q32
            size: 4 * 1024 * 1024,
            page_size: 256,
            sector_size: 64 * 1024,
            variant: FlashVariant::Generic,
            busy_reads: 0,
        }
    }
}

impl DummyConfig {
    /// SST25VF016B style byte-programmable part
    pub fn byte_programmable() -> Self {
        Self {
            manufacturer_id: 0xBF, // SST
            device_id: 0x2541,
            size: 2 * 1024 * 1024,
            variant: FlashVariant::ByteProgrammable,
            ..Default::default()
        }
    }

    /// Set the number of BUSY status reads after each write cycle
    pub fn with_busy_reads(mut self, busy_reads: u32) -> Self {
        self.busy_reads = busy_reads;
        self
    }

    /// Geometry matching this configuration
    pub fn geometry(&self) -> bbflash_core::Result<FlashGeometry> {
        FlashGeometry::new(self.size as u32, (self.size / self.sector_size) as u32)
    }

    fn initial_status(&self) -> StatusRegister {
        match self.variant {
            FlashVariant::Generic => StatusRegister::empty(),
            FlashVariant::ByteProgrammable => StatusRegister::BLOCK_PROTECT,
        }
    }
}

/// A committed transaction as the chip saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Opcode byte
    pub opcode: u8,
    /// Address for erase/program commands
    pub address: Option<u32>,
    /// Bytes clocked after the opcode and address
    pub data: Vec<u8>,
    /// Whether the chip acted on the command
    pub accepted: bool,
}

impl Transaction {
    /// Decoded command, if the opcode is known
    pub fn command(&self) -> Option<Command> {
        Command::from_opcode(self.opcode)
    }
}

/// Dummy flash chip plus bit-bang controller
///
/// Emulates a flash chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    status: StatusRegister,
    busy_remaining: u32,
    function_select: bool,
    clock_divisor: u8,
    selected: bool,
    tx: Vec<u8>,
    shift: u32,
    status_reads: u32,
    transactions: Vec<Transaction>,
}

impl DummyFlash {
    /// Create a new erased dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let status = config.initial_status();
        Self {
            config,
            data,
            status,
            busy_remaining: 0,
            function_select: false,
            clock_divisor: 0,
            selected: false,
            tx: Vec::new(),
            shift: 0,
            status_reads: 0,
            transactions: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration (W25Q32)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Load flash contents from an image file
    ///
    /// A missing file yields an erased chip.
    pub fn load_image(config: DummyConfig, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Image {} not found, starting erased", path.display());
            return Ok(Self::new(config));
        }

        let image = fs::read(path).map_err(|source| DummyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if image.len() != config.size {
            return Err(DummyError::ImageSize {
                expected: config.size,
                actual: image.len(),
            });
        }
        Ok(Self::with_data(config, &image))
    }

    /// Write flash contents to an image file
    pub fn save_image(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.data).map_err(|source| DummyError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Read through the memory-mapped window
    ///
    /// Only possible while function select is disabled, which is how the
    /// engine hands the flash back after a mutation.
    pub fn mapped_read(&self, offset: u32, buf: &mut [u8]) -> Result<()> {
        if self.function_select {
            return Err(DummyError::FunctionSelectActive);
        }
        let start = offset as usize;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(DummyError::OutOfBounds {
                offset,
                len: buf.len(),
            })?;
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    /// Current status register (without consuming a BUSY read)
    pub fn status(&self) -> StatusRegister {
        if self.busy_remaining > 0 {
            self.status | StatusRegister::BUSY
        } else {
            self.status
        }
    }

    /// Last programmed clock divisor
    pub fn clock_divisor(&self) -> u8 {
        self.clock_divisor
    }

    /// Whether software currently owns the flash
    pub fn function_select(&self) -> bool {
        self.function_select
    }

    /// Number of status bytes shifted out since creation
    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    /// Committed transactions, oldest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Committed transactions for one command
    pub fn transactions_for(&self, command: Command) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.opcode == command.opcode())
    }

    /// Forget the transaction log and status read counter
    pub fn clear_log(&mut self) {
        self.transactions.clear();
        self.status_reads = 0;
    }

    fn response_byte(&mut self, index: usize) -> u8 {
        let Some(&opcode) = self.tx.first() else {
            return 0xFF;
        };
        match Command::from_opcode(opcode) {
            Some(Command::ReadStatus) => {
                self.status_reads += 1;
                let status = self.status();
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
                status.bits()
            }
            Some(Command::ReadId) => match index {
                1 => self.config.manufacturer_id,
                2 => (self.config.device_id >> 8) as u8,
                3 => self.config.device_id as u8,
                _ => 0xFF,
            },
            _ => 0xFF,
        }
    }

    fn clock(&mut self, mosi: u8) {
        if !self.selected {
            // Nothing drives MISO without chip-select.
            self.shift = (self.shift << 8) | 0xFF;
            return;
        }
        // MISO of the opcode byte itself is idle.
        let out = if self.tx.is_empty() {
            0xFF
        } else {
            self.response_byte(self.tx.len())
        };
        self.tx.push(mosi);
        self.shift = (self.shift << 8) | u32::from(out);
    }

    fn write_allowed(&self) -> bool {
        self.busy_remaining == 0 && self.status.contains(StatusRegister::WEL)
    }

    fn unprotected(&self) -> bool {
        !self.status.intersects(StatusRegister::BLOCK_PROTECT)
    }

    fn page_program(&mut self, addr: usize, data: &[u8]) -> bool {
        if addr >= self.data.len() || data.is_empty() {
            return false;
        }
        match self.config.variant {
            FlashVariant::Generic => {
                let page_size = self.config.page_size;
                let page_base = addr - addr % page_size;
                let offset = addr % page_size;
                if data.len() > page_size - offset {
                    log::debug!(
                        "Page program at 0x{:06X} wraps within the page ({} bytes)",
                        addr,
                        data.len()
                    );
                }
                for (i, &byte) in data.iter().enumerate() {
                    let target = page_base + (offset + i) % page_size;
                    // Flash programming: can only change 1 -> 0
                    self.data[target] &= byte;
                }
            }
            FlashVariant::ByteProgrammable => {
                if data.len() > 1 {
                    log::debug!(
                        "Byte program at 0x{:06X} ignores {} extra bytes",
                        addr,
                        data.len() - 1
                    );
                }
                self.data[addr] &= data[0];
            }
        }
        true
    }

    fn sector_erase(&mut self, addr: usize) -> bool {
        let sector_size = self.config.sector_size;
        let aligned = addr - addr % sector_size;
        if aligned + sector_size > self.data.len() {
            return false;
        }
        self.data[aligned..aligned + sector_size].fill(0xFF);
        true
    }

    fn execute(&mut self, tx: &[u8]) -> Transaction {
        let opcode = tx[0];
        let command = Command::from_opcode(opcode);
        let has_address = command.is_some_and(Command::has_address);

        let (address, payload) = if has_address && tx.len() > ADDRESS_BYTES {
            let addr = u32::from_be_bytes([0, tx[1], tx[2], tx[3]]);
            (Some(addr), &tx[1 + ADDRESS_BYTES..])
        } else {
            (None, &tx[1..])
        };

        let accepted = match command {
            Some(Command::WriteEnable) => {
                if self.busy_remaining == 0 {
                    self.status.insert(StatusRegister::WEL);
                    true
                } else {
                    false
                }
            }
            Some(Command::ReadId) | Some(Command::ReadStatus) => true,
            Some(Command::WriteStatusRegister) => {
                let ok = self.write_allowed() && !payload.is_empty();
                if ok {
                    let writable = StatusRegister::BLOCK_PROTECT | StatusRegister::SRWD;
                    self.status = (self.status - writable)
                        | (StatusRegister::from_bits_truncate(payload[0]) & writable);
                }
                ok
            }
            Some(Command::PageProgram) => {
                self.write_allowed()
                    && self.unprotected()
                    && address.is_some_and(|addr| self.page_program(addr as usize, payload))
            }
            Some(Command::SectorErase) => {
                self.write_allowed()
                    && self.unprotected()
                    && address.is_some_and(|addr| self.sector_erase(addr as usize))
            }
            Some(Command::ChipErase) => {
                let ok = self.write_allowed() && self.unprotected();
                if ok {
                    self.data.fill(0xFF);
                }
                ok
            }
            None => {
                log::warn!("Dummy flash: unsupported opcode 0x{:02X}", opcode);
                false
            }
        };

        if command.is_some_and(Command::is_mutating) {
            // The latch clears whether or not the cycle ran.
            self.status.remove(StatusRegister::WEL);
            if accepted {
                self.busy_remaining = self.config.busy_reads;
            } else {
                log::debug!(
                    "Dummy flash: rejected opcode 0x{:02X} (status {:?})",
                    opcode,
                    self.status
                );
            }
        }

        Transaction {
            opcode,
            address,
            data: payload.to_vec(),
            accepted,
        }
    }
}

impl BitbangTransport for DummyFlash {
    fn set_clock_divisor(&mut self, divisor: u8) {
        self.clock_divisor = divisor;
    }

    fn set_function_select(&mut self, enabled: bool) {
        self.function_select = enabled;
        if !enabled {
            self.selected = false;
            self.tx.clear();
        }
    }

    fn begin(&mut self) {
        self.tx.clear();
        self.selected = self.function_select;
        if !self.selected {
            log::trace!("Dummy flash: transaction while memory-mapped, ignored");
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.clock(byte);
    }

    fn delay_8(&mut self) {
        self.clock(0x00);
    }

    fn go(&mut self) {
        if !self.selected || self.tx.is_empty() {
            self.selected = false;
            return;
        }
        let tx = core::mem::take(&mut self.tx);
        let transaction = self.execute(&tx);
        self.transactions.push(transaction);
        self.selected = false;
    }

    fn read_data(&mut self) -> u32 {
        self.shift
    }
}
