//! SPI flash opcodes used by the engine
//!
//! Only the commands the program/erase engine issues are defined here.
//! Reads go through the memory-mapped window and never use an opcode.

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;
/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Sector Erase (64KB) with 3-byte address
pub const SE: u8 = 0xD8;
/// Chip Erase (entire chip)
pub const CE: u8 = 0xC7;

/// A command understood by the flash chip
///
/// Each command maps to exactly one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Read the JEDEC manufacturer and device ID
    ReadId,
    /// Set the write enable latch
    WriteEnable,
    /// Read the status register
    ReadStatus,
    /// Erase the sector containing the address
    SectorErase,
    /// Program up to one page (or one byte on byte-programmable parts)
    PageProgram,
    /// Erase the whole chip
    ChipErase,
    /// Write the status register
    WriteStatusRegister,
}

impl Command {
    /// All commands, in opcode table order
    pub const ALL: [Command; 7] = [
        Command::ReadId,
        Command::WriteEnable,
        Command::ReadStatus,
        Command::SectorErase,
        Command::PageProgram,
        Command::ChipErase,
        Command::WriteStatusRegister,
    ];

    /// The opcode byte sent on the wire
    pub const fn opcode(self) -> u8 {
        match self {
            Self::ReadId => RDID,
            Self::WriteEnable => WREN,
            Self::ReadStatus => RDSR,
            Self::SectorErase => SE,
            Self::PageProgram => PP,
            Self::ChipErase => CE,
            Self::WriteStatusRegister => WRSR,
        }
    }

    /// Look up the command for an opcode byte
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.opcode() == opcode)
    }

    /// Whether the command is followed by a 3-byte address
    pub const fn has_address(self) -> bool {
        matches!(self, Self::SectorErase | Self::PageProgram)
    }

    /// Whether the chip requires the write enable latch for this command
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::SectorErase | Self::PageProgram | Self::ChipErase | Self::WriteStatusRegister
        )
    }
}
