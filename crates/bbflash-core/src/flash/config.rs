//! Board-level flash configuration

use crate::error::{Error, Result};
use crate::protocol::PollMode;

use super::programmer::{ByteProgrammer, FlashProgrammer, GenericPageProgrammer};

/// Default memory-mapped address of flash offset 0
pub const DEFAULT_FLASH_BASE: u32 = 0x9F00_0000;

/// Default program page size in bytes
pub const DEFAULT_PAGE_SIZE: u32 = 256;

/// Flash family fitted on the board
///
/// This is a fixed board property; it is never derived from the JEDEC ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum FlashVariant {
    /// Page-programmable flash, no unlock needed
    #[default]
    Generic,
    /// Byte-programmable flash (SST25 style) that boots with its block
    /// protect bits set
    ByteProgrammable,
}

impl FlashVariant {
    /// The program strategy for this variant
    pub fn programmer(self) -> &'static dyn FlashProgrammer {
        match self {
            Self::Generic => &GenericPageProgrammer,
            Self::ByteProgrammable => &ByteProgrammer,
        }
    }
}

/// Configuration for the flash engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashConfig {
    /// Flash family
    pub variant: FlashVariant,
    /// Memory-mapped address of flash offset 0
    pub flash_base: u32,
    /// Program page size (generic variant)
    pub page_size: u32,
    /// Busy-poll behavior for every erase/program/status write
    pub poll: PollMode,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            variant: FlashVariant::Generic,
            flash_base: DEFAULT_FLASH_BASE,
            page_size: DEFAULT_PAGE_SIZE,
            poll: PollMode::Unbounded,
        }
    }
}

impl FlashConfig {
    /// Default configuration for a given variant
    pub fn for_variant(variant: FlashVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// Set the memory-mapped flash base
    pub fn with_flash_base(mut self, base: u32) -> Self {
        self.flash_base = base;
        self
    }

    /// Set the program page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the busy-poll mode
    pub fn with_poll(mut self, poll: PollMode) -> Self {
        self.poll = poll;
        self
    }

    /// Translate a memory-mapped address into a flash-relative offset
    pub fn to_relative(&self, addr: u32) -> Result<u32> {
        addr.checked_sub(self.flash_base)
            .ok_or(Error::AddressOutOfBounds { addr })
    }
}
