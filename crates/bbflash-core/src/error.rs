//! Error types for bbflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Initialization errors
    /// Geometry probe did not recognize the flash
    GeometryNotFound,
    /// Total size does not split evenly into sectors
    InvalidGeometry {
        /// Total flash size in bytes
        total_size: u32,
        /// Number of sectors reported
        sector_count: u32,
    },

    /// Page size of zero in the flash configuration
    InvalidPageSize,

    // Operation errors
    /// Write/program operation did not complete
    ProgramError,
    /// Busy bit did not clear within the configured poll budget
    Timeout {
        /// Number of status reads issued before giving up
        polls: u32,
    },

    // Address errors
    /// Destination address lies below the memory-mapped flash base
    AddressOutOfBounds {
        /// Address passed by the caller
        addr: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeometryNotFound => write!(f, "no flash geometry found for this board"),
            Self::InvalidGeometry {
                total_size,
                sector_count,
            } => write!(
                f,
                "flash size 0x{:X} does not divide into {} sectors",
                total_size, sector_count
            ),
            Self::InvalidPageSize => write!(f, "page size must be non-zero"),
            Self::ProgramError => write!(f, "program operation failed"),
            Self::Timeout { polls } => {
                write!(f, "flash still busy after {} status polls", polls)
            }
            Self::AddressOutOfBounds { addr } => {
                write!(f, "address 0x{:08X} is below the flash base", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
