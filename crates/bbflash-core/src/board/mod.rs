//! Board profiles
//!
//! A board profile pins down everything about the flash that the engine
//! cannot discover: the variant, the memory-mapped base, the page size,
//! the polling policy and, for boards with a fixed part, the geometry.
//! Profiles are stored as TOML:
//!
//! ```toml
//! [board]
//! name = "ap143"
//!
//! [flash]
//! variant = "byte-programmable"
//! base = 0x9F000000
//! page_size = 256
//!
//! [geometry]
//! total_size = "4 MiB"
//! sector_count = 64
//!
//! [poll]
//! max_polls = 100000
//! backoff_us = 10
//! ```

mod toml;

use std::string::String;

use thiserror::Error;

use crate::flash::{FixedGeometry, FlashConfig, FlashGeometry, GeometryProbe};

/// Errors from loading a board profile
#[derive(Debug, Error)]
pub enum BoardError {
    /// Profile file could not be read
    #[error("failed to read board profile '{path}': {source}")]
    Io {
        /// Path of the profile
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Profile is not valid TOML or has unexpected fields
    #[error("failed to parse board profile: {0}")]
    Parse(#[from] ::toml::de::Error),

    /// A number or size string could not be parsed
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What went wrong
        message: String,
    },

    /// Geometry does not split into whole sectors
    #[error("invalid geometry: {0}")]
    Geometry(crate::error::Error),
}

/// Everything the engine needs to know about one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    /// Board name, for logging
    pub name: Option<String>,
    /// Engine configuration
    pub config: FlashConfig,
    /// Fixed flash geometry, if the board has one
    pub geometry: Option<FlashGeometry>,
}

impl BoardProfile {
    /// Geometry probe backed by this profile
    ///
    /// Reports no geometry when the profile has no `[geometry]` table.
    pub fn probe(&self) -> BoardGeometry {
        BoardGeometry(self.geometry.map(FixedGeometry))
    }
}

/// Geometry probe built from a board profile
#[derive(Debug, Clone, Copy)]
pub struct BoardGeometry(Option<FixedGeometry>);

impl GeometryProbe for BoardGeometry {
    fn probe(&mut self) -> Option<FlashGeometry> {
        self.0.map(|fixed| fixed.0)
    }
}
