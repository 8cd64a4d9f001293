//! High-level flash operations
//!
//! This module provides the erase/write orchestration on top of the
//! protocol layer: chip geometry, board configuration, the per-variant
//! program strategies and the [`FlashEngine`] that ties them together.

mod config;
mod engine;
mod geometry;
mod programmer;

pub use config::{FlashConfig, FlashVariant, DEFAULT_FLASH_BASE, DEFAULT_PAGE_SIZE};
pub use engine::{EraseProgress, FlashEngine, NoProgress};
pub use geometry::{FixedGeometry, FlashGeometry, GeometryProbe};
pub use programmer::{ByteProgrammer, FlashProgrammer, GenericPageProgrammer};
