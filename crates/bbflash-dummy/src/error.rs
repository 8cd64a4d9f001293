//! Error types for the flash emulator

use thiserror::Error;

/// Emulator errors
#[derive(Debug, Error)]
pub enum DummyError {
    /// Failed to read or write the backing image file
    #[error("image file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image file does not match the configured flash size
    #[error("image is {actual} bytes, flash is {expected} bytes")]
    ImageSize { expected: usize, actual: usize },

    /// Memory-mapped read attempted while software owns the flash
    #[error("flash is not memory-mapped: function select is still enabled")]
    FunctionSelectActive,

    /// Read past the end of the flash
    #[error("read of {len} bytes at 0x{offset:06X} is out of bounds")]
    OutOfBounds { offset: u32, len: usize },
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, DummyError>;
