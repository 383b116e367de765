//! Error types for OxiFlate operations.
//!
//! Every fallible engine call returns [`Result`]. The variants follow the
//! taxonomy of the engine: configuration and arena problems are reported
//! before any state is touched, buffer errors are recoverable by calling
//! again, and data errors describe malformed compressed input.
//!
//! Error values never allocate. Messages are `&'static str` so they can be
//! produced from inside the engine on targets without a heap.

use thiserror::Error;

/// The main error type for OxiFlate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlateError {
    /// Invalid level, window bits, memory level, strategy or parameter.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was rejected.
        message: &'static str,
    },

    /// The arena cannot hold the structures for the requested configuration.
    #[error("arena too small: need {needed} bytes, have {available}")]
    ArenaTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        available: usize,
    },

    /// No progress was possible; supply more input or output space.
    #[error("buffer error: no progress possible")]
    Buffer,

    /// Malformed or corrupted compressed data.
    #[error("data error: {message}")]
    Data {
        /// Description of the corruption.
        message: &'static str,
    },

    /// Library version mismatch detected at initialization.
    #[error("version mismatch: library {expected}, caller {found}")]
    Version {
        /// Version of this library.
        expected: &'static str,
        /// Version the caller was built against.
        found: &'static str,
    },

    /// Operation not valid in the current stream state.
    #[error("stream error: {message}")]
    Stream {
        /// Description of the misuse.
        message: &'static str,
    },

    /// Segmented decompression finished after skipping corrupted blocks.
    #[error(
        "data error: {errors} corrupted block(s) skipped, {written} bytes recovered from {consumed} input bytes"
    )]
    CorruptBlocks {
        /// Number of data errors that were recovered from.
        errors: u32,
        /// Compressed bytes consumed.
        consumed: usize,
        /// Decompressed bytes written to the destination, all of them valid
        /// apart from the tail of each corrupted block.
        written: usize,
    },
}

/// Result type alias for OxiFlate operations.
pub type Result<T> = std::result::Result<T, FlateError>;

impl FlateError {
    /// Create a configuration error.
    pub const fn config(message: &'static str) -> Self {
        Self::Config { message }
    }

    /// Create an arena too small error.
    pub const fn arena_too_small(needed: usize, available: usize) -> Self {
        Self::ArenaTooSmall { needed, available }
    }

    /// Create a data error.
    pub const fn data(message: &'static str) -> Self {
        Self::Data { message }
    }

    /// Create a stream error.
    pub const fn stream(message: &'static str) -> Self {
        Self::Stream { message }
    }

    /// Whether this error reports corrupted compressed input.
    pub const fn is_data_error(&self) -> bool {
        matches!(self, Self::Data { .. } | Self::CorruptBlocks { .. })
    }

    /// Short advisory message, as stored on the stream.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Config { message } | Self::Data { message } | Self::Stream { message } => {
                *message
            }
            Self::ArenaTooSmall { .. } => "insufficient memory",
            Self::Buffer => "buffer error",
            Self::Version { .. } => "incompatible version",
            Self::CorruptBlocks { .. } => "corrupted blocks skipped",
        }
    }
}
