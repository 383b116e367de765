//! # OxiFlate Core
//!
//! Core components for the OxiFlate compression engine.
//!
//! This crate provides the building blocks shared by the compressor and the
//! decompressor:
//!
//! - [`arena`]: Fixed-buffer allocator that carves all working memory out of
//!   one caller-supplied byte slice
//! - [`checksum`]: Adler-32 and CRC-32 running checksums
//! - [`flush`]: Flush directives, call status and compression levels
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Segmentation                                        │
//! │     Block wrapper, resynchronization after corruption   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Deflate / Inflate state machines, zlib/gzip wraps   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Arena, checksums, flush vocabulary, errors          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::arena::Arena;
//! use oxiflate_core::checksum::{Checksum, Crc32};
//!
//! let mut buf = [0u8; 1024];
//! let mut arena = Arena::new(&mut buf);
//! let table: &mut [u16] = arena.reserve(256).unwrap();
//! assert_eq!(table.len(), 256);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod checksum;
pub mod error;
pub mod flush;

// Re-exports for convenience
pub use arena::{Arena, ArenaItem, region_size};
pub use checksum::{Adler32, Checksum, Crc32};
pub use error::{FlateError, Result};
pub use flush::{CompressionLevel, DataType, Flush, Status};

/// Library version, checked against the caller's expectation at stream init.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::checksum::{Adler32, Checksum, Crc32};
    pub use crate::error::{FlateError, Result};
    pub use crate::flush::{CompressionLevel, DataType, Flush, Status};
}
