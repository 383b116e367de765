//! # OxiFlate Deflate
//!
//! Streaming DEFLATE (RFC 1951) compression and decompression with zlib
//! (RFC 1950) and gzip (RFC 1952) framing, running entirely inside one
//! caller-supplied work buffer.
//!
//! ## Features
//!
//! - **Compression**: levels 0-9, zlib's match heuristics
//!   - Stored, fast and lazy match finding
//!   - Filtered, Huffman-only, RLE and fixed-code strategies
//!   - Every flush mode, preset dictionaries, mid-stream parameter changes
//! - **Decompression**: all block types, resumable at any byte boundary
//!   - Automatic zlib/gzip detection
//!   - gzip header capture into caller buffers
//!   - Resynchronization at full flush points
//! - **Block segmentation**: one-shot compression into independently
//!   decodable blocks, and decompression that skips corrupted blocks
//! - **No heap**: engines carve all memory from an
//!   [`Arena`](oxiflate_core::Arena); [`bound`] tells how much they need
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::Arena;
//! use oxiflate_deflate::{DeflateConfig, InflateConfig, block, bound};
//!
//! let input = b"hello, hello!\0";
//! let config = DeflateConfig::default();
//!
//! let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
//! let mut compressed = vec![0u8; bound::max_output_size(input.len(), 4096, &config, None).unwrap()];
//! let len = block::compress(&mut compressed, input, 4096, &mut Arena::new(&mut work), config, None).unwrap();
//!
//! let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
//! let mut output = [0u8; 14];
//! let done = block::decompress(
//!     &mut output,
//!     &compressed[..len],
//!     &mut Arena::new(&mut work),
//!     InflateConfig::default(),
//!     None,
//! )
//! .unwrap();
//! assert_eq!(done.written, 14);
//! assert_eq!(&output, input);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod bound;
pub mod config;
pub mod deflate;
pub mod gzip;
pub mod inflate;
pub mod stream;
pub mod tables;

// Re-exports
pub use block::Decompressed;
pub use config::{DeflateConfig, InflateConfig, Strategy, Wrap};
pub use deflate::Deflater;
pub use gzip::{GzipHeader, GzipHeaderSink};
pub use inflate::Inflater;
pub use oxiflate_core::VERSION;
pub use stream::{StreamBuffers, StreamCodec, StreamInfo};

use oxiflate_core::error::{FlateError, Result};

/// Check that a caller built against `found` can use this library.
///
/// Versions must agree on the major number, and for 0.x also on the minor.
pub(crate) fn check_version(found: &'static str) -> Result<()> {
    fn api_level(version: &str) -> (&str, &str) {
        let mut parts = version.split('.');
        let major = parts.next().unwrap_or_default();
        let minor = if major == "0" { parts.next().unwrap_or_default() } else { "" };
        (major, minor)
    }

    if api_level(found) != api_level(VERSION) {
        return Err(FlateError::Version {
            expected: VERSION,
            found,
        });
    }
    Ok(())
}
