//! Size queries.
//!
//! Pure arithmetic, no stream needed: how much arena a configuration
//! carves, and how large compressed output can get.
//!
//! The work sizes replicate the engines' reservations exactly, alignment
//! padding included, so an arena of exactly that size always suffices and
//! one byte less never does.

use crate::config::{DeflateConfig, MAX_MEM_LEVEL, MAX_WBITS, MIN_WBITS, Wrap};
use crate::deflate::DeflateLayout;
use crate::gzip::{GZIP_BASE_HEADER_LEN, GzipHeader};
use crate::inflate::InflateLayout;
use oxiflate_core::error::{FlateError, Result};

/// Bytes one block adds at most when compressed through
/// [`crate::block::compress`]: block header bits, the empty stored block of
/// the full flush and its alignment.
pub const BLOCK_OVERHEAD: usize = 12;

/// zlib header and Adler-32 trailer.
const ZLIB_WRAP_LEN: usize = 6;

/// gzip CRC-32 and length trailer.
const GZIP_TRAILER_LEN: usize = 8;

/// Arena bytes needed by a compressor.
///
/// A window of 2^8 is sized as 2^9, as the compressor promotes it.
///
/// # Errors
///
/// [`FlateError::Config`] when the window bits are outside 8-15 or the
/// memory level outside 1-9.
pub fn deflate_work_size(window_bits: u8, mem_level: u8) -> Result<usize> {
    if !(MIN_WBITS..=MAX_WBITS).contains(&window_bits) {
        return Err(FlateError::config("window bits must be 8-15"));
    }
    if !(1..=MAX_MEM_LEVEL).contains(&mem_level) {
        return Err(FlateError::config("memory level must be 1-9"));
    }
    DeflateLayout::new(window_bits, mem_level)
        .work_size()
        .ok_or(FlateError::config("work size overflows"))
}

/// Arena bytes needed by a decompressor.
///
/// # Errors
///
/// [`FlateError::Config`] when the window bits are outside 8-15.
pub fn inflate_work_size(window_bits: u8) -> Result<usize> {
    if !(MIN_WBITS..=MAX_WBITS).contains(&window_bits) {
        return Err(FlateError::config("window bits must be 8-15"));
    }
    InflateLayout::new(window_bits)
        .work_size()
        .ok_or(FlateError::config("work size overflows"))
}

/// Worst case for a zlib stream at default parameters, like zlib's
/// `compressBound`.
pub fn compress_bound(source_len: usize) -> usize {
    source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 13
}

/// Worst case with fixed codes.
fn fixed_len(source_len: usize) -> usize {
    source_len + (source_len >> 3) + (source_len >> 8) + (source_len >> 9) + 4
}

/// Worst case with stored blocks.
fn stored_len(source_len: usize) -> usize {
    source_len + (source_len >> 5) + (source_len >> 7) + (source_len >> 11) + 7
}

/// Raw deflate bound of a single stream, framing excluded.
///
/// The tight bound only holds for the default window and hash sizes;
/// otherwise the fixed-code bound applies when matches can be found at all,
/// and the stored-block bound when they cannot.
pub(crate) fn deflate_bound(source_len: usize, w_bits: usize, hash_bits: usize, level: u8) -> usize {
    if w_bits != 15 || hash_bits != 15 {
        return if w_bits <= hash_bits && level != 0 {
            fixed_len(source_len)
        } else {
            stored_len(source_len)
        };
    }
    source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 7
}

/// Largest output [`crate::block::compress`] can produce for `source_len`
/// bytes cut into blocks of `max_block_len`.
///
/// Holds for every level and strategy, so it does not depend on the
/// configuration beyond its framing.
///
/// # Errors
///
/// [`FlateError::Config`] when `max_block_len` is zero or the header is
/// not encodable.
pub fn max_output_size(
    source_len: usize,
    max_block_len: usize,
    config: &DeflateConfig,
    header: Option<&GzipHeader<'_>>,
) -> Result<usize> {
    if max_block_len == 0 {
        return Err(FlateError::config("block length must be nonzero"));
    }
    let wrap_len = match config.wrap {
        Wrap::Raw | Wrap::Auto => 0,
        Wrap::Zlib => ZLIB_WRAP_LEN,
        Wrap::Gzip => {
            let header_len = match header {
                Some(header) => {
                    header.validate()?;
                    header.encoded_len()
                }
                None => GZIP_BASE_HEADER_LEN,
            };
            header_len + GZIP_TRAILER_LEN
        }
    };
    let blocks = source_len.div_ceil(max_block_len).max(1);
    Ok(fixed_len(source_len)
        .max(stored_len(source_len))
        .saturating_add(blocks.saturating_mul(BLOCK_OVERHEAD))
        .saturating_add(wrap_len))
}
