//! One-shot compression into independently decodable blocks, and
//! decompression that survives corrupted blocks.
//!
//! [`compress`] feeds the input in chunks of at most `max_block_len` bytes
//! and ends every chunk but the last with a full flush. Each full flush
//! leaves the `00 00 FF FF` marker and clears the match history, so
//! decoding can restart right after any marker.
//!
//! [`decompress`] decodes until the stream ends. On a data error it skips
//! to the next marker and carries on; everything decoded before and after
//! the damage stays in the destination.
//!
//! ```text
//! ┌─────────┬────┬─────────┬────┬─────────┬─────────┐
//! │ block 0 │ FF │ block 1 │ FF │ block 2 │ trailer │
//! └─────────┴────┴─────────┴────┴─────────┴─────────┘
//!                     ▲ corrupt: resync at the next marker
//! ```

use crate::config::{DeflateConfig, InflateConfig};
use crate::deflate::Deflater;
use crate::gzip::{GzipHeader, GzipHeaderSink};
use crate::inflate::Inflater;
use crate::stream::StreamBuffers;
use oxiflate_core::arena::Arena;
use oxiflate_core::error::{FlateError, Result};
use oxiflate_core::flush::{Flush, Status};
use tracing::{debug, warn};

/// Outcome of a clean [`decompress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decompressed {
    /// Compressed bytes consumed.
    pub consumed: usize,
    /// Bytes written to the destination.
    pub written: usize,
}

/// Compress `source` into `dest` as blocks of at most `max_block_len`
/// input bytes, returning the compressed length.
///
/// `dest` of [`crate::bound::max_output_size`] bytes always suffices.
///
/// # Errors
///
/// - [`FlateError::Config`] for invalid parameters or a zero block length
/// - [`FlateError::ArenaTooSmall`] when the arena cannot hold a compressor
/// - [`FlateError::Buffer`] when `dest` is too small
/// - [`FlateError::Stream`] when the compressor stops making progress
pub fn compress<'a>(
    dest: &mut [u8],
    source: &[u8],
    max_block_len: usize,
    arena: &mut Arena<'a>,
    config: DeflateConfig,
    header: Option<GzipHeader<'a>>,
) -> Result<usize> {
    if max_block_len == 0 {
        return Err(FlateError::config("block length must be nonzero"));
    }
    let mut deflater = Deflater::new(arena, config)?;
    if let Some(header) = header {
        deflater.set_header(header)?;
    }

    let (mut in_pos, mut out_pos) = (0, 0);
    let max_calls = 2 * source.len().div_ceil(max_block_len) + 4;
    for _ in 0..max_calls {
        let take = max_block_len.min(source.len() - in_pos);
        // All remaining space, so that a full flush always gets as far as
        // its marker.
        let room = dest.len() - out_pos;
        if room == 0 {
            return Err(FlateError::Buffer);
        }
        let flush = if in_pos + take < source.len() {
            Flush::FullFlush
        } else {
            Flush::Finish
        };

        let mut strm = StreamBuffers::new(&source[in_pos..in_pos + take], &mut dest[out_pos..]);
        let status = deflater.deflate(&mut strm, flush)?;
        in_pos += strm.consumed();
        out_pos += strm.produced();
        if flush == Flush::FullFlush && strm.avail_out() == 0 {
            return Err(FlateError::Buffer);
        }

        if status == Status::StreamEnd {
            deflater.end()?;
            debug!(
                source_len = source.len(),
                compressed_len = out_pos,
                max_block_len,
                "block compression done"
            );
            return Ok(out_pos);
        }
    }
    Err(FlateError::stream("block compression made no progress"))
}

/// Decompress `source` into `dest`, skipping corrupted blocks.
///
/// A gzip header is captured into `header` when one is given; that needs
/// gzip or automatic framing.
///
/// # Errors
///
/// - [`FlateError::CorruptBlocks`] when any block was corrupted. Every byte
///   recovered is in `dest` and the error carries the counts.
/// - [`FlateError::Data`] when the stream is cut short or needs a preset
///   dictionary
/// - [`FlateError::Buffer`] when `dest` is too small
/// - [`FlateError::Config`], [`FlateError::ArenaTooSmall`] and
///   [`FlateError::Stream`] for setup problems
pub fn decompress(
    dest: &mut [u8],
    source: &[u8],
    arena: &mut Arena<'_>,
    config: InflateConfig,
    mut header: Option<&mut GzipHeaderSink<'_>>,
) -> Result<Decompressed> {
    let mut inflater = Inflater::new(arena, config)?;
    if let Some(sink) = header.as_deref_mut() {
        inflater.set_header_sink(sink.reborrow())?;
    }

    let (mut in_pos, mut out_pos) = (0, 0);
    let mut errors = 0u32;
    let mut no_output = [0u8; 0];

    // Every call either consumes input or ends the loop.
    let max_calls = source.len() + 8;
    let mut outcome = Err(FlateError::stream("block decompression made no progress"));
    for _ in 0..max_calls {
        let mut strm = StreamBuffers::new(&source[in_pos..], &mut dest[out_pos..]);
        let result = inflater.inflate(&mut strm, Flush::Finish);
        in_pos += strm.consumed();
        out_pos += strm.produced();

        match result {
            Ok(Status::StreamEnd) => {
                outcome = Ok(());
                break;
            }
            Ok(Status::NeedDict) => {
                outcome = Err(FlateError::data("preset dictionary required"));
                break;
            }
            Ok(Status::Ok) => {}
            Err(err) if err.is_data_error() => {
                errors += 1;
                warn!(
                    errors,
                    offset = in_pos,
                    written = out_pos,
                    reason = err.message(),
                    "corrupted block, searching for next flush point"
                );
                let mut strm = StreamBuffers::new(&source[in_pos..], &mut no_output);
                let synced = inflater.sync(&mut strm);
                in_pos += strm.consumed();
                if synced.is_err() {
                    outcome = Ok(());
                    break;
                }
            }
            Err(FlateError::Buffer) => {
                outcome = if errors > 0 {
                    Ok(())
                } else if out_pos < dest.len() {
                    Err(FlateError::data("unexpected end of compressed data"))
                } else {
                    Err(FlateError::Buffer)
                };
                break;
            }
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }

    let state = inflater.header().map(GzipHeaderSink::state);
    if let (Some(sink), Some(state)) = (header, state) {
        sink.restore(state);
    }
    outcome?;

    if errors > 0 {
        warn!(errors, consumed = in_pos, written = out_pos, "skipped corrupted blocks");
        return Err(FlateError::CorruptBlocks {
            errors,
            consumed: in_pos,
            written: out_pos,
        });
    }
    Ok(Decompressed {
        consumed: in_pos,
        written: out_pos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound;
    use crate::config::Wrap;

    fn text(len: usize) -> Vec<u8> {
        let words: [&[u8]; 6] = [b"block ", b"stream ", b"marker ", b"window ", b"flush ", b"tree "];
        let mut state = 7u32;
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            out.extend_from_slice(words[(state >> 16) as usize % words.len()]);
        }
        out.truncate(len);
        out
    }

    fn noise(len: usize) -> Vec<u8> {
        let mut state = 11u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect()
    }

    fn compress_vec(source: &[u8], max_block_len: usize, config: DeflateConfig) -> Vec<u8> {
        let mut work = vec![0u8; bound::deflate_work_size(config.window_bits, config.mem_level).unwrap()];
        let mut dest = vec![0u8; bound::max_output_size(source.len(), max_block_len, &config, None).unwrap()];
        let len = compress(&mut dest, source, max_block_len, &mut Arena::new(&mut work), config, None).unwrap();
        dest.truncate(len);
        dest
    }

    fn decompress_vec(source: &[u8], capacity: usize, config: InflateConfig) -> (Vec<u8>, Result<Decompressed>) {
        let mut work = vec![0u8; bound::inflate_work_size(config.window_bits).unwrap()];
        let mut dest = vec![0u8; capacity];
        let result = decompress(&mut dest, source, &mut Arena::new(&mut work), config, None);
        (dest, result)
    }

    #[test]
    fn test_round_trip_many_blocks() {
        let source = text(10_000);
        let compressed = compress_vec(&source, 1000, DeflateConfig::default());
        let markers = compressed.windows(4).filter(|w| *w == [0, 0, 0xFF, 0xFF]).count();
        assert_eq!(markers, 9);

        let (dest, result) = decompress_vec(&compressed, source.len(), InflateConfig::default());
        assert_eq!(
            result.unwrap(),
            Decompressed {
                consumed: compressed.len(),
                written: source.len()
            }
        );
        assert_eq!(dest, source);
    }

    #[test]
    fn test_incompressible_blocks_keep_markers() {
        let source = noise(20_000);
        for wrap in [Wrap::Raw, Wrap::Zlib, Wrap::Gzip] {
            for level in [0, 1, 6, 9] {
                let config = DeflateConfig::default().with_level(level).with_wrap(wrap);
                let compressed = compress_vec(&source, 2000, config);
                let markers = compressed.windows(4).filter(|w| *w == [0, 0, 0xFF, 0xFF]).count();
                assert!(markers >= 9, "level {level} under {wrap:?}: {markers} markers");

                let (dest, result) = decompress_vec(&compressed, source.len(), InflateConfig::new(wrap));
                assert_eq!(result.map(|done| done.written), Ok(source.len()), "level {level} under {wrap:?}");
                assert_eq!(dest, source);
            }
        }
    }

    #[test]
    fn test_zero_block_length_rejected() {
        let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
        let mut dest = [0u8; 64];
        let result = compress(&mut dest, b"abc", 0, &mut Arena::new(&mut work), DeflateConfig::default(), None);
        assert!(matches!(result, Err(FlateError::Config { .. })));
    }

    #[test]
    fn test_destination_too_small() {
        let source = text(4000);
        let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
        let mut dest = [0u8; 16];
        let result = compress(&mut dest, &source, 1000, &mut Arena::new(&mut work), DeflateConfig::default(), None);
        assert_eq!(result, Err(FlateError::Buffer));
    }

    #[test]
    fn test_truncated_stream_is_data_error() {
        let source = text(3000);
        let compressed = compress_vec(&source, 1000, DeflateConfig::default());
        let (_, result) = decompress_vec(&compressed[..compressed.len() - 6], source.len(), InflateConfig::default());
        assert_eq!(result, Err(FlateError::data("unexpected end of compressed data")));
    }

    #[test]
    fn test_short_destination_is_buffer_error() {
        let source = text(3000);
        let compressed = compress_vec(&source, 1000, DeflateConfig::default());
        let (_, result) = decompress_vec(&compressed, 100, InflateConfig::default());
        assert_eq!(result, Err(FlateError::Buffer));
    }

    #[test]
    fn test_corrupted_block_skipped() {
        let source = text(5000);
        let config = DeflateConfig::default().with_wrap(Wrap::Raw);
        let mut compressed = compress_vec(&source, 1000, config);

        // Turn the header of the third block into an invalid block type.
        let marker = compressed
            .windows(4)
            .enumerate()
            .filter(|(_, w)| *w == [0, 0, 0xFF, 0xFF])
            .map(|(i, _)| i + 4)
            .nth(1)
            .unwrap();
        compressed[marker] |= 0b110;
        compressed[marker] &= !1;

        let (dest, result) = decompress_vec(&compressed, source.len(), InflateConfig::new(Wrap::Raw));
        let Err(FlateError::CorruptBlocks { errors, consumed, written }) = result else {
            panic!("expected corrupted blocks, got {result:?}");
        };
        assert_eq!(errors, 1);
        assert_eq!(consumed, compressed.len());
        assert_eq!(written, 4000);
        assert_eq!(&dest[..2000], &source[..2000]);
        assert_eq!(&dest[2000..4000], &source[3000..]);
    }
}
