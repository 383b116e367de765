//! Property-based tests for the block wrapper.
//!
//! - Any input survives compression and decompression unchanged
//! - Compressed size stays within the size query
//! - Every block boundary carries a full flush marker
//! - A stream decodes the same through the streaming engine with tiny
//!   buffers as in one shot

use proptest::prelude::*;

use oxiflate_core::{Arena, Flush, Status};
use oxiflate_deflate::{
    DeflateConfig, InflateConfig, Inflater, StreamBuffers, Strategy as MatchStrategy, Wrap, block, bound,
};

fn wrap_strategy() -> impl Strategy<Value = Wrap> {
    prop_oneof![Just(Wrap::Raw), Just(Wrap::Zlib), Just(Wrap::Gzip)]
}

fn match_strategy() -> impl Strategy<Value = MatchStrategy> {
    prop_oneof![
        Just(MatchStrategy::Default),
        Just(MatchStrategy::Filtered),
        Just(MatchStrategy::HuffmanOnly),
        Just(MatchStrategy::Rle),
        Just(MatchStrategy::Fixed),
    ]
}

/// Mostly short repeats with some noise, so matches get exercised.
fn data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..3000),
        prop::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c'), any::<u8>()], 0..6000),
    ]
}

fn compress(source: &[u8], max_block_len: usize, config: DeflateConfig) -> (Vec<u8>, usize) {
    let limit = bound::max_output_size(source.len(), max_block_len, &config, None).unwrap();
    let mut work = vec![0u8; bound::deflate_work_size(config.window_bits, config.mem_level).unwrap()];
    let mut dest = vec![0u8; limit];
    let len = block::compress(&mut dest, source, max_block_len, &mut Arena::new(&mut work), config, None).unwrap();
    dest.truncate(len);
    (dest, limit)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Property: block compression round trips and respects the bound.
    #[test]
    fn prop_block_round_trip(
        source in data_strategy(),
        level in 0u8..=9,
        strategy in match_strategy(),
        wrap in wrap_strategy(),
        max_block_len in prop_oneof![1usize..64, 64usize..5000],
    ) {
        let config = DeflateConfig::default()
            .with_level(level)
            .with_strategy(strategy)
            .with_wrap(wrap);
        let (compressed, limit) = compress(&source, max_block_len, config);
        prop_assert!(compressed.len() <= limit);
        let markers = compressed.windows(4).filter(|w| *w == [0x00, 0x00, 0xFF, 0xFF]).count();
        let blocks = source.len().div_ceil(max_block_len);
        prop_assert!(markers >= blocks.saturating_sub(1), "{} markers for {} blocks", markers, blocks);

        let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
        let mut dest = vec![0u8; source.len()];
        let done = block::decompress(&mut dest, &compressed, &mut Arena::new(&mut work), InflateConfig::new(wrap), None);
        prop_assert!(done.is_ok(), "decompress failed: {:?}", done);
        prop_assert_eq!(dest, source);
    }

    /// Property: the decoder resumes correctly at any buffer split.
    #[test]
    fn prop_streaming_inflate_any_split(
        source in data_strategy(),
        in_chunk in 1usize..64,
        out_chunk in 1usize..300,
    ) {
        let (compressed, _) = compress(&source, 1 << 20, DeflateConfig::default());

        let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();

        let mut restored = Vec::with_capacity(source.len());
        let mut out = vec![0u8; out_chunk];
        let mut in_pos = 0;
        loop {
            let end = (in_pos + in_chunk).min(compressed.len());
            let mut strm = StreamBuffers::new(&compressed[in_pos..end], &mut out);
            let status = inflater.inflate(&mut strm, Flush::NoFlush);
            prop_assert!(status.is_ok(), "inflate failed at {}: {:?}", in_pos, status);
            in_pos += strm.consumed();
            let produced = strm.produced();
            restored.extend_from_slice(&out[..produced]);
            if status == Ok(Status::StreamEnd) {
                break;
            }
        }
        prop_assert_eq!(restored, source);
    }
}
