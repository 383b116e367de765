//! Round trips through the streaming engines and the block wrapper.

use oxiflate_core::{Adler32, Arena, Checksum, FlateError, Flush, Status};
use oxiflate_deflate::{
    DeflateConfig, Deflater, GzipHeader, GzipHeaderSink, InflateConfig, Inflater, StreamBuffers, StreamCodec,
    Strategy, Wrap, block, bound,
};

const STRATEGIES: [Strategy; 5] = [
    Strategy::Default,
    Strategy::Filtered,
    Strategy::HuffmanOnly,
    Strategy::Rle,
    Strategy::Fixed,
];

/// Pseudo-random bytes from a fixed seed.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

/// Word salad: compressible but not trivially so.
fn text(len: usize) -> Vec<u8> {
    let words: [&[u8]; 8] = [
        b"the ", b"quick ", b"brown ", b"fox ", b"jumps ", b"over ", b"lazy ", b"dogs. ",
    ];
    let mut out = Vec::with_capacity(len);
    for (i, byte) in noise(len, 99).into_iter().enumerate() {
        if out.len() >= len {
            break;
        }
        out.extend_from_slice(words[usize::from(byte) % words.len()]);
        if i % 17 == 0 {
            out.push(byte);
        }
    }
    out.truncate(len);
    out
}

fn block_compress(source: &[u8], max_block_len: usize, config: DeflateConfig) -> Vec<u8> {
    let mut work = vec![0u8; bound::deflate_work_size(config.window_bits, config.mem_level).unwrap()];
    let mut dest = vec![0u8; bound::max_output_size(source.len(), max_block_len, &config, None).unwrap()];
    let len = block::compress(&mut dest, source, max_block_len, &mut Arena::new(&mut work), config, None).unwrap();
    dest.truncate(len);
    dest
}

fn block_decompress(compressed: &[u8], len: usize, config: InflateConfig) -> Vec<u8> {
    let mut work = vec![0u8; bound::inflate_work_size(config.window_bits).unwrap()];
    let mut dest = vec![0u8; len];
    let done = block::decompress(&mut dest, compressed, &mut Arena::new(&mut work), config, None).unwrap();
    assert_eq!(done.consumed, compressed.len());
    assert_eq!(done.written, len);
    dest
}

/// Compress through small, fixed-size buffers.
fn deflate_streaming(source: &[u8], config: DeflateConfig, in_chunk: usize, out_chunk: usize) -> Vec<u8> {
    let mut work = vec![0u8; bound::deflate_work_size(config.window_bits, config.mem_level).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, config).unwrap();

    let mut compressed = Vec::new();
    let mut out = vec![0u8; out_chunk];
    let mut in_pos = 0;
    loop {
        let end = (in_pos + in_chunk).min(source.len());
        let flush = if end == source.len() { Flush::Finish } else { Flush::NoFlush };
        let mut strm = StreamBuffers::new(&source[in_pos..end], &mut out);
        let status = deflater.deflate(&mut strm, flush).unwrap();
        in_pos += strm.consumed();
        let produced = strm.produced();
        compressed.extend_from_slice(&out[..produced]);
        if status == Status::StreamEnd {
            break;
        }
    }
    deflater.end().unwrap();
    compressed
}

/// Decompress through small, fixed-size buffers.
fn inflate_streaming(compressed: &[u8], config: InflateConfig, in_chunk: usize, out_chunk: usize) -> Vec<u8> {
    let mut work = vec![0u8; bound::inflate_work_size(config.window_bits).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, config).unwrap();

    let mut decompressed = Vec::new();
    let mut out = vec![0u8; out_chunk];
    let mut in_pos = 0;
    loop {
        let end = (in_pos + in_chunk).min(compressed.len());
        let mut strm = StreamBuffers::new(&compressed[in_pos..end], &mut out);
        let status = inflater.inflate(&mut strm, Flush::NoFlush).unwrap();
        in_pos += strm.consumed();
        let produced = strm.produced();
        decompressed.extend_from_slice(&out[..produced]);
        if status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(in_pos, compressed.len());
    decompressed
}

#[test]
fn test_levels_strategies_and_wraps() {
    let mut source = text(12_000);
    source.extend(noise(3000, 5));
    source.extend(vec![0u8; 2000]);

    for wrap in [Wrap::Raw, Wrap::Zlib, Wrap::Gzip] {
        for level in 0..=9 {
            for strategy in STRATEGIES {
                let config = DeflateConfig::default()
                    .with_level(level)
                    .with_strategy(strategy)
                    .with_wrap(wrap);
                let compressed = block_compress(&source, 8192, config);
                let restored = block_decompress(&compressed, source.len(), InflateConfig::new(wrap));
                assert!(
                    restored == source,
                    "round trip failed: level {level}, {strategy:?}, {wrap:?}"
                );
            }
        }
    }
}

#[test]
fn test_small_window_and_memory() {
    let source = text(20_000);
    for (window_bits, mem_level) in [(9, 1), (10, 3), (12, 9)] {
        let config = DeflateConfig::default()
            .with_window_bits(window_bits)
            .with_mem_level(mem_level);
        let compressed = block_compress(&source, 1 << 20, config);
        let inflate_config = InflateConfig::default().with_window_bits(window_bits);
        assert_eq!(block_decompress(&compressed, source.len(), inflate_config), source);
    }
}

#[test]
fn test_auto_detects_framing() {
    let source = text(3000);
    for wrap in [Wrap::Zlib, Wrap::Gzip] {
        let compressed = block_compress(&source, 1 << 16, DeflateConfig::default().with_wrap(wrap));
        assert_eq!(block_decompress(&compressed, source.len(), InflateConfig::new(Wrap::Auto)), source);
    }
}

#[test]
fn test_streaming_with_tiny_buffers() {
    let mut source = text(6000);
    source.extend(noise(1500, 11));

    for wrap in [Wrap::Raw, Wrap::Zlib, Wrap::Gzip] {
        let config = DeflateConfig::default().with_wrap(wrap);
        let compressed = deflate_streaming(&source, config, 7, 5);
        let restored = inflate_streaming(&compressed, InflateConfig::new(wrap), 3, 11);
        assert_eq!(restored, source);
        let restored = inflate_streaming(&compressed, InflateConfig::new(wrap), compressed.len(), 1 << 16);
        assert_eq!(restored, source);
    }
}

#[test]
fn test_hello_scenario() {
    let input = b"hello, hello!\0";
    let config = DeflateConfig::default();
    let compressed = block_compress(input, 1 << 16, config);
    assert!(compressed.len() <= bound::max_output_size(14, 1 << 16, &config, None).unwrap());
    assert_eq!(block_decompress(&compressed, 14, InflateConfig::default()), input);
}

#[test]
fn test_empty_input_stored_block() {
    let stored = DeflateConfig::default().with_level(0);

    let raw = block_compress(b"", 1024, stored.with_wrap(Wrap::Raw));
    assert_eq!(raw, [0x01, 0x00, 0x00, 0xFF, 0xFF]);

    let zlib = block_compress(b"", 1024, stored);
    assert_eq!(zlib, [0x78, 0x01, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01]);

    let gzip = block_compress(b"", 1024, stored.with_wrap(Wrap::Gzip));
    assert_eq!(gzip.len(), 10 + 5 + 8);
    assert_eq!(&gzip[10..15], &raw[..]);
    assert_eq!(block_decompress(&gzip, 0, InflateConfig::new(Wrap::Gzip)), b"");
}

#[test]
fn test_deterministic_output() {
    let source = text(30_000);
    for level in [1, 6, 9] {
        let config = DeflateConfig::default().with_level(level);
        assert_eq!(block_compress(&source, 4096, config), block_compress(&source, 4096, config));
    }
}

#[test]
fn test_params_change_keeps_flushed_output() {
    let source = text(8000);
    let (first, second) = source.split_at(3000);

    let config = DeflateConfig::default().with_level(1);
    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, config).unwrap();

    let mut out = vec![0u8; 16_384];
    let mut strm = StreamBuffers::new(first, &mut out);
    assert_eq!(deflater.deflate(&mut strm, Flush::SyncFlush).unwrap(), Status::Ok);
    assert_eq!(strm.consumed(), first.len());
    let flushed = strm.produced();
    let snapshot = out[..flushed].to_vec();

    let mut strm = StreamBuffers::new(&[], &mut out[flushed..]);
    deflater.params(&mut strm, 9, Strategy::Filtered).unwrap();
    let mid = flushed + strm.produced();
    assert_eq!(deflater.level(), 9);
    assert_eq!(deflater.strategy(), Strategy::Filtered);

    let mut strm = StreamBuffers::new(second, &mut out[mid..]);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let total = mid + strm.produced();

    assert_eq!(&out[..flushed], &snapshot[..]);
    assert_eq!(block_decompress(&out[..total], source.len(), InflateConfig::default()), source);
}

#[test]
fn test_partial_flush_makes_input_decodable() {
    let source = text(6000);
    let (first, second) = source.split_at(2500);

    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, DeflateConfig::default()).unwrap();
    let mut out = vec![0u8; bound::compress_bound(source.len())];
    let mut strm = StreamBuffers::new(first, &mut out);
    assert_eq!(deflater.deflate(&mut strm, Flush::PartialFlush).unwrap(), Status::Ok);
    assert_eq!(strm.consumed(), first.len());
    let flushed = strm.produced();

    let mut inflate_work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut inflate_arena = Arena::new(&mut inflate_work);
    let mut inflater = Inflater::new(&mut inflate_arena, InflateConfig::default()).unwrap();
    let mut restored = vec![0u8; source.len()];
    let mut istrm = StreamBuffers::new(&out[..flushed], &mut restored);
    assert_eq!(inflater.inflate(&mut istrm, Flush::NoFlush).unwrap(), Status::Ok);
    assert_eq!(istrm.produced(), first.len());
    assert_eq!(&restored[..first.len()], first);

    let mut strm = StreamBuffers::new(second, &mut out[flushed..]);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let total = flushed + strm.produced();
    assert_eq!(inflate_streaming(&out[..total], InflateConfig::default(), 97, 300), source);
}

#[test]
fn test_tuned_match_finder() {
    let source = text(20_000);
    let compress = |tuning: Option<(usize, usize, usize, usize)>| {
        let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
        let mut arena = Arena::new(&mut work);
        let mut deflater = Deflater::new(&mut arena, DeflateConfig::default()).unwrap();
        if let Some((good, lazy, nice, chain)) = tuning {
            deflater.tune(good, lazy, nice, chain);
        }
        let mut out = vec![0u8; bound::compress_bound(source.len())];
        let mut strm = StreamBuffers::new(&source, &mut out);
        assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
        let len = strm.produced();
        out.truncate(len);
        out
    };

    let default = compress(None);
    let shallow = compress(Some((4, 4, 8, 4)));
    assert_ne!(default, shallow);
    assert_eq!(block_decompress(&default, source.len(), InflateConfig::default()), source);
    assert_eq!(block_decompress(&shallow, source.len(), InflateConfig::default()), source);
}

/// Drive any engine through one slice call.
fn run_codec<C: StreamCodec>(codec: &mut C, input: &[u8], output: &mut [u8]) -> (usize, usize) {
    let (consumed, produced, status) = codec.process_slices(input, output, Flush::Finish).unwrap();
    assert_eq!(status, Status::StreamEnd);
    assert_eq!(codec.info().total_in, consumed as u64);
    assert_eq!(codec.info().total_out, produced as u64);
    (consumed, produced)
}

#[test]
fn test_process_slices_through_both_engines() {
    let source = text(5000);
    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap() + bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, DeflateConfig::default()).unwrap();
    let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();

    let mut compressed = vec![0u8; bound::compress_bound(source.len())];
    let (consumed, len) = run_codec(&mut deflater, &source, &mut compressed);
    assert_eq!(consumed, source.len());

    let mut restored = vec![0u8; source.len()];
    let (consumed, written) = run_codec(&mut inflater, &compressed[..len], &mut restored);
    assert_eq!((consumed, written), (len, source.len()));
    assert_eq!(restored, source);
}

#[test]
fn test_take_header_detaches_sink() {
    let source = text(3000);
    let mut extra = [0u8; 0];
    let mut name = [0u8; 16];
    let mut comment = [0u8; 0];

    let config = DeflateConfig::default().with_wrap(Wrap::Gzip);
    let header = GzipHeader::with_name(b"report.txt");
    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut compressed = vec![0u8; bound::max_output_size(source.len(), 1 << 16, &config, Some(&header)).unwrap()];
    let len = block::compress(&mut compressed, &source, 1 << 16, &mut Arena::new(&mut work), config, Some(header))
        .unwrap();
    compressed.truncate(len);

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Gzip)).unwrap();
    inflater
        .set_header_sink(GzipHeaderSink::new(&mut extra, &mut name, &mut comment))
        .unwrap();
    let mut out = vec![0u8; source.len()];
    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    assert_eq!(out, source);

    let sink = inflater.take_header().unwrap();
    assert!(sink.done);
    assert_eq!(sink.name(), Some(&b"report.txt"[..]));
    assert!(inflater.header().is_none());
    assert!(inflater.take_header().is_none());
}

#[test]
fn test_primed_and_cleared_bits() {
    let source = text(2000);
    let compressed = block_compress(&source, 1 << 16, DeflateConfig::default().with_wrap(Wrap::Raw));
    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut out = vec![0u8; source.len()];

    // The first byte handed over as bits, the rest as input.
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();
    inflater.prime(8, u32::from(compressed[0])).unwrap();
    let mut strm = StreamBuffers::new(&compressed[1..], &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    assert_eq!(out, source);

    // Stray bits dropped before decoding leave the stream intact.
    out.fill(0);
    inflater.reset();
    inflater.prime(5, 0b10101).unwrap();
    inflater.clear_bits();
    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    assert_eq!(out, source);
}

#[test]
fn test_zlib_preset_dictionary() {
    let dictionary = b"quick brown fox jumps over the lazy dogs";
    let source = text(2000);

    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, DeflateConfig::default()).unwrap();
    deflater.set_dictionary(dictionary).unwrap();
    let mut compressed = vec![0u8; bound::compress_bound(source.len())];
    let mut strm = StreamBuffers::new(&source, &mut compressed);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let len = strm.produced();
    compressed.truncate(len);

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
    let mut out = vec![0u8; source.len()];

    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap(), Status::NeedDict);
    assert_eq!(inflater.info().adler, Adler32::compute(dictionary));
    let consumed = strm.consumed();

    assert_eq!(inflater.set_dictionary(b"wrong"), Err(FlateError::data("incorrect dictionary")));
    inflater.set_dictionary(dictionary).unwrap();

    let mut strm = StreamBuffers::new(&compressed[consumed..], &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    assert_eq!(strm.produced(), source.len());
    assert_eq!(out, source);
}

#[test]
fn test_block_stop_right_after_dictionary_makes_no_progress() {
    let dictionary = b"hello, hello, hello";
    let source = b"hello, hello! hello, world!".repeat(20);

    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, DeflateConfig::default()).unwrap();
    deflater.set_dictionary(dictionary).unwrap();
    let mut compressed = vec![0u8; bound::compress_bound(source.len())];
    let mut strm = StreamBuffers::new(&source, &mut compressed);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let len = strm.produced();
    compressed.truncate(len);

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
    let mut out = vec![0u8; source.len()];

    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Block).unwrap(), Status::NeedDict);
    let mut in_pos = strm.consumed();
    inflater.set_dictionary(dictionary).unwrap();

    // Stops at the block boundary it is already at.
    let mut strm = StreamBuffers::new(&compressed[in_pos..], &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Block), Err(FlateError::Buffer));
    assert_eq!(strm.consumed(), 0);

    let mut out_pos = 0;
    loop {
        let mut strm = StreamBuffers::new(&compressed[in_pos..], &mut out[out_pos..]);
        let status = inflater.inflate(&mut strm, Flush::Block).unwrap();
        in_pos += strm.consumed();
        out_pos += strm.produced();
        if status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(out, source);
}

#[test]
fn test_raw_dictionary() {
    let dictionary = text(500);
    let source = text(1500);
    let config = DeflateConfig::default().with_wrap(Wrap::Raw);

    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut deflater = Deflater::new(&mut arena, config).unwrap();
    deflater.set_dictionary(&dictionary).unwrap();
    let mut compressed = vec![0u8; bound::compress_bound(source.len())];
    let mut strm = StreamBuffers::new(&source, &mut compressed);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let len = strm.produced();
    compressed.truncate(len);

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();
    inflater.set_dictionary(&dictionary).unwrap();
    let mut out = vec![0u8; source.len()];
    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    assert_eq!(out, source);
}

#[test]
fn test_gzip_header_round_trip() {
    let source = text(4000);
    let header = GzipHeader {
        text: true,
        mtime: 1_700_000_000,
        os: 3,
        extra: Some(b"\x41\x70\x02\x00hi"),
        name: Some(b"notes.txt"),
        comment: Some(b"weekly notes"),
        hcrc: true,
    };
    let config = DeflateConfig::default().with_wrap(Wrap::Gzip);

    let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
    let mut compressed = vec![0u8; bound::max_output_size(source.len(), 1024, &config, Some(&header)).unwrap()];
    let len = block::compress(&mut compressed, &source, 1024, &mut Arena::new(&mut work), config, Some(header))
        .unwrap();
    compressed.truncate(len);

    let mut extra = [0u8; 16];
    let mut name = [0u8; 4];
    let mut comment = [0u8; 64];
    let mut sink = GzipHeaderSink::new(&mut extra, &mut name, &mut comment);

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut out = vec![0u8; source.len()];
    let done = block::decompress(
        &mut out,
        &compressed,
        &mut Arena::new(&mut work),
        InflateConfig::new(Wrap::Auto),
        Some(&mut sink),
    )
    .unwrap();
    assert_eq!(done.written, source.len());
    assert_eq!(out, source);

    assert!(sink.done);
    assert!(sink.text);
    assert!(sink.hcrc);
    assert_eq!(sink.mtime, 1_700_000_000);
    assert_eq!(sink.os, 3);
    assert_eq!(sink.extra(), Some(&b"\x41\x70\x02\x00hi"[..]));
    assert_eq!(sink.extra_len(), 6);
    assert_eq!(sink.name(), Some(&b"note"[..]));
    assert_eq!(sink.comment(), Some(&b"weekly notes"[..]));
    assert_eq!(sink.truncated(), [0, 5, 0]);
}

#[test]
fn test_header_sink_needs_gzip() {
    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
    let (mut a, mut b, mut c) = ([0u8; 1], [0u8; 1], [0u8; 1]);
    let sink = GzipHeaderSink::new(&mut a, &mut b, &mut c);
    assert!(matches!(inflater.set_header_sink(sink), Err(FlateError::Stream { .. })));
}

#[test]
fn test_corrupted_check_value() {
    let source = text(1000);
    let mut compressed = block_compress(&source, 1 << 16, DeflateConfig::default());
    let last = compressed.len() - 1;
    compressed[last] ^= 0x55;

    let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
    let mut arena = Arena::new(&mut work);
    let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
    let mut out = vec![0u8; source.len()];
    let mut strm = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(
        inflater.inflate(&mut strm, Flush::Finish),
        Err(FlateError::data("incorrect data check"))
    );
    assert_eq!(inflater.msg(), Some("incorrect data check"));
    // All data was decoded before the trailer was read.
    assert_eq!(out, source);
}
