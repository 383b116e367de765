//! Throughput benchmarks for the stream checksums
//!
//! Covers:
//! - Adler-32 and CRC-32 across data sizes
//! - Sensitivity to data patterns
//! - Incremental updates in small pieces vs one call

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiflate_core::checksum::{Adler32, Checksum, Crc32};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// All bytes the same
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0x5A; size]
    }

    /// Reproducible pseudo-random bytes
    pub fn random(size: usize) -> Vec<u8> {
        let mut seed: u64 = 0x123456789ABCDEF0;
        (0..size)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 32) as u8
            })
            .collect()
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"Pack my box with five dozen liquor jugs. ";
        text.iter().copied().cycle().take(size).collect()
    }
}

mod data_sizes {
    pub const TINY: usize = 15; // below the slice-by-8 threshold
    pub const SMALL: usize = 256;
    pub const MEDIUM: usize = 4 * 1024;
    pub const LARGE: usize = 64 * 1024;
    pub const XLARGE: usize = 1024 * 1024;
}

const SIZES: [(&str, usize); 5] = [
    ("15B", data_sizes::TINY),
    ("256B", data_sizes::SMALL),
    ("4KB", data_sizes::MEDIUM),
    ("64KB", data_sizes::LARGE),
    ("1MB", data_sizes::XLARGE),
];

fn bench_sizes<C: Checksum>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(name);

    for (size_name, size) in SIZES {
        let data = test_data::text_like(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| black_box(C::compute(black_box(data))));
        });
    }

    group.finish();
}

/// Benchmark Adler-32 across different data sizes
fn bench_adler32_sizes(c: &mut Criterion) {
    bench_sizes::<Adler32>(c, "adler32_sizes");
}

/// Benchmark CRC-32 across different data sizes
fn bench_crc32_sizes(c: &mut Criterion) {
    bench_sizes::<Crc32>(c, "crc32_sizes");
}

/// Benchmark both checksums over different data patterns
fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_patterns");

    let patterns: [(&str, PatternGenerator); 3] = [
        ("uniform", test_data::uniform as PatternGenerator),
        ("random", test_data::random as PatternGenerator),
        ("text", test_data::text_like as PatternGenerator),
    ];

    let size = data_sizes::LARGE;

    for (pattern_name, generator) in patterns {
        let data = generator(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("adler32", pattern_name), &data, |b, data| {
            b.iter(|| black_box(Adler32::compute(black_box(data))));
        });
        group.bench_with_input(BenchmarkId::new("crc32", pattern_name), &data, |b, data| {
            b.iter(|| black_box(Crc32::compute(black_box(data))));
        });
    }

    group.finish();
}

/// Benchmark feeding data in pieces, as the engines do per call
fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_incremental");

    let data = test_data::random(data_sizes::LARGE);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for piece in [64usize, 1024, 16 * 1024] {
        group.bench_with_input(BenchmarkId::new("crc32", piece), &data, |b, data| {
            b.iter(|| {
                let crc = data
                    .chunks(piece)
                    .fold(Crc32::IDENTITY, |crc, chunk| Crc32::update(crc, black_box(chunk)));
                black_box(crc)
            });
        });
        group.bench_with_input(BenchmarkId::new("adler32", piece), &data, |b, data| {
            b.iter(|| {
                let adler = data
                    .chunks(piece)
                    .fold(Adler32::IDENTITY, |adler, chunk| Adler32::update(adler, black_box(chunk)));
                black_box(adler)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_adler32_sizes,
    bench_crc32_sizes,
    bench_patterns,
    bench_incremental
);
criterion_main!(benches);
