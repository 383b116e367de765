//! Stream configuration for the compressor and the decompressor.

use oxiflate_core::error::{FlateError, Result};
use oxiflate_core::flush::CompressionLevel;

/// Smallest window accepted by the decompressor.
pub const MIN_WBITS: u8 = 8;

/// Largest window (32 KiB).
pub const MAX_WBITS: u8 = 15;

/// Largest memory level.
pub const MAX_MEM_LEVEL: u8 = 9;

/// Default memory level (hash table of 2^15 entries).
pub const DEF_MEM_LEVEL: u8 = 8;

/// Outer framing around the raw DEFLATE bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    /// Bare DEFLATE data, no header or trailer.
    Raw,
    /// 2-byte header and Adler-32 trailer (RFC 1950).
    #[default]
    Zlib,
    /// 10+ byte header and CRC-32 / ISIZE trailer (RFC 1952).
    Gzip,
    /// Decompression only: accept either zlib or gzip, detected from the
    /// first two bytes.
    Auto,
}

/// Match-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Level-driven greedy or lazy matching.
    #[default]
    Default,
    /// Lazy matching that discards short matches, for filtered data with
    /// small values and a random distribution.
    Filtered,
    /// Literals only, no string matching.
    HuffmanOnly,
    /// Matches of distance one only.
    Rle,
    /// Never use dynamic Huffman trees.
    Fixed,
}

/// Which block compressor a level uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchFn {
    /// Copy input verbatim into stored blocks.
    Stored,
    /// Greedy matching with limited insertion.
    Fast,
    /// Lazy evaluation of matches.
    Slow,
}

/// Per-level tuning of the match finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelConfig {
    /// Reduce lazy search above this match length.
    pub good_length: u16,
    /// Fast: do not insert strings longer than this. Slow: do not try a
    /// lazy match when the current one is at least this long.
    pub max_lazy: u16,
    /// Quit the search above this match length.
    pub nice_length: u16,
    /// Hash chain links followed at most.
    pub max_chain: u16,
    /// Block compressor.
    pub func: MatchFn,
}

impl LevelConfig {
    const fn new(good: u16, lazy: u16, nice: u16, chain: u16, func: MatchFn) -> Self {
        Self {
            good_length: good,
            max_lazy: lazy,
            nice_length: nice,
            max_chain: chain,
            func,
        }
    }
}

/// Tuning table indexed by compression level.
pub(crate) const CONFIGURATION_TABLE: [LevelConfig; 10] = [
    LevelConfig::new(0, 0, 0, 0, MatchFn::Stored),
    LevelConfig::new(4, 4, 8, 4, MatchFn::Fast),
    LevelConfig::new(4, 5, 16, 8, MatchFn::Fast),
    LevelConfig::new(4, 6, 32, 32, MatchFn::Fast),
    LevelConfig::new(4, 4, 16, 16, MatchFn::Slow),
    LevelConfig::new(8, 16, 32, 32, MatchFn::Slow),
    LevelConfig::new(8, 16, 128, 128, MatchFn::Slow),
    LevelConfig::new(8, 32, 128, 256, MatchFn::Slow),
    LevelConfig::new(32, 128, 258, 1024, MatchFn::Slow),
    LevelConfig::new(32, 258, 258, 4096, MatchFn::Slow),
];

/// Compressor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateConfig {
    /// Compression level (0-9).
    pub level: u8,
    /// Base two logarithm of the window size (9-15, or 8 with zlib wrapping).
    pub window_bits: u8,
    /// Memory level (1-9): the hash table has 2^(mem_level + 7) entries and
    /// the symbol buffer 2^(mem_level + 6).
    pub mem_level: u8,
    /// Match-finding strategy.
    pub strategy: Strategy,
    /// Outer framing. [`Wrap::Auto`] is rejected.
    pub wrap: Wrap,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::DEFAULT.level(),
            window_bits: MAX_WBITS,
            mem_level: DEF_MEM_LEVEL,
            strategy: Strategy::Default,
            wrap: Wrap::Zlib,
        }
    }
}

impl DeflateConfig {
    /// Default configuration at the given level.
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level: level.level(),
            ..Self::default()
        }
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Set the window size.
    pub fn with_window_bits(mut self, window_bits: u8) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Set the memory level.
    pub fn with_mem_level(mut self, mem_level: u8) -> Self {
        self.mem_level = mem_level;
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the framing.
    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Check the parameters and return the effective configuration.
    ///
    /// A window of 2^8 is only representable with zlib framing and is
    /// silently widened to 2^9 there.
    pub fn validate(&self) -> Result<Self> {
        if self.level > 9 {
            return Err(FlateError::config("compression level must be 0-9"));
        }
        if self.mem_level < 1 || self.mem_level > MAX_MEM_LEVEL {
            return Err(FlateError::config("memory level must be 1-9"));
        }
        if self.wrap == Wrap::Auto {
            return Err(FlateError::config("compressor needs an explicit wrap"));
        }
        if self.window_bits < MIN_WBITS
            || self.window_bits > MAX_WBITS
            || (self.window_bits == MIN_WBITS && self.wrap != Wrap::Zlib)
        {
            return Err(FlateError::config("window bits must be 9-15"));
        }

        let mut effective = *self;
        if effective.window_bits == MIN_WBITS {
            effective.window_bits = MIN_WBITS + 1;
        }
        Ok(effective)
    }
}

/// Decompressor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateConfig {
    /// Base two logarithm of the window size (8-15). Must be at least the
    /// window used to compress.
    pub window_bits: u8,
    /// Expected framing.
    pub wrap: Wrap,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            window_bits: MAX_WBITS,
            wrap: Wrap::Zlib,
        }
    }
}

impl InflateConfig {
    /// Configuration for the given framing and the largest window.
    pub fn new(wrap: Wrap) -> Self {
        Self {
            wrap,
            ..Self::default()
        }
    }

    /// Set the window size.
    pub fn with_window_bits(mut self, window_bits: u8) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<Self> {
        if self.window_bits < MIN_WBITS || self.window_bits > MAX_WBITS {
            return Err(FlateError::config("window bits must be 8-15"));
        }
        Ok(*self)
    }
}
