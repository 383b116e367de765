//! Flush directives, call outcomes and level vocabulary shared by the
//! compressor and the decompressor.

/// Flush directive passed with every streaming call.
///
/// The variants are ordered by "strength"; see [`Flush::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Flush {
    /// Buffer freely for best compression.
    #[default]
    NoFlush,
    /// Emit all complete symbols; the last partial byte may be held back.
    PartialFlush,
    /// Emit everything and byte-align with an empty stored block.
    SyncFlush,
    /// As `SyncFlush`, and forget all history so that decoding can restart
    /// at the following byte.
    FullFlush,
    /// Terminate the stream. Must be repeated until the stream end is
    /// reported; no input may be added afterwards.
    Finish,
    /// Compress: finish the current block without aligning.
    /// Decompress: stop at the next block boundary.
    Block,
    /// Decompress only: stop at the next block boundary, and also right
    /// after a dynamic block header has been decoded.
    Trees,
}

impl Flush {
    /// Strength ordering used to detect repeated flushes: the block-boundary
    /// flushes rank just above `NoFlush` and `PartialFlush` respectively,
    /// the others by their declaration order.
    pub const fn rank(self) -> u8 {
        match self {
            Self::NoFlush => 0,
            Self::PartialFlush => 2,
            Self::SyncFlush => 4,
            Self::FullFlush => 6,
            Self::Finish => 8,
            Self::Block => 1,
            Self::Trees => 3,
        }
    }
}

/// Successful outcome of a streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made; call again with more input or output space.
    Ok,
    /// The whole stream (including its trailer) has been processed.
    StreamEnd,
    /// Decompression needs the preset dictionary announced in the header.
    NeedDict,
}

/// Best guess of the uncompressed content type, taken from the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Contains control characters outside the usual text set.
    Binary,
    /// Printable text with the usual whitespace controls.
    Text,
    /// Not determined yet.
    #[default]
    Unknown,
}

/// Compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Stored blocks only.
    pub const NONE: Self = Self(0);
    /// Fastest matching.
    pub const FAST: Self = Self(1);
    /// Default trade-off.
    pub const DEFAULT: Self = Self(6);
    /// Best compression.
    pub const BEST: Self = Self(9);

    /// Create a level, clamped to 9.
    pub const fn new(level: u8) -> Self {
        if level > 9 { Self(9) } else { Self(level) }
    }

    /// Numeric level.
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_rank_order() {
        assert!(Flush::NoFlush.rank() < Flush::Block.rank());
        assert!(Flush::Block.rank() < Flush::PartialFlush.rank());
        assert!(Flush::PartialFlush.rank() < Flush::SyncFlush.rank());
        assert!(Flush::SyncFlush.rank() < Flush::FullFlush.rank());
        assert!(Flush::FullFlush.rank() < Flush::Finish.rank());
    }

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::new(12).level(), 9);
        assert_eq!(CompressionLevel::default().level(), 6);
        assert_eq!(CompressionLevel::from(3), CompressionLevel::new(3));
    }
}
