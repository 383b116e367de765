//! Running checksums used by the stream wrappers.
//!
//! The engine treats checksums as opaque collaborators: it only ever calls
//! [`Checksum::update`] with the value it carried from the previous call and
//! stores the result. Two families are provided:
//!
//! - [`Adler32`]: the additive checksum trailing zlib streams (RFC 1950)
//! - [`Crc32`]: the ISO 3309 CRC trailing gzip members (RFC 1952)
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::checksum::{Adler32, Checksum, Crc32};
//!
//! let adler = Adler32::update(Adler32::IDENTITY, b"Wikipedia");
//! assert_eq!(adler, 0x11E6_0398);
//!
//! // Incremental updates compose
//! let crc = Crc32::update(Crc32::IDENTITY, b"Hello, ");
//! let crc = Crc32::update(crc, b"World!");
//! assert_eq!(crc, 0xEC4A_C3D0);
//! ```

/// A checksum that can be carried across calls as a plain `u32`.
pub trait Checksum {
    /// Value of the checksum over empty input.
    const IDENTITY: u32;

    /// Fold `buf` into the running value `prior`.
    fn update(prior: u32, buf: &[u8]) -> u32;

    /// Checksum of `buf` starting from [`Checksum::IDENTITY`].
    fn compute(buf: &[u8]) -> u32 {
        Self::update(Self::IDENTITY, buf)
    }
}

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(ADLER_MOD-1) fits in 32 bits.
const NMAX: usize = 5552;

/// Adler-32 checksum (zlib wrapping).
///
/// The high half of the value holds the running sum of sums, the low half
/// the running byte sum, both modulo 65521.
#[derive(Debug, Clone, Copy)]
pub struct Adler32;

impl Checksum for Adler32 {
    const IDENTITY: u32 = 1;

    fn update(prior: u32, buf: &[u8]) -> u32 {
        let mut a = (prior & 0xFFFF) % ADLER_MOD;
        let mut b = (prior >> 16) % ADLER_MOD;

        for chunk in buf.chunks(NMAX) {
            for &byte in chunk {
                a += u32::from(byte);
                b += a;
            }
            a %= ADLER_MOD;
            b %= ADLER_MOD;
        }

        (b << 16) | a
    }
}

/// CRC-32 slicing-by-8 tables (polynomial 0xEDB88320, reflected).
///
/// Table 0 is the classic byte-at-a-time table.
const CRC32_TABLES: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// CRC-32 checksum (gzip wrapping).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Pre/post conditioning with 0xFFFFFFFF, so the identity value is 0
#[derive(Debug, Clone, Copy)]
pub struct Crc32;

impl Crc32 {
    /// Byte-at-a-time update of a conditioned register.
    #[inline]
    fn update_bytes(mut c: u32, data: &[u8]) -> u32 {
        for &byte in data {
            c = CRC32_TABLES[0][((c ^ u32::from(byte)) & 0xFF) as usize] ^ (c >> 8);
        }
        c
    }

    /// Slicing-by-8 update of a conditioned register.
    #[inline]
    fn update_slice8(mut c: u32, data: &[u8]) -> u32 {
        let mut words = data.chunks_exact(8);
        for bytes in &mut words {
            let x = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            c = CRC32_TABLES[7][(x & 0xFF) as usize]
                ^ CRC32_TABLES[6][((x >> 8) & 0xFF) as usize]
                ^ CRC32_TABLES[5][((x >> 16) & 0xFF) as usize]
                ^ CRC32_TABLES[4][(x >> 24) as usize]
                ^ CRC32_TABLES[3][bytes[4] as usize]
                ^ CRC32_TABLES[2][bytes[5] as usize]
                ^ CRC32_TABLES[1][bytes[6] as usize]
                ^ CRC32_TABLES[0][bytes[7] as usize];
        }
        Self::update_bytes(c, words.remainder())
    }
}

impl Checksum for Crc32 {
    const IDENTITY: u32 = 0;

    fn update(prior: u32, buf: &[u8]) -> u32 {
        let c = !prior;
        let c = if buf.len() >= 16 {
            Self::update_slice8(c, buf)
        } else {
            Self::update_bytes(c, buf)
        };
        !c
    }
}
