//! Code tables shared by the compressor and the decompressor (RFC 1951).
//!
//! Everything here is computed at compile time. The static literal/length
//! and distance trees carry their canonical codes already bit-reversed, since
//! DEFLATE transmits Huffman codes starting from the least significant bit.

use oxiflate_core::arena::ArenaItem;

/// Number of length codes, not counting the special END_BLOCK code.
pub const LENGTH_CODES: usize = 29;

/// Number of literal bytes 0..255.
pub const LITERALS: usize = 256;

/// Number of literal/length codes, including END_BLOCK.
pub const L_CODES: usize = LITERALS + 1 + LENGTH_CODES;

/// Number of distance codes.
pub const D_CODES: usize = 30;

/// Number of codes used to transfer the bit lengths.
pub const BL_CODES: usize = 19;

/// Maximum heap size.
pub const HEAP_SIZE: usize = 2 * L_CODES + 1;

/// All codes must not exceed this many bits.
pub const MAX_BITS: usize = 15;

/// Bit length codes must not exceed this many bits.
pub const MAX_BL_BITS: usize = 7;

/// End of block literal code.
pub const END_BLOCK: usize = 256;

/// Repeat previous bit length 3-6 times (2 bits of repeat count).
pub const REP_3_6: usize = 16;

/// Repeat a zero length 3-10 times (3 bits of repeat count).
pub const REPZ_3_10: usize = 17;

/// Repeat a zero length 11-138 times (7 bits of repeat count).
pub const REPZ_11_138: usize = 18;

/// Shortest match that is emitted as a back-reference.
pub const MIN_MATCH: usize = 3;

/// Longest match DEFLATE can express.
pub const MAX_MATCH: usize = 258;

/// Minimum amount of lookahead, except at the end of the input.
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Largest stored block payload.
pub const MAX_STORED: usize = 65535;

/// Block type: stored.
pub const STORED_BLOCK: u32 = 0;

/// Block type: fixed Huffman codes.
pub const STATIC_TREES: u32 = 1;

/// Block type: dynamic Huffman codes.
pub const DYN_TREES: u32 = 2;

/// Extra bits for each length code.
pub const EXTRA_LBITS: [u8; LENGTH_CODES] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Extra bits for each distance code.
pub const EXTRA_DBITS: [u8; D_CODES] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Extra bits for each bit length code.
pub const EXTRA_BLBITS: [u8; BL_CODES] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

/// Order in which the bit length code lengths are transmitted.
pub const BL_ORDER: [usize; BL_CODES] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// One node of a Huffman tree under construction.
///
/// `freq` and `dad` are only meaningful while the tree is being built;
/// `code` and `len` are filled in afterwards.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Symbol frequency in the current block.
    pub freq: u16,
    /// Bit-reversed code.
    pub code: u16,
    /// Parent node during construction.
    pub dad: u16,
    /// Code length in bits.
    pub len: u16,
}

// SAFETY: four u16 fields in a repr(C) struct, no padding, any bit pattern valid.
unsafe impl ArenaItem for TreeNode {}

impl TreeNode {
    const fn with_code(code: u16, len: u16) -> Self {
        Self {
            freq: 0,
            code,
            dad: 0,
            len,
        }
    }
}

/// Reverse the low `len` bits of `code`.
pub const fn bi_reverse(mut code: u32, mut len: u32) -> u32 {
    let mut res = 0;
    loop {
        res |= code & 1;
        code >>= 1;
        res <<= 1;
        len -= 1;
        if len == 0 {
            break;
        }
    }
    res >> 1
}

struct CodeTables {
    length_code: [u8; MAX_MATCH - MIN_MATCH + 1],
    dist_code: [u8; 512],
    base_length: [u8; LENGTH_CODES],
    base_dist: [u16; D_CODES],
}

const CODE_TABLES: CodeTables = {
    let mut t = CodeTables {
        length_code: [0; MAX_MATCH - MIN_MATCH + 1],
        dist_code: [0; 512],
        base_length: [0; LENGTH_CODES],
        base_dist: [0; D_CODES],
    };

    let mut length = 0usize;
    let mut code = 0usize;
    while code < LENGTH_CODES - 1 {
        t.base_length[code] = length as u8;
        let mut n = 0;
        while n < (1 << EXTRA_LBITS[code]) {
            t.length_code[length] = code as u8;
            length += 1;
            n += 1;
        }
        code += 1;
    }
    // Length 258 has its own code rather than 227 + 31.
    t.length_code[length - 1] = code as u8;

    let mut dist = 0usize;
    code = 0;
    while code < 16 {
        t.base_dist[code] = dist as u16;
        let mut n = 0;
        while n < (1 << EXTRA_DBITS[code]) {
            t.dist_code[dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    dist >>= 7;
    while code < D_CODES {
        t.base_dist[code] = (dist << 7) as u16;
        let mut n = 0;
        while n < (1 << (EXTRA_DBITS[code] - 7)) {
            t.dist_code[256 + dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }

    t
};

/// Length code for each match length minus [`MIN_MATCH`].
pub const LENGTH_CODE: [u8; MAX_MATCH - MIN_MATCH + 1] = CODE_TABLES.length_code;

/// Distance codes: the first 256 entries index distances 0..255, the last
/// 256 index the top bits of distances 256..32767.
pub const DIST_CODE: [u8; 512] = CODE_TABLES.dist_code;

/// First normalized length (length minus [`MIN_MATCH`]) for each code.
pub const BASE_LENGTH: [u8; LENGTH_CODES] = CODE_TABLES.base_length;

/// First normalized distance (distance minus one) for each code.
pub const BASE_DIST: [u16; D_CODES] = CODE_TABLES.base_dist;

/// Distance code for a normalized distance (distance minus one).
#[inline]
pub const fn d_code(dist: usize) -> usize {
    if dist < 256 {
        DIST_CODE[dist] as usize
    } else {
        DIST_CODE[256 + (dist >> 7)] as usize
    }
}

/// The fixed literal/length tree (RFC 1951 section 3.2.6). Codes 286 and
/// 287 take part in code construction but never occur in data.
pub const STATIC_LTREE: [TreeNode; L_CODES + 2] = {
    let mut lens = [0u16; L_CODES + 2];
    let mut bl_count = [0u16; MAX_BITS + 1];
    let mut n = 0;
    while n < L_CODES + 2 {
        let len = if n <= 143 {
            8
        } else if n <= 255 {
            9
        } else if n <= 279 {
            7
        } else {
            8
        };
        lens[n] = len;
        bl_count[len as usize] += 1;
        n += 1;
    }

    let mut next_code = [0u16; MAX_BITS + 1];
    let mut code = 0u16;
    let mut bits = 1;
    while bits <= MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
        bits += 1;
    }

    let mut tree = [TreeNode::with_code(0, 0); L_CODES + 2];
    n = 0;
    while n < L_CODES + 2 {
        let len = lens[n];
        let c = next_code[len as usize];
        next_code[len as usize] += 1;
        tree[n] = TreeNode::with_code(bi_reverse(c as u32, len as u32) as u16, len);
        n += 1;
    }
    tree
};

/// The fixed distance tree: every code is 5 bits.
pub const STATIC_DTREE: [TreeNode; D_CODES] = {
    let mut tree = [TreeNode::with_code(0, 0); D_CODES];
    let mut n = 0;
    while n < D_CODES {
        tree[n] = TreeNode::with_code(bi_reverse(n as u32, 5) as u16, 5);
        n += 1;
    }
    tree
};

/// Length base values for codes 257..285 as seen by the decoder.
pub const LENGTH_BASE: [u16; LENGTH_CODES] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Distance base values for codes 0..29 as seen by the decoder.
pub const DISTANCE_BASE: [u16; D_CODES] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
