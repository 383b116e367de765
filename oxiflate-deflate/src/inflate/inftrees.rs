//! Decoding tables for canonical Huffman codes.
//!
//! A table is indexed by the next `root` bits of input, low bit first. Codes
//! no longer than `root` fill every entry that shares their prefix; longer
//! codes are reached through a link entry that points at a sub-table indexed
//! by the bits after the root.
//!
//! Each [`Code`] entry is interpreted through its `op` byte:
//!
//! ```text
//! 0000 0000  literal, val is the byte
//! 0001 eeee  length or distance base in val, eeee extra bits follow
//! 0000 tttt  link (tttt != 0): sub-table of 2^tttt entries at val
//! 0110 0000  end of block
//! 0100 0000  invalid code
//! ```

use crate::tables::{
    BL_CODES, D_CODES, DISTANCE_BASE, EXTRA_DBITS, EXTRA_LBITS, LENGTH_BASE, LENGTH_CODES, MAX_BITS,
    bi_reverse,
};
use oxiflate_core::arena::ArenaItem;

/// Table entries needed in the worst case for 286 literal/length codes with
/// a 9-bit root.
pub(crate) const ENOUGH_LENS: usize = 852;

/// Table entries needed in the worst case for 30 distance codes with a 6-bit
/// root.
pub(crate) const ENOUGH_DISTS: usize = 592;

/// Table space shared by the literal/length and distance tables of one block.
pub(crate) const ENOUGH: usize = ENOUGH_LENS + ENOUGH_DISTS;

/// Root bits requested for literal/length tables.
pub(crate) const LEN_ROOT: u32 = 9;

/// Root bits requested for distance tables.
pub(crate) const DIST_ROOT: u32 = 6;

/// Root bits for the code length code.
pub(crate) const CODES_ROOT: u32 = 7;

pub(crate) const OP_LITERAL: u8 = 0;
pub(crate) const OP_BASE: u8 = 16;
pub(crate) const OP_END: u8 = 32;
pub(crate) const OP_INVALID: u8 = 64;

/// One decoding table entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Code {
    /// Operation, see the module docs.
    pub op: u8,
    /// Bits consumed by this entry.
    pub bits: u8,
    /// Literal, base value or sub-table offset.
    pub val: u16,
}

// SAFETY: two u8 and one u16 in a repr(C) struct, no padding, any bit
// pattern valid.
unsafe impl ArenaItem for Code {}

impl Code {
    const fn new(op: u8, bits: u8, val: u16) -> Self {
        Self { op, bits, val }
    }
}

/// Which alphabet a table decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeKind {
    /// The code length code of a dynamic block header.
    Codes,
    /// Literal/length codes.
    Lens,
    /// Distance codes.
    Dists,
}

/// Length op bytes for codes 257..287; the last two never occur in valid
/// data.
const LENGTH_OPS: [u8; LENGTH_CODES + 2] = {
    let mut ops = [OP_INVALID; LENGTH_CODES + 2];
    let mut i = 0;
    while i < LENGTH_CODES {
        ops[i] = OP_BASE + EXTRA_LBITS[i];
        i += 1;
    }
    ops
};

const LENGTH_VALS: [u16; LENGTH_CODES + 2] = {
    let mut vals = [0u16; LENGTH_CODES + 2];
    let mut i = 0;
    while i < LENGTH_CODES {
        vals[i] = LENGTH_BASE[i];
        i += 1;
    }
    vals
};

/// Distance op bytes for codes 0..31; codes 30 and 31 are invalid.
const DIST_OPS: [u8; D_CODES + 2] = {
    let mut ops = [OP_INVALID; D_CODES + 2];
    let mut i = 0;
    while i < D_CODES {
        ops[i] = OP_BASE + EXTRA_DBITS[i];
        i += 1;
    }
    ops
};

const DIST_VALS: [u16; D_CODES + 2] = {
    let mut vals = [0u16; D_CODES + 2];
    let mut i = 0;
    while i < D_CODES {
        vals[i] = DISTANCE_BASE[i];
        i += 1;
    }
    vals
};

/// Fixed literal/length table, 9 root bits.
pub(crate) const LENFIX: [Code; 512] = {
    let mut table = [Code::new(0, 0, 0); 512];
    let mut sym = 0usize;
    while sym < 288 {
        let (len, code) = if sym < 144 {
            (8, 0x30 + sym)
        } else if sym < 256 {
            (9, 0x190 + sym - 144)
        } else if sym < 280 {
            (7, sym - 256)
        } else {
            (8, 0xC0 + sym - 280)
        };
        let here = if sym < 256 {
            Code::new(OP_LITERAL, len as u8, sym as u16)
        } else if sym == 256 {
            Code::new(OP_END | OP_INVALID, len as u8, 0)
        } else {
            Code::new(LENGTH_OPS[sym - 257], len as u8, LENGTH_VALS[sym - 257])
        };
        let mut fill = bi_reverse(code as u32, len) as usize;
        while fill < 512 {
            table[fill] = here;
            fill += 1 << len;
        }
        sym += 1;
    }
    table
};

/// Fixed distance table, 5 root bits.
pub(crate) const DISTFIX: [Code; 32] = {
    let mut table = [Code::new(0, 0, 0); 32];
    let mut sym = 0usize;
    while sym < 32 {
        table[bi_reverse(sym as u32, 5) as usize] = Code::new(DIST_OPS[sym], 5, DIST_VALS[sym]);
        sym += 1;
    }
    table
};

/// Build a decoding table for the code lengths `lens` into `table`.
///
/// `root` is the requested number of root bits. `work` is scratch space of
/// at least `lens.len()` entries. Returns the number of entries used and the
/// root bits actually chosen, or `None` when the lengths are over-subscribed
/// or incomplete. A single distance code, or a set of only length-one
/// codes, is accepted as incomplete, and an empty set builds a table that
/// rejects every input.
pub(crate) fn build_table(
    kind: CodeKind,
    lens: &[u16],
    table: &mut [Code],
    root: u32,
    work: &mut [u16],
) -> Option<(usize, u32)> {
    let mut count = [0u16; MAX_BITS + 1];
    for &len in lens {
        count[usize::from(len)] += 1;
    }

    let mut max = MAX_BITS as u32;
    while max >= 1 && count[max as usize] == 0 {
        max -= 1;
    }
    let mut root = root.min(max);
    if max == 0 {
        let invalid = Code::new(OP_INVALID, 1, 0);
        table[0] = invalid;
        table[1] = invalid;
        return Some((2, 1));
    }
    let mut min = 1;
    while min < max && count[min as usize] == 0 {
        min += 1;
    }
    root = root.max(min);

    let mut left: i32 = 1;
    for &n in &count[1..=MAX_BITS] {
        left <<= 1;
        left -= i32::from(n);
        if left < 0 {
            return None;
        }
    }
    if left > 0 && (kind == CodeKind::Codes || max != 1) {
        return None;
    }

    // Sort symbols by length, then by symbol.
    let mut offs = [0u16; MAX_BITS + 1];
    for len in 1..MAX_BITS {
        offs[len + 1] = offs[len] + count[len];
    }
    for (sym, &len) in lens.iter().enumerate() {
        if len != 0 {
            let slot = &mut offs[usize::from(len)];
            work[usize::from(*slot)] = sym as u16;
            *slot += 1;
        }
    }

    let (ops, vals, first_base): (&[u8], &[u16], usize) = match kind {
        CodeKind::Codes => (&[], &[], BL_CODES + 1),
        CodeKind::Lens => (&LENGTH_OPS, &LENGTH_VALS, 257),
        CodeKind::Dists => (&DIST_OPS, &DIST_VALS, 0),
    };

    let mut huff: u32 = 0;
    let mut sym = 0usize;
    let mut len = min;
    let mut next = 0usize;
    let mut curr = root;
    let mut drop = 0u32;
    let mut low = u32::MAX;
    let mut used = 1usize << root;
    let mask = (1u32 << root) - 1;

    let over = |used: usize| {
        (kind == CodeKind::Lens && used > ENOUGH_LENS) || (kind == CodeKind::Dists && used > ENOUGH_DISTS)
    };
    if over(used) {
        return None;
    }

    loop {
        let bits = (len - drop) as u8;
        let symbol = usize::from(work[sym]);
        let here = if symbol + 1 < first_base {
            Code::new(OP_LITERAL, bits, symbol as u16)
        } else if symbol >= first_base {
            Code::new(ops[symbol - first_base], bits, vals[symbol - first_base])
        } else {
            Code::new(OP_END | OP_INVALID, bits, 0)
        };

        // Replicate for every index that ends in this code.
        let incr = 1u32 << (len - drop);
        let mut fill = 1u32 << curr;
        let span = fill as usize;
        loop {
            fill -= incr;
            table[next + ((huff >> drop) + fill) as usize] = here;
            if fill == 0 {
                break;
            }
        }

        // Increment the bit-reversed code.
        let mut incr = 1u32 << (len - 1);
        while huff & incr != 0 {
            incr >>= 1;
        }
        if incr != 0 {
            huff &= incr - 1;
            huff += incr;
        } else {
            huff = 0;
        }

        sym += 1;
        count[len as usize] -= 1;
        if count[len as usize] == 0 {
            if len == max {
                break;
            }
            len = u32::from(lens[usize::from(work[sym])]);
        }

        if len > root && (huff & mask) != low {
            if drop == 0 {
                drop = root;
            }
            next += span;

            // Grow the sub-table until it is full.
            curr = len - drop;
            let mut left: i32 = 1 << curr;
            while curr + drop < max {
                left -= i32::from(count[(curr + drop) as usize]);
                if left <= 0 {
                    break;
                }
                curr += 1;
                left <<= 1;
            }

            used += 1 << curr;
            if over(used) {
                return None;
            }

            low = huff & mask;
            table[low as usize] = Code::new(curr as u8, root as u8, next as u16);
        }
    }

    // An incomplete code leaves one entry to mark invalid.
    if huff != 0 {
        table[next + huff as usize] = Code::new(OP_INVALID, (len - drop) as u8, 0);
    }

    Some((used, root))
}
