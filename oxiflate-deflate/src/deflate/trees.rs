//! Huffman tree construction and block emission.
//!
//! Symbols produced by the match engine are buffered as `(distance, length
//! or literal)` triples in the upper part of the pending buffer. When a block
//! is flushed the literal/length and distance trees are built from the
//! accumulated frequencies, their code lengths are themselves compressed with
//! the bit length tree, and the cheapest of stored, fixed and dynamic coding
//! is emitted into the lower part of the same buffer.
//!
//! ## Tree construction
//!
//! ```text
//! frequencies ──► min-heap ──► combine two smallest ──► parent links
//!                                                        │
//!          bit-reversed codes ◄── canonical codes ◄── bit lengths (≤ max)
//! ```

use super::Deflater;
use crate::stream::StreamBuffers;
use crate::tables::{
    BASE_DIST, BASE_LENGTH, BL_CODES, BL_ORDER, D_CODES, DYN_TREES, END_BLOCK, EXTRA_BLBITS,
    EXTRA_DBITS, EXTRA_LBITS, HEAP_SIZE, L_CODES, LENGTH_CODE, LITERALS, MAX_BITS, MAX_BL_BITS,
    REP_3_6, REPZ_3_10, REPZ_11_138, STATIC_DTREE, STATIC_LTREE, STATIC_TREES, STORED_BLOCK,
    TreeNode, bi_reverse, d_code,
};
use oxiflate_core::flush::DataType;
use tracing::trace;

/// Bit buffer width.
const BUF_SIZE: u32 = 16;

/// Static description of one tree kind.
#[derive(Debug)]
pub(crate) struct StaticTreeDesc {
    /// Fixed tree used to price the block as a static one.
    static_tree: Option<&'static [TreeNode]>,
    /// Extra bits for each code.
    extra_bits: &'static [u8],
    /// First code with extra bits.
    extra_base: usize,
    /// Number of elements in the alphabet.
    elems: usize,
    /// Longest code allowed.
    max_length: usize,
}

pub(crate) const L_DESC: StaticTreeDesc = StaticTreeDesc {
    static_tree: Some(&STATIC_LTREE),
    extra_bits: &EXTRA_LBITS,
    extra_base: LITERALS + 1,
    elems: L_CODES,
    max_length: MAX_BITS,
};

pub(crate) const D_DESC: StaticTreeDesc = StaticTreeDesc {
    static_tree: Some(&STATIC_DTREE),
    extra_bits: &EXTRA_DBITS,
    extra_base: 0,
    elems: D_CODES,
    max_length: MAX_BITS,
};

pub(crate) const BL_DESC: StaticTreeDesc = StaticTreeDesc {
    static_tree: None,
    extra_bits: &EXTRA_BLBITS,
    extra_base: 0,
    elems: BL_CODES,
    max_length: MAX_BL_BITS,
};

/// Pending output bytes, the bit accumulator and the symbol buffer.
///
/// Output grows from the start of `buf`; symbols live from `sym_base` on.
/// Emitting the symbols of a block never overtakes the symbol being read.
#[derive(Debug)]
pub(crate) struct Pending<'a> {
    buf: &'a mut [u8],
    /// Start of the bytes not yet copied to the caller.
    out: usize,
    /// Number of bytes waiting.
    len: usize,
    bi_buf: u16,
    bi_valid: u32,
    sym_base: usize,
    sym_next: usize,
    sym_end: usize,
}

impl<'a> Pending<'a> {
    pub(crate) fn new(buf: &'a mut [u8], lit_bufsize: usize) -> Self {
        Self {
            buf,
            out: 0,
            len: 0,
            bi_buf: 0,
            bi_valid: 0,
            sym_base: lit_bufsize,
            sym_next: 0,
            sym_end: (lit_bufsize - 1) * 3,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits held in the accumulator.
    pub(crate) fn bits(&self) -> u32 {
        self.bi_valid
    }

    /// Whether the block has symbols buffered.
    pub(crate) fn has_symbols(&self) -> bool {
        self.sym_next != 0
    }

    /// Room left in front of the symbol buffer, in bytes.
    pub(crate) fn headroom(&self) -> usize {
        self.sym_base.saturating_sub(self.out)
    }

    pub(crate) fn reset(&mut self) {
        self.out = 0;
        self.len = 0;
        self.bi_buf = 0;
        self.bi_valid = 0;
        self.sym_next = 0;
    }

    /// The bytes waiting to be copied out.
    #[cfg(test)]
    pub(crate) fn waiting(&self) -> &[u8] {
        &self.buf[self.out..self.out + self.len]
    }

    /// Bytes written from offset `beg` on.
    pub(crate) fn since(&self, beg: usize) -> &[u8] {
        &self.buf[beg..self.len]
    }

    #[inline]
    pub(crate) fn put_byte(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.len += 1;
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    /// Least significant byte first.
    #[inline]
    pub(crate) fn put_short(&mut self, w: u16) {
        self.put_byte(w as u8);
        self.put_byte((w >> 8) as u8);
    }

    /// Most significant byte first, as in the zlib header and trailer.
    pub(crate) fn put_short_msb(&mut self, w: u16) {
        self.put_byte((w >> 8) as u8);
        self.put_byte(w as u8);
    }

    /// Overwrite the LEN/NLEN pair of the stored header just written.
    pub(crate) fn patch_stored_len(&mut self, len: u16) {
        let at = self.len - 4;
        self.buf[at..at + 2].copy_from_slice(&len.to_le_bytes());
        self.buf[at + 2..at + 4].copy_from_slice(&(!len).to_le_bytes());
    }

    /// Copy waiting bytes to the caller, returning how many were copied.
    pub(crate) fn drain_into(&mut self, strm: &mut StreamBuffers<'_, '_>) -> usize {
        self.flush_bits();
        let copied = strm.write_from(&self.buf[self.out..self.out + self.len]);
        self.out += copied;
        self.len -= copied;
        if self.len == 0 {
            self.out = 0;
        }
        copied
    }

    /// Append the low `length` bits of `value`.
    #[inline]
    pub(crate) fn send_bits(&mut self, value: u32, length: u32) {
        debug_assert!(length > 0 && length <= 16, "invalid bit length");
        if self.bi_valid > BUF_SIZE - length {
            self.bi_buf |= (value << self.bi_valid) as u16;
            let full = self.bi_buf;
            self.put_short(full);
            self.bi_buf = (value >> (BUF_SIZE - self.bi_valid)) as u16;
            self.bi_valid -= BUF_SIZE - length;
        } else {
            self.bi_buf |= (value << self.bi_valid) as u16;
            self.bi_valid += length;
        }
    }

    #[inline]
    fn send_code(&mut self, symbol: usize, tree: &[TreeNode]) {
        let node = tree[symbol];
        self.send_bits(u32::from(node.code), u32::from(node.len));
    }

    /// Merge raw bits into the accumulator, at most as many as it can hold.
    /// Returns how many bits were taken.
    pub(crate) fn prime_bits(&mut self, bits: u32, value: u32) -> u32 {
        let put = (BUF_SIZE - self.bi_valid).min(bits);
        self.bi_buf |= ((value & ((1 << put) - 1)) << self.bi_valid) as u16;
        self.bi_valid += put;
        self.flush_bits();
        put
    }

    /// Move whole bytes out of the accumulator, keeping at most 7 bits.
    pub(crate) fn flush_bits(&mut self) {
        if self.bi_valid == 16 {
            let full = self.bi_buf;
            self.put_short(full);
            self.bi_buf = 0;
            self.bi_valid = 0;
        } else if self.bi_valid >= 8 {
            self.put_byte(self.bi_buf as u8);
            self.bi_buf >>= 8;
            self.bi_valid -= 8;
        }
    }

    /// Empty the accumulator, padding to a byte boundary.
    fn windup(&mut self) {
        if self.bi_valid > 8 {
            let full = self.bi_buf;
            self.put_short(full);
        } else if self.bi_valid > 0 {
            self.put_byte(self.bi_buf as u8);
        }
        self.bi_buf = 0;
        self.bi_valid = 0;
    }

    #[inline]
    fn push_sym(&mut self, dist: u16, lc: u8) -> bool {
        let at = self.sym_base + self.sym_next;
        self.buf[at] = dist as u8;
        self.buf[at + 1] = (dist >> 8) as u8;
        self.buf[at + 2] = lc;
        self.sym_next += 3;
        self.sym_next == self.sym_end
    }

    /// Emit a stored block header followed by `data`.
    pub(crate) fn stored_block(&mut self, data: &[u8], last: bool) {
        self.send_bits((STORED_BLOCK << 1) + u32::from(last), 3);
        self.windup();
        let len = data.len() as u16;
        self.put_short(len);
        self.put_short(!len);
        self.put_bytes(data);
    }

    /// Emit an empty static block, so that a decoder has enough lookahead to
    /// finish the previous block.
    pub(crate) fn align(&mut self) {
        self.send_bits(STATIC_TREES << 1, 3);
        self.send_code(END_BLOCK, &STATIC_LTREE);
        self.flush_bits();
    }

    /// Emit the buffered symbols with the given trees.
    fn compress_block(&mut self, ltree: &[TreeNode], dtree: &[TreeNode]) {
        let mut sx = 0;
        while sx < self.sym_next {
            let at = self.sym_base + sx;
            let mut dist = usize::from(self.buf[at]) | usize::from(self.buf[at + 1]) << 8;
            let mut lc = usize::from(self.buf[at + 2]);
            sx += 3;

            if dist == 0 {
                self.send_code(lc, ltree);
                continue;
            }

            let code = usize::from(LENGTH_CODE[lc]);
            self.send_code(code + LITERALS + 1, ltree);
            let extra = u32::from(EXTRA_LBITS[code]);
            if extra != 0 {
                lc -= usize::from(BASE_LENGTH[code]);
                self.send_bits(lc as u32, extra);
            }

            dist -= 1;
            let code = d_code(dist);
            self.send_code(code, dtree);
            let extra = u32::from(EXTRA_DBITS[code]);
            if extra != 0 {
                dist -= usize::from(BASE_DIST[code]);
                self.send_bits(dist as u32, extra);
            }
        }
        self.send_code(END_BLOCK, ltree);
    }

    /// Send a tree in compressed form using the bit length tree.
    fn send_tree(&mut self, tree: &[TreeNode], max_code: usize, bl_tree: &[TreeNode]) {
        let mut prevlen: i32 = -1;
        let mut nextlen = tree[0].len;
        let mut count = 0;
        let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

        for n in 0..=max_code {
            let curlen = nextlen;
            nextlen = tree[n + 1].len;
            count += 1;
            if count < max_count && curlen == nextlen {
                continue;
            } else if count < min_count {
                for _ in 0..count {
                    self.send_code(usize::from(curlen), bl_tree);
                }
            } else if curlen != 0 {
                if i32::from(curlen) != prevlen {
                    self.send_code(usize::from(curlen), bl_tree);
                    count -= 1;
                }
                self.send_code(REP_3_6, bl_tree);
                self.send_bits(count - 3, 2);
            } else if count <= 10 {
                self.send_code(REPZ_3_10, bl_tree);
                self.send_bits(count - 3, 3);
            } else {
                self.send_code(REPZ_11_138, bl_tree);
                self.send_bits(count - 11, 7);
            }
            count = 0;
            prevlen = i32::from(curlen);
            (max_count, min_count) = if nextlen == 0 {
                (138, 3)
            } else if curlen == nextlen {
                (6, 3)
            } else {
                (7, 4)
            };
        }
    }
}

/// Running bit costs of the current block.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BlockCost {
    /// Bit length of the block with dynamic trees, tree headers included.
    pub opt_len: i64,
    /// Bit length of the block with the fixed trees.
    pub static_len: i64,
}

/// Scratch space for building one tree at a time.
#[derive(Debug)]
pub(crate) struct Heap<'a> {
    /// 1-based binary heap of node indices; the tail collects nodes in
    /// decreasing frequency order.
    nodes: &'a mut [u16],
    /// Subtree depth of each node, used as the frequency tie-break.
    depth: &'a mut [u8],
    len: usize,
    max: usize,
    bl_count: [u16; MAX_BITS + 1],
}

impl<'a> Heap<'a> {
    pub(crate) fn new(nodes: &'a mut [u16], depth: &'a mut [u8]) -> Self {
        Self {
            nodes,
            depth,
            len: 0,
            max: 0,
            bl_count: [0; MAX_BITS + 1],
        }
    }

    #[inline]
    fn smaller(&self, tree: &[TreeNode], n: usize, m: usize) -> bool {
        tree[n].freq < tree[m].freq || (tree[n].freq == tree[m].freq && self.depth[n] <= self.depth[m])
    }

    /// Restore the heap property by sifting node `k` down.
    fn pqdownheap(&mut self, tree: &[TreeNode], mut k: usize) {
        let v = usize::from(self.nodes[k]);
        let mut j = k << 1;
        while j <= self.len {
            if j < self.len && self.smaller(tree, usize::from(self.nodes[j + 1]), usize::from(self.nodes[j])) {
                j += 1;
            }
            if self.smaller(tree, v, usize::from(self.nodes[j])) {
                break;
            }
            self.nodes[k] = self.nodes[j];
            k = j;
            j <<= 1;
        }
        self.nodes[k] = v as u16;
    }

    /// Remove the smallest element.
    fn pqremove(&mut self, tree: &[TreeNode]) -> usize {
        let top = usize::from(self.nodes[1]);
        self.nodes[1] = self.nodes[self.len];
        self.len -= 1;
        self.pqdownheap(tree, 1);
        top
    }

    /// Build a Huffman tree for the frequencies in `tree`, set code lengths
    /// and codes, and return the largest code with a nonzero frequency.
    pub(crate) fn build_tree(
        &mut self,
        tree: &mut [TreeNode],
        desc: &StaticTreeDesc,
        cost: &mut BlockCost,
    ) -> usize {
        let elems = desc.elems;
        let mut max_code: isize = -1;

        self.len = 0;
        self.max = HEAP_SIZE;
        for (n, node) in tree.iter_mut().enumerate().take(elems) {
            if node.freq != 0 {
                self.len += 1;
                self.nodes[self.len] = n as u16;
                max_code = n as isize;
                self.depth[n] = 0;
            } else {
                node.len = 0;
            }
        }

        // A valid code needs at least two symbols; synthesize the missing
        // ones with frequency 1 so that every symbol gets a nonzero length.
        while self.len < 2 {
            let node = if max_code < 2 {
                max_code += 1;
                max_code as usize
            } else {
                0
            };
            self.len += 1;
            self.nodes[self.len] = node as u16;
            tree[node].freq = 1;
            self.depth[node] = 0;
            cost.opt_len -= 1;
            if let Some(stree) = desc.static_tree {
                cost.static_len -= i64::from(stree[node].len);
            }
        }
        let max_code = max_code as usize;

        for n in (1..=self.len / 2).rev() {
            self.pqdownheap(tree, n);
        }

        let mut node = elems;
        loop {
            let n = self.pqremove(tree);
            let m = usize::from(self.nodes[1]);

            self.max -= 1;
            self.nodes[self.max] = n as u16;
            self.max -= 1;
            self.nodes[self.max] = m as u16;

            tree[node].freq = tree[n].freq + tree[m].freq;
            self.depth[node] = self.depth[n].max(self.depth[m]) + 1;
            tree[n].dad = node as u16;
            tree[m].dad = node as u16;

            self.nodes[1] = node as u16;
            node += 1;
            self.pqdownheap(tree, 1);

            if self.len < 2 {
                break;
            }
        }
        self.max -= 1;
        self.nodes[self.max] = self.nodes[1];

        self.gen_bitlen(tree, max_code, desc, cost);
        gen_codes(tree, max_code, &self.bl_count);
        max_code
    }

    /// Compute optimal code lengths, then cap them at the maximum length,
    /// updating the block cost accordingly.
    fn gen_bitlen(
        &mut self,
        tree: &mut [TreeNode],
        max_code: usize,
        desc: &StaticTreeDesc,
        cost: &mut BlockCost,
    ) {
        let max_length = desc.max_length;
        self.bl_count = [0; MAX_BITS + 1];

        // The root of the heap has length 0.
        tree[usize::from(self.nodes[self.max])].len = 0;

        let mut overflow: i32 = 0;
        for h in self.max + 1..HEAP_SIZE {
            let n = usize::from(self.nodes[h]);
            let mut bits = usize::from(tree[usize::from(tree[n].dad)].len) + 1;
            if bits > max_length {
                bits = max_length;
                overflow += 1;
            }
            tree[n].len = bits as u16;

            if n > max_code {
                continue; // not a leaf
            }

            self.bl_count[bits] += 1;
            let xbits = if n >= desc.extra_base {
                usize::from(desc.extra_bits[n - desc.extra_base])
            } else {
                0
            };
            let f = i64::from(tree[n].freq);
            cost.opt_len += f * (bits + xbits) as i64;
            if let Some(stree) = desc.static_tree {
                cost.static_len += f * (usize::from(stree[n].len) + xbits) as i64;
            }
        }
        if overflow == 0 {
            return;
        }

        trace!(overflow, max_length, "code lengths over limit");

        // Find the first bit length which could increase, move one leaf
        // down from it and two leaves up from the overflow level.
        loop {
            let mut bits = max_length - 1;
            while self.bl_count[bits] == 0 {
                bits -= 1;
            }
            self.bl_count[bits] -= 1;
            self.bl_count[bits + 1] += 2;
            self.bl_count[max_length] -= 1;
            overflow -= 2;
            if overflow <= 0 {
                break;
            }
        }

        // Reassign lengths walking the leaves in increasing frequency order.
        let mut h = HEAP_SIZE;
        for bits in (1..=max_length).rev() {
            let mut n = self.bl_count[bits];
            while n != 0 {
                h -= 1;
                let m = usize::from(self.nodes[h]);
                if m > max_code {
                    continue;
                }
                if usize::from(tree[m].len) != bits {
                    cost.opt_len += (bits as i64 - i64::from(tree[m].len)) * i64::from(tree[m].freq);
                    tree[m].len = bits as u16;
                }
                n -= 1;
            }
        }
    }
}

/// Assign canonical codes to a tree whose lengths are known, bit-reversed
/// for LSB-first transmission.
fn gen_codes(tree: &mut [TreeNode], max_code: usize, bl_count: &[u16; MAX_BITS + 1]) {
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + u32::from(bl_count[bits - 1])) << 1;
        next_code[bits] = code;
    }

    for node in tree.iter_mut().take(max_code + 1) {
        let len = usize::from(node.len);
        if len == 0 {
            continue;
        }
        node.code = bi_reverse(next_code[len], len as u32) as u16;
        next_code[len] += 1;
    }
}

/// Accumulate bit length tree frequencies for the run-length coded lengths
/// of `tree`.
fn scan_tree(tree: &mut [TreeNode], max_code: usize, bl_tree: &mut [TreeNode]) {
    let mut prevlen: i32 = -1;
    let mut nextlen = tree[0].len;
    let mut count = 0;
    let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

    tree[max_code + 1].len = 0xFFFF; // guard

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = tree[n + 1].len;
        count += 1;
        if count < max_count && curlen == nextlen {
            continue;
        } else if count < min_count {
            bl_tree[usize::from(curlen)].freq += count;
        } else if curlen != 0 {
            if i32::from(curlen) != prevlen {
                bl_tree[usize::from(curlen)].freq += 1;
            }
            bl_tree[REP_3_6].freq += 1;
        } else if count <= 10 {
            bl_tree[REPZ_3_10].freq += 1;
        } else {
            bl_tree[REPZ_11_138].freq += 1;
        }
        count = 0;
        prevlen = i32::from(curlen);
        (max_count, min_count) = if nextlen == 0 {
            (138, 3)
        } else if curlen == nextlen {
            (6, 3)
        } else {
            (7, 4)
        };
    }
}

impl Deflater<'_> {
    /// Reset the per-block statistics.
    pub(crate) fn init_block(&mut self) {
        for node in self.dyn_ltree.iter_mut().take(L_CODES) {
            node.freq = 0;
        }
        for node in self.dyn_dtree.iter_mut().take(D_CODES) {
            node.freq = 0;
        }
        for node in self.bl_tree.iter_mut().take(BL_CODES) {
            node.freq = 0;
        }
        self.dyn_ltree[END_BLOCK].freq = 1;
        self.cost = BlockCost::default();
        self.pending.sym_next = 0;
        self.matches = 0;
    }

    /// Record a literal. Returns true when the symbol buffer is full.
    #[inline]
    pub(crate) fn tally_lit(&mut self, c: u8) -> bool {
        self.dyn_ltree[usize::from(c)].freq += 1;
        self.pending.push_sym(0, c)
    }

    /// Record a match of `len + MIN_MATCH` bytes at distance `dist`.
    /// Returns true when the symbol buffer is full.
    #[inline]
    pub(crate) fn tally_dist(&mut self, dist: usize, len: usize) -> bool {
        self.matches += 1;
        self.dyn_ltree[usize::from(LENGTH_CODE[len]) + LITERALS + 1].freq += 1;
        self.dyn_dtree[d_code(dist - 1)].freq += 1;
        self.pending.push_sym(dist as u16, len as u8)
    }

    /// Guess whether the block is text, from the literal frequencies.
    fn detect_data_type(&self) -> DataType {
        // Bit n set: byte n is a control character that does not occur in
        // text (everything below 32 except TAB, LF, VT, FF, CR, SUB, ESC).
        let mut block_mask: u32 = 0xF3FF_C07F;
        for node in &self.dyn_ltree[..32] {
            if block_mask & 1 != 0 && node.freq != 0 {
                return DataType::Binary;
            }
            block_mask >>= 1;
        }

        if self.dyn_ltree[9].freq != 0 || self.dyn_ltree[10].freq != 0 || self.dyn_ltree[13].freq != 0 {
            return DataType::Text;
        }
        if self.dyn_ltree[32..LITERALS].iter().any(|node| node.freq != 0) {
            return DataType::Text;
        }
        DataType::Binary
    }

    /// Build the bit length tree and return the index in [`BL_ORDER`] of
    /// the last bit length code to send.
    fn build_bl_tree(&mut self) -> usize {
        scan_tree(self.dyn_ltree, self.l_max_code, self.bl_tree);
        scan_tree(self.dyn_dtree, self.d_max_code, self.bl_tree);

        self.heap.build_tree(self.bl_tree, &BL_DESC, &mut self.cost);

        // At least 4 bit length codes are always sent.
        let mut max_blindex = BL_CODES - 1;
        while max_blindex >= 3 {
            if self.bl_tree[BL_ORDER[max_blindex]].len != 0 {
                break;
            }
            max_blindex -= 1;
        }
        self.cost.opt_len += 3 * (max_blindex as i64 + 1) + 5 + 5 + 4;
        max_blindex
    }

    fn send_all_trees(&mut self, lcodes: usize, dcodes: usize, blcodes: usize) {
        let pending = &mut self.pending;
        pending.send_bits((lcodes - 257) as u32, 5);
        pending.send_bits((dcodes - 1) as u32, 5);
        pending.send_bits((blcodes - 4) as u32, 4);
        for &symbol in BL_ORDER.iter().take(blcodes) {
            pending.send_bits(u32::from(self.bl_tree[symbol].len), 3);
        }
        pending.send_tree(self.dyn_ltree, lcodes - 1, self.bl_tree);
        pending.send_tree(self.dyn_dtree, dcodes - 1, self.bl_tree);
    }

    /// Finish the current block.
    ///
    /// `stored` is the window range holding the block's raw bytes, or `None`
    /// when the window has moved past them; `stored_len` is their count.
    pub(crate) fn tr_flush_block(&mut self, stored: Option<usize>, stored_len: usize, last: bool) {
        let mut max_blindex = 0;
        let (opt_lenb, static_lenb);

        if self.level > 0 {
            if self.info.data_type == DataType::Unknown {
                self.info.data_type = self.detect_data_type();
            }

            self.l_max_code = self.heap.build_tree(self.dyn_ltree, &L_DESC, &mut self.cost);
            self.d_max_code = self.heap.build_tree(self.dyn_dtree, &D_DESC, &mut self.cost);
            max_blindex = self.build_bl_tree();

            let opt = ((self.cost.opt_len + 3 + 7) >> 3) as usize;
            let stat = ((self.cost.static_len + 3 + 7) >> 3) as usize;
            static_lenb = stat;
            opt_lenb = if stat <= opt || self.strategy == crate::config::Strategy::Fixed {
                stat
            } else {
                opt
            };
        } else {
            opt_lenb = stored_len + 5;
            static_lenb = opt_lenb;
        }

        let last_bit = u32::from(last);
        match stored {
            Some(start) if stored_len + 4 <= opt_lenb => {
                trace!(stored_len, last, "stored block");
                self.pending
                    .stored_block(&self.window[start..start + stored_len], last);
            }
            _ if static_lenb == opt_lenb => {
                trace!(stored_len, bytes = static_lenb, last, "fixed block");
                self.pending.send_bits((STATIC_TREES << 1) + last_bit, 3);
                self.pending.compress_block(&STATIC_LTREE, &STATIC_DTREE);
            }
            _ => {
                trace!(stored_len, bytes = opt_lenb, last, "dynamic block");
                self.pending.send_bits((DYN_TREES << 1) + last_bit, 3);
                self.send_all_trees(self.l_max_code + 1, self.d_max_code + 1, max_blindex + 1);
                self.pending.compress_block(self.dyn_ltree, self.dyn_dtree);
            }
        }

        self.init_block();
        if last {
            self.pending.windup();
        }
    }

    /// Flush the block that ends at `strstart` and copy out what fits.
    pub(crate) fn flush_block_only(&mut self, strm: &mut StreamBuffers<'_, '_>, last: bool) {
        let stored = usize::try_from(self.block_start).ok();
        let stored_len = (self.strstart as isize - self.block_start) as usize;
        self.tr_flush_block(stored, stored_len, last);
        self.block_start = self.strstart as isize;
        self.flush_pending(strm);
    }
}
