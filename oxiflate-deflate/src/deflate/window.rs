//! Sliding window and hash chains.
//!
//! The window holds two window sizes of input. Strings of [`MIN_MATCH`]
//! bytes are hashed into `head`, and `prev` links every position to the
//! previous one with the same hash, masked to the window size. When the
//! cursor nears the end of the window the upper half is moved down and every
//! chain link is rebased.

use super::{Deflater, running_check};
use crate::stream::StreamBuffers;
use crate::tables::{MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};

/// End of a hash chain.
pub(crate) const NIL: u16 = 0;

/// Bytes zeroed ahead of the input, so that match comparisons never read
/// uninitialized history.
const WIN_INIT: usize = MAX_MATCH;

/// Matches of length 3 farther away than this are discarded by lazy matching.
pub(crate) const TOO_FAR: usize = 4096;

impl Deflater<'_> {
    /// Farthest distance a match may reach back, leaving room for lookahead.
    #[inline]
    pub(crate) fn max_dist(&self) -> usize {
        self.w_size - MIN_LOOKAHEAD
    }

    #[inline]
    pub(crate) fn update_hash(&self, h: usize, c: u8) -> usize {
        ((h << self.hash_shift) ^ usize::from(c)) & self.hash_mask
    }

    /// Insert the string starting at `pos` and return the previous head of
    /// its hash chain.
    #[inline]
    pub(crate) fn insert_string(&mut self, pos: usize) -> usize {
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + MIN_MATCH - 1]);
        let head = self.head[self.ins_h];
        self.prev[pos & self.w_mask] = head;
        self.head[self.ins_h] = pos as u16;
        usize::from(head)
    }

    /// Seed the rolling hash with the first two bytes at `pos`.
    #[inline]
    pub(crate) fn seed_hash(&mut self, pos: usize) {
        self.ins_h = usize::from(self.window[pos]);
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + 1]);
    }

    /// Forget all strings.
    pub(crate) fn clear_hash(&mut self) {
        self.head.fill(NIL);
    }

    /// Rebase chain links after the window moved down by `w_size`. Links that
    /// fall off the window become [`NIL`].
    pub(crate) fn slide_hash(&mut self) {
        let wsize = self.w_size;
        let rebase = |link: &mut u16| {
            let m = usize::from(*link);
            *link = if m >= wsize { (m - wsize) as u16 } else { NIL };
        };
        self.head.iter_mut().for_each(rebase);
        self.prev.iter_mut().for_each(rebase);
    }

    /// Read up to `size` input bytes into the window at `offset`, folding
    /// them into the running check value.
    pub(crate) fn read_buf(
        &mut self,
        strm: &mut StreamBuffers<'_, '_>,
        offset: usize,
        size: usize,
    ) -> usize {
        let len = strm.read_into(&mut self.window[offset..offset + size]);
        if len > 0 {
            self.info.adler = running_check(self.wrap, self.info.adler, &self.window[offset..offset + len]);
            self.info.total_in += len as u64;
        }
        len
    }

    /// Refill the window while lookahead is short and input is available.
    ///
    /// On return either `lookahead >= MIN_LOOKAHEAD` or the input is
    /// exhausted. The hash of pending inserts is brought up to date.
    pub(crate) fn fill_window(&mut self, strm: &mut StreamBuffers<'_, '_>) {
        let wsize = self.w_size;

        loop {
            let mut more = self.window_size - self.lookahead - self.strstart;

            if self.strstart >= wsize + self.max_dist() {
                self.window.copy_within(wsize..2 * wsize - more, 0);
                self.match_start = self.match_start.saturating_sub(wsize);
                self.strstart -= wsize;
                self.block_start -= wsize as isize;
                if self.insert > self.strstart {
                    self.insert = self.strstart;
                }
                self.slide_hash();
                more += wsize;
            }
            if strm.avail_in() == 0 {
                break;
            }

            let n = self.read_buf(strm, self.strstart + self.lookahead, more);
            self.lookahead += n;

            if self.lookahead + self.insert >= MIN_MATCH {
                let mut pos = self.strstart - self.insert;
                self.seed_hash(pos);
                while self.insert != 0 {
                    self.insert_string(pos);
                    pos += 1;
                    self.insert -= 1;
                    if self.lookahead + self.insert < MIN_MATCH {
                        break;
                    }
                }
            }

            if self.lookahead >= MIN_LOOKAHEAD || strm.avail_in() == 0 {
                break;
            }
        }

        self.zero_ahead();
    }

    /// Zero the window just past the data, up to [`WIN_INIT`] bytes beyond
    /// the furthest point zeroed so far.
    fn zero_ahead(&mut self) {
        if self.high_water >= self.window_size {
            return;
        }
        let curr = self.strstart + self.lookahead;
        if self.high_water < curr {
            let init = (self.window_size - curr).min(WIN_INIT);
            self.window[curr..curr + init].fill(0);
            self.high_water = curr + init;
        } else if self.high_water < curr + WIN_INIT {
            let init = (curr + WIN_INIT - self.high_water).min(self.window_size - self.high_water);
            self.window[self.high_water..self.high_water + init].fill(0);
            self.high_water += init;
        }
    }

    /// Follow the hash chain from `cur_match` and return the longest match
    /// found, recording its start in `match_start`.
    ///
    /// Only matches longer than `prev_length` are considered. The chain is
    /// cut short once a match of `nice_match` is found, and searched half as
    /// deep when the previous match already reached `good_match`.
    pub(crate) fn longest_match(&mut self, mut cur_match: usize) -> usize {
        let mut chain_length = self.max_chain_length;
        let strstart = self.strstart;
        let mut best_len = self.prev_length;
        let nice_match = self.nice_match.min(self.lookahead);
        let limit = strstart.saturating_sub(self.max_dist());

        if self.prev_length >= self.good_match {
            chain_length >>= 1;
        }

        let window = &*self.window;
        let mut scan_end1 = window[strstart + best_len - 1];
        let mut scan_end = window[strstart + best_len];

        loop {
            let m = cur_match;
            // Cheap rejections first: the byte that would extend the best
            // match, the one before it, then the first two bytes.
            if window[m + best_len] == scan_end
                && window[m + best_len - 1] == scan_end1
                && window[m] == window[strstart]
                && window[m + 1] == window[strstart + 1]
            {
                let len = 2 + window[strstart + 2..strstart + MAX_MATCH]
                    .iter()
                    .zip(&window[m + 2..m + MAX_MATCH])
                    .take_while(|(a, b)| a == b)
                    .count();

                if len > best_len {
                    self.match_start = m;
                    best_len = len;
                    if len >= nice_match {
                        break;
                    }
                    scan_end1 = window[strstart + best_len - 1];
                    scan_end = window[strstart + best_len];
                }
            }

            cur_match = usize::from(self.prev[cur_match & self.w_mask]);
            chain_length = chain_length.saturating_sub(1);
            if cur_match <= limit || chain_length == 0 {
                break;
            }
        }

        best_len.min(self.lookahead)
    }
}
