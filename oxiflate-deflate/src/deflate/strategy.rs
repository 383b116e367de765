//! Block compressors.
//!
//! Each compressor consumes as much of the window and input as it can and
//! reports where it stopped. Which one runs is decided per call from the
//! level and strategy, so a parameter change takes effect at the next block.

use super::{Deflater, running_check};
use crate::config::Strategy;
use crate::stream::StreamBuffers;
use crate::tables::{MAX_MATCH, MAX_STORED, MIN_LOOKAHEAD, MIN_MATCH};
use oxiflate_core::flush::Flush;

use super::window::{NIL, TOO_FAR};

/// Where a block compressor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockState {
    /// Needs more input or more output space.
    NeedMore,
    /// A flush point was reached.
    BlockDone,
    /// The last block was started; output space ran out.
    FinishStarted,
    /// The last block is complete.
    FinishDone,
}

impl Deflater<'_> {
    /// Flush the current block. Returns the state to report when the
    /// caller's output filled up.
    fn flush_block(&mut self, strm: &mut StreamBuffers<'_, '_>, last: bool) -> Option<BlockState> {
        self.flush_block_only(strm, last);
        if strm.avail_out() == 0 {
            Some(if last {
                BlockState::FinishStarted
            } else {
                BlockState::NeedMore
            })
        } else {
            None
        }
    }

    /// Common ending once the input is exhausted.
    fn finish_blocks(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        if flush == Flush::Finish {
            return self.flush_block(strm, true).unwrap_or(BlockState::FinishDone);
        }
        if self.pending.has_symbols() {
            if let Some(state) = self.flush_block(strm, false) {
                return state;
            }
        }
        BlockState::BlockDone
    }

    /// Stored blocks only.
    ///
    /// Input goes straight to the caller's output whenever a whole block fits
    /// there; otherwise it is staged in the window and written through the
    /// pending buffer. The history is kept up to date in both cases, with
    /// hash maintenance deferred in `matches` until a level change needs it.
    pub(crate) fn deflate_stored(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        let pending_size = self.pending.capacity();
        let mut min_block = (pending_size - 5).min(self.w_size);
        let used = strm.avail_in();
        let mut last = false;

        loop {
            let mut len = MAX_STORED;
            let header = (self.pending.bits() as usize + 42) >> 3;
            if strm.avail_out() < header {
                break;
            }
            let have = strm.avail_out() - header;
            let mut left = (self.strstart as isize - self.block_start) as usize;
            len = len.min(left + strm.avail_in()).min(have);

            if len < min_block
                && ((len == 0 && flush != Flush::Finish)
                    || flush == Flush::NoFlush
                    || len != left + strm.avail_in())
            {
                break;
            }

            last = flush == Flush::Finish && len == left + strm.avail_in();
            self.pending.stored_block(&[], last);
            self.pending.patch_stored_len(len as u16);
            self.flush_pending(strm);

            if left > 0 {
                left = left.min(len);
                let start = self.block_start as usize;
                strm.write_from(&self.window[start..start + left]);
                self.info.total_out += left as u64;
                self.block_start += left as isize;
                len -= left;
            }
            if len > 0 {
                let copied = strm.pass_through(len);
                self.info.adler = running_check(self.wrap, self.info.adler, copied);
                self.info.total_in += len as u64;
                self.info.total_out += len as u64;
            }

            if last {
                break;
            }
        }

        // Keep the window in step with the input copied directly.
        let used = used - strm.avail_in();
        if used > 0 {
            if used >= self.w_size {
                self.matches = 2;
                let wsize = self.w_size;
                self.window[..wsize].copy_from_slice(strm.consumed_tail(wsize));
                self.strstart = wsize;
                self.insert = self.strstart;
            } else {
                if self.window_size - self.strstart <= used {
                    self.strstart -= self.w_size;
                    let (start, wsize) = (self.strstart, self.w_size);
                    self.window.copy_within(wsize..wsize + start, 0);
                    if self.matches < 2 {
                        self.matches += 1;
                    }
                    if self.insert > self.strstart {
                        self.insert = self.strstart;
                    }
                }
                let at = self.strstart;
                self.window[at..at + used].copy_from_slice(strm.consumed_tail(used));
                self.strstart += used;
                self.insert += used.min(self.w_size - self.insert);
            }
            self.block_start = self.strstart as isize;
        }
        if self.high_water < self.strstart {
            self.high_water = self.strstart;
        }

        if last {
            return BlockState::FinishDone;
        }

        if flush != Flush::NoFlush
            && flush != Flush::Finish
            && strm.avail_in() == 0
            && self.strstart as isize == self.block_start
        {
            return BlockState::BlockDone;
        }

        // Stage remaining input in the window.
        let mut have = self.window_size - self.strstart;
        if strm.avail_in() > have && self.block_start >= self.w_size as isize {
            self.block_start -= self.w_size as isize;
            self.strstart -= self.w_size;
            let (start, wsize) = (self.strstart, self.w_size);
            self.window.copy_within(wsize..wsize + start, 0);
            if self.matches < 2 {
                self.matches += 1;
            }
            have += self.w_size;
            if self.insert > self.strstart {
                self.insert = self.strstart;
            }
        }
        have = have.min(strm.avail_in());
        if have > 0 {
            self.read_buf(strm, self.strstart, have);
            self.strstart += have;
            self.insert += have.min(self.w_size - self.insert);
        }
        if self.high_water < self.strstart {
            self.high_water = self.strstart;
        }

        // Not enough output space for a direct block: emit a block through
        // the pending buffer if it is worth it, or if flushing and the rest
        // fits.
        let header = (self.pending.bits() as usize + 42) >> 3;
        let have = (pending_size - header).min(MAX_STORED);
        min_block = have.min(self.w_size);
        let left = (self.strstart as isize - self.block_start) as usize;
        if left >= min_block
            || ((left > 0 || flush == Flush::Finish)
                && flush != Flush::NoFlush
                && strm.avail_in() == 0
                && left <= have)
        {
            let len = left.min(have);
            last = flush == Flush::Finish && strm.avail_in() == 0 && len == left;
            let start = self.block_start as usize;
            self.pending.stored_block(&self.window[start..start + len], last);
            self.block_start += len as isize;
            self.flush_pending(strm);
        }

        if last {
            BlockState::FinishStarted
        } else {
            BlockState::NeedMore
        }
    }

    /// Greedy matching: take the longest match at each position, inserting
    /// the matched strings only when the match is short.
    pub(crate) fn deflate_fast(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        loop {
            if self.lookahead < MIN_LOOKAHEAD {
                self.fill_window(strm);
                if self.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = usize::from(NIL);
            if self.lookahead >= MIN_MATCH {
                hash_head = self.insert_string(self.strstart);
            }

            if hash_head != usize::from(NIL) && self.strstart - hash_head <= self.max_dist() {
                self.match_length = self.longest_match(hash_head);
            }

            let bflush;
            if self.match_length >= MIN_MATCH {
                bflush = self.tally_dist(self.strstart - self.match_start, self.match_length - MIN_MATCH);
                self.lookahead -= self.match_length;

                if self.match_length <= self.max_lazy_match && self.lookahead >= MIN_MATCH {
                    // The string at strstart is already in the table.
                    self.match_length -= 1;
                    loop {
                        self.strstart += 1;
                        self.insert_string(self.strstart);
                        self.match_length -= 1;
                        if self.match_length == 0 {
                            break;
                        }
                    }
                    self.strstart += 1;
                } else {
                    self.strstart += self.match_length;
                    self.match_length = 0;
                    self.seed_hash(self.strstart);
                }
            } else {
                bflush = self.tally_lit(self.window[self.strstart]);
                self.lookahead -= 1;
                self.strstart += 1;
            }

            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.insert = self.strstart.min(MIN_MATCH - 1);
        self.finish_blocks(strm, flush)
    }

    /// Lazy matching: a match is only emitted once the match at the next
    /// position has been found to be no better.
    pub(crate) fn deflate_slow(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        loop {
            if self.lookahead < MIN_LOOKAHEAD {
                self.fill_window(strm);
                if self.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = usize::from(NIL);
            if self.lookahead >= MIN_MATCH {
                hash_head = self.insert_string(self.strstart);
            }

            self.prev_length = self.match_length;
            self.prev_match = self.match_start;
            self.match_length = MIN_MATCH - 1;

            if hash_head != usize::from(NIL)
                && self.prev_length < self.max_lazy_match
                && self.strstart - hash_head <= self.max_dist()
            {
                self.match_length = self.longest_match(hash_head);

                if self.match_length <= 5
                    && (self.strategy == Strategy::Filtered
                        || (self.match_length == MIN_MATCH && self.strstart - self.match_start > TOO_FAR))
                {
                    self.match_length = MIN_MATCH - 1;
                }
            }

            if self.prev_length >= MIN_MATCH && self.match_length <= self.prev_length {
                let max_insert = self.strstart + self.lookahead - MIN_MATCH;
                let bflush = self.tally_dist(self.strstart - 1 - self.prev_match, self.prev_length - MIN_MATCH);

                // Insert the strings covered by the match; the first two are
                // already in the table.
                self.lookahead -= self.prev_length - 1;
                self.prev_length -= 2;
                loop {
                    self.strstart += 1;
                    if self.strstart <= max_insert {
                        self.insert_string(self.strstart);
                    }
                    self.prev_length -= 1;
                    if self.prev_length == 0 {
                        break;
                    }
                }
                self.match_available = false;
                self.match_length = MIN_MATCH - 1;
                self.strstart += 1;

                if bflush {
                    if let Some(state) = self.flush_block(strm, false) {
                        return state;
                    }
                }
            } else if self.match_available {
                // The previous position is better emitted as a literal.
                let bflush = self.tally_lit(self.window[self.strstart - 1]);
                if bflush {
                    self.flush_block_only(strm, false);
                }
                self.strstart += 1;
                self.lookahead -= 1;
                if strm.avail_out() == 0 {
                    return BlockState::NeedMore;
                }
            } else {
                self.match_available = true;
                self.strstart += 1;
                self.lookahead -= 1;
            }
        }

        debug_assert!(flush != Flush::NoFlush, "no flush?");
        if self.match_available {
            self.tally_lit(self.window[self.strstart - 1]);
            self.match_available = false;
        }
        self.insert = self.strstart.min(MIN_MATCH - 1);
        self.finish_blocks(strm, flush)
    }

    /// Run-length matching: only matches at distance one.
    pub(crate) fn deflate_rle(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        loop {
            // Make sure a full-length run can be seen.
            if self.lookahead <= MAX_MATCH {
                self.fill_window(strm);
                if self.lookahead <= MAX_MATCH && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0 {
                    break;
                }
            }

            self.match_length = 0;
            if self.lookahead >= MIN_MATCH && self.strstart > 0 {
                let at = self.strstart;
                let prev = self.window[at - 1];
                let run = self.window[at..at + MAX_MATCH]
                    .iter()
                    .take_while(|&&byte| byte == prev)
                    .count();
                if run >= MIN_MATCH {
                    self.match_length = run.min(self.lookahead);
                }
            }

            let bflush = if self.match_length >= MIN_MATCH {
                let bflush = self.tally_dist(1, self.match_length - MIN_MATCH);
                self.lookahead -= self.match_length;
                self.strstart += self.match_length;
                self.match_length = 0;
                bflush
            } else {
                let bflush = self.tally_lit(self.window[self.strstart]);
                self.lookahead -= 1;
                self.strstart += 1;
                bflush
            };

            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.insert = 0;
        self.finish_blocks(strm, flush)
    }

    /// Literals only.
    pub(crate) fn deflate_huff(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        loop {
            if self.lookahead == 0 {
                self.fill_window(strm);
                if self.lookahead == 0 {
                    if flush == Flush::NoFlush {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            self.match_length = 0;
            let bflush = self.tally_lit(self.window[self.strstart]);
            self.lookahead -= 1;
            self.strstart += 1;
            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.insert = 0;
        self.finish_blocks(strm, flush)
    }
}
