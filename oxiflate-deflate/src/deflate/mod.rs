//! Streaming DEFLATE compressor.
//!
//! A [`Deflater`] carves its window, hash chains, pending buffer and tree
//! scratch out of an [`Arena`] once, then compresses through repeated calls
//! to [`Deflater::deflate`]. Each call consumes input and produces output as
//! far as the caller's buffers allow and returns; nothing is kept outside
//! the arena and the struct itself.
//!
//! ## Stream states
//!
//! ```text
//! Init ──────────────────────────────┐
//!                                    ▼
//! GzipHeader → Extra → Name → Comment → Hcrc → Busy → Finish
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::{Arena, Flush, Status};
//! use oxiflate_deflate::{DeflateConfig, Deflater, StreamBuffers, bound};
//!
//! let config = DeflateConfig::default();
//! let mut work = vec![0u8; bound::deflate_work_size(15, 8).unwrap()];
//! let mut arena = Arena::new(&mut work);
//! let mut deflater = Deflater::new(&mut arena, config).unwrap();
//!
//! let input = b"hello, hello!\0";
//! let mut output = [0u8; 64];
//! let mut buffers = StreamBuffers::new(input, &mut output);
//! assert_eq!(deflater.deflate(&mut buffers, Flush::Finish).unwrap(), Status::StreamEnd);
//! assert!(buffers.produced() <= deflater.bound(input.len()));
//! ```

mod strategy;
mod trees;
mod window;

use crate::config::{CONFIGURATION_TABLE, DeflateConfig, MatchFn, Strategy, Wrap};
use crate::gzip::{CM_DEFLATE, GzipHeader, OS_CODE};
use crate::stream::{StreamBuffers, StreamCodec, StreamInfo};
use crate::tables::{BL_CODES, D_CODES, HEAP_SIZE, L_CODES, MIN_MATCH, TreeNode};
use oxiflate_core::arena::{Arena, region_size, total_size};
use oxiflate_core::checksum::{Adler32, Checksum, Crc32};
use oxiflate_core::error::{FlateError, Result};
use oxiflate_core::flush::{DataType, Flush, Status};
use tracing::debug;

pub(crate) use crate::stream::running_check;
use strategy::BlockState;
use trees::{BlockCost, Heap, Pending};

/// Preset dictionary flag in the zlib header.
const PRESET_DICT: u16 = 0x20;

/// Sizes of the arena regions of a compressor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeflateLayout {
    w_size: usize,
    hash_size: usize,
    lit_bufsize: usize,
}

impl DeflateLayout {
    /// Window bits of 8 are laid out as 9, as the compressor promotes them.
    pub(crate) fn new(window_bits: u8, mem_level: u8) -> Self {
        let window_bits = window_bits.max(9);
        Self {
            w_size: 1 << window_bits,
            hash_size: 1 << (usize::from(mem_level) + 7),
            lit_bufsize: 1 << (usize::from(mem_level) + 6),
        }
    }

    /// Worst-case arena bytes, in reservation order.
    pub(crate) fn work_size(&self) -> Option<usize> {
        total_size(&[
            region_size::<u8>(2 * self.w_size),
            region_size::<u16>(self.w_size),
            region_size::<u16>(self.hash_size),
            region_size::<u8>(4 * self.lit_bufsize),
            region_size::<TreeNode>(HEAP_SIZE),
            region_size::<TreeNode>(2 * D_CODES + 1),
            region_size::<TreeNode>(2 * BL_CODES + 1),
            region_size::<u16>(2 * L_CODES + 1),
            region_size::<u8>(2 * L_CODES + 1),
        ])
    }
}

/// Compressor stream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeflateStatus {
    /// zlib header not written yet.
    Init,
    /// gzip fixed header part not written yet.
    GzipHeader,
    Extra,
    Name,
    Comment,
    Hcrc,
    /// Compressing.
    Busy,
    /// The last block has been started.
    Finish,
}

/// Streaming DEFLATE compressor over arena-carved buffers.
#[derive(Debug)]
pub struct Deflater<'a> {
    pub(crate) info: StreamInfo,
    status: DeflateStatus,
    /// Framing; [`Wrap::Raw`] while a dictionary is being loaded.
    pub(crate) wrap: Wrap,
    trailer_written: bool,
    gzhead: Option<GzipHeader<'a>>,
    /// Position in the gzip field being written.
    gzindex: usize,
    /// Flush of the previous call; `None` when no repeated flush check
    /// applies to the next one.
    last_flush: Option<Flush>,
    /// Whether `deflate` ran since the last reset.
    started: bool,

    pub(crate) pending: Pending<'a>,

    pub(crate) w_size: usize,
    w_bits: u8,
    pub(crate) w_mask: usize,
    /// Two window sizes: history below `w_size`, lookahead above.
    pub(crate) window: &'a mut [u8],
    pub(crate) window_size: usize,
    /// Link to the previous string with the same hash, by position.
    pub(crate) prev: &'a mut [u16],
    /// Most recent position of each hash.
    pub(crate) head: &'a mut [u16],
    pub(crate) ins_h: usize,
    hash_bits: usize,
    pub(crate) hash_mask: usize,
    pub(crate) hash_shift: usize,

    /// Window position of the current block; negative once the window slid
    /// past it.
    pub(crate) block_start: isize,
    pub(crate) match_length: usize,
    pub(crate) prev_match: usize,
    pub(crate) match_available: bool,
    pub(crate) strstart: usize,
    pub(crate) match_start: usize,
    pub(crate) lookahead: usize,
    pub(crate) prev_length: usize,

    pub(crate) max_chain_length: usize,
    pub(crate) max_lazy_match: usize,
    pub(crate) good_match: usize,
    pub(crate) nice_match: usize,
    pub(crate) level: u8,
    pub(crate) strategy: Strategy,

    pub(crate) dyn_ltree: &'a mut [TreeNode],
    pub(crate) dyn_dtree: &'a mut [TreeNode],
    pub(crate) bl_tree: &'a mut [TreeNode],
    pub(crate) l_max_code: usize,
    pub(crate) d_max_code: usize,
    pub(crate) heap: Heap<'a>,
    pub(crate) cost: BlockCost,

    /// Matches in the current block. At level 0, counts slides whose hash
    /// rebasing is still owed: 1 for one slide, 2 for a full replacement.
    pub(crate) matches: usize,
    /// Bytes at the end of the window not yet inserted in the hash.
    pub(crate) insert: usize,
    /// Window bytes known to be initialized.
    pub(crate) high_water: usize,
}

impl<'a> Deflater<'a> {
    /// Create a compressor, carving its buffers from `arena`.
    ///
    /// # Errors
    ///
    /// [`FlateError::Config`] for invalid parameters and
    /// [`FlateError::ArenaTooSmall`] when fewer bytes than
    /// [`crate::bound::deflate_work_size`] remain in the arena. In both cases
    /// the arena is untouched.
    pub fn new(arena: &mut Arena<'a>, config: DeflateConfig) -> Result<Self> {
        Self::with_version(arena, config, crate::VERSION)
    }

    /// Create a compressor after checking that `version`, the library
    /// version the caller was built against, is compatible.
    pub fn with_version(arena: &mut Arena<'a>, config: DeflateConfig, version: &'static str) -> Result<Self> {
        crate::check_version(version)?;
        let config = config.validate()?;

        let layout = DeflateLayout::new(config.window_bits, config.mem_level);
        let needed = layout
            .work_size()
            .ok_or(FlateError::arena_too_small(usize::MAX, arena.remaining()))?;
        arena.ensure_capacity(needed)?;

        let w_size = layout.w_size;
        let window = arena.reserve::<u8>(2 * w_size)?;
        let prev = arena.reserve::<u16>(w_size)?;
        let head = arena.reserve::<u16>(layout.hash_size)?;
        let pending_buf = arena.reserve::<u8>(4 * layout.lit_bufsize)?;
        let dyn_ltree = arena.reserve::<TreeNode>(HEAP_SIZE)?;
        let dyn_dtree = arena.reserve::<TreeNode>(2 * D_CODES + 1)?;
        let bl_tree = arena.reserve::<TreeNode>(2 * BL_CODES + 1)?;
        let heap_nodes = arena.reserve::<u16>(2 * L_CODES + 1)?;
        let depth = arena.reserve::<u8>(2 * L_CODES + 1)?;

        let hash_bits = usize::from(config.mem_level) + 7;
        let mut deflater = Self {
            info: StreamInfo::default(),
            status: DeflateStatus::Init,
            wrap: config.wrap,
            trailer_written: false,
            gzhead: None,
            gzindex: 0,
            last_flush: None,
            started: false,
            pending: Pending::new(pending_buf, layout.lit_bufsize),
            w_size,
            w_bits: config.window_bits,
            w_mask: w_size - 1,
            window,
            window_size: 2 * w_size,
            prev,
            head,
            ins_h: 0,
            hash_bits,
            hash_mask: layout.hash_size - 1,
            hash_shift: hash_bits.div_ceil(MIN_MATCH),
            block_start: 0,
            match_length: 0,
            prev_match: 0,
            match_available: false,
            strstart: 0,
            match_start: 0,
            lookahead: 0,
            prev_length: 0,
            max_chain_length: 0,
            max_lazy_match: 0,
            good_match: 0,
            nice_match: 0,
            level: config.level,
            strategy: config.strategy,
            dyn_ltree,
            dyn_dtree,
            bl_tree,
            l_max_code: 0,
            d_max_code: 0,
            heap: Heap::new(heap_nodes, depth),
            cost: BlockCost::default(),
            matches: 0,
            insert: 0,
            high_water: 0,
        };
        deflater.reset();

        debug!(
            level = config.level,
            window_bits = config.window_bits,
            mem_level = config.mem_level,
            strategy = ?config.strategy,
            wrap = ?config.wrap,
            work_size = needed,
            "deflate stream initialized"
        );
        Ok(deflater)
    }

    /// Bookkeeping of the stream.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Message of the last error, if any.
    pub fn msg(&self) -> Option<&'static str> {
        self.info.msg
    }

    /// Current compression level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Current strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn fail(&mut self, err: FlateError) -> FlateError {
        self.info.msg = Some(err.message());
        err
    }

    /// Restart the stream, keeping the configuration and any gzip header.
    pub fn reset(&mut self) {
        self.reset_keep();
        self.lm_init();
        debug!(level = self.level, "deflate stream reset");
    }

    /// Restart the stream framing and block state but keep the window and
    /// hash chains, so that the history stays available for matching.
    pub fn reset_keep(&mut self) {
        let (status, adler) = if self.wrap == Wrap::Gzip {
            (DeflateStatus::GzipHeader, Crc32::IDENTITY)
        } else {
            (DeflateStatus::Init, Adler32::IDENTITY)
        };
        self.info = StreamInfo { adler, ..StreamInfo::default() };
        self.status = status;
        self.pending.reset();
        self.trailer_written = false;
        self.last_flush = None;
        self.started = false;
        self.init_block();
    }

    /// Reset the match engine for a new stream.
    fn lm_init(&mut self) {
        self.window_size = 2 * self.w_size;
        self.clear_hash();
        self.apply_level_table();
        self.strstart = 0;
        self.block_start = 0;
        self.lookahead = 0;
        self.insert = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;
        self.ins_h = 0;
    }

    fn apply_level_table(&mut self) {
        let table = &CONFIGURATION_TABLE[usize::from(self.level)];
        self.max_lazy_match = usize::from(table.max_lazy);
        self.good_match = usize::from(table.good_length);
        self.nice_match = usize::from(table.nice_length);
        self.max_chain_length = usize::from(table.max_chain);
    }

    /// Provide the gzip header to write. Only valid with gzip framing and
    /// before the first call to [`Deflater::deflate`].
    pub fn set_header(&mut self, header: GzipHeader<'a>) -> Result<()> {
        if self.wrap != Wrap::Gzip || self.status != DeflateStatus::GzipHeader {
            return Err(self.fail(FlateError::stream("gzip header must be set before compressing a gzip stream")));
        }
        if let Err(err) = header.validate() {
            return Err(self.fail(err));
        }
        self.gzhead = Some(header);
        Ok(())
    }

    /// Preload history that later matches may refer to.
    ///
    /// With zlib framing this must precede the first `deflate` call, and the
    /// dictionary's Adler-32 is announced in the header. Raw streams accept
    /// a dictionary whenever no input is buffered. Only the last window size
    /// of a longer dictionary is used.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        let wrap = self.wrap;
        if wrap == Wrap::Gzip
            || (wrap == Wrap::Zlib && self.status != DeflateStatus::Init)
            || self.lookahead != 0
        {
            return Err(self.fail(FlateError::stream("dictionary not accepted in this state")));
        }

        if wrap == Wrap::Zlib {
            self.info.adler = Adler32::update(self.info.adler, dictionary);
        }
        // No check value over the dictionary, nor input accounting.
        self.wrap = Wrap::Raw;
        let total_in = self.info.total_in;

        let mut dictionary = dictionary;
        if dictionary.len() >= self.w_size {
            if wrap == Wrap::Raw {
                self.clear_hash();
                self.strstart = 0;
                self.block_start = 0;
                self.insert = 0;
            }
            dictionary = &dictionary[dictionary.len() - self.w_size..];
        }

        let mut no_output: [u8; 0] = [];
        let mut strm = StreamBuffers::new(dictionary, &mut no_output);
        self.fill_window(&mut strm);
        while self.lookahead >= MIN_MATCH {
            let mut pos = self.strstart;
            for _ in 0..self.lookahead - (MIN_MATCH - 1) {
                self.insert_string(pos);
                pos += 1;
            }
            self.strstart = pos;
            self.lookahead = MIN_MATCH - 1;
            self.fill_window(&mut strm);
        }
        self.strstart += self.lookahead;
        self.block_start = self.strstart as isize;
        self.insert = self.lookahead;
        self.lookahead = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;

        self.info.total_in = total_in;
        self.wrap = wrap;
        Ok(())
    }

    /// Copy the current history (at most one window) into `out` and return
    /// its length.
    ///
    /// # Errors
    ///
    /// [`FlateError::Buffer`] when `out` is shorter than the history.
    pub fn get_dictionary(&self, out: &mut [u8]) -> Result<usize> {
        let end = self.strstart + self.lookahead;
        let len = end.min(self.w_size);
        if out.len() < len {
            return Err(FlateError::Buffer);
        }
        out[..len].copy_from_slice(&self.window[end - len..end]);
        Ok(len)
    }

    /// Change level and strategy mid-stream.
    ///
    /// When the block compressor changes, the data buffered so far is first
    /// compressed with the old parameters through a [`Flush::Block`] call on
    /// `buffers`.
    ///
    /// # Errors
    ///
    /// [`FlateError::Buffer`] when that flush could not complete; the
    /// parameters are left unchanged and the call may be repeated with more
    /// output space.
    pub fn params(&mut self, buffers: &mut StreamBuffers<'_, '_>, level: u8, strategy: Strategy) -> Result<()> {
        if level > 9 {
            return Err(self.fail(FlateError::config("compression level must be 0-9")));
        }

        let func = CONFIGURATION_TABLE[usize::from(self.level)].func;
        if (strategy != self.strategy || func != CONFIGURATION_TABLE[usize::from(level)].func) && self.started {
            if let Err(err @ FlateError::Stream { .. }) = self.deflate(buffers, Flush::Block) {
                return Err(err);
            }
            let buffered = (self.strstart as isize - self.block_start) as usize + self.lookahead;
            if buffers.avail_in() != 0 || buffered != 0 {
                return Err(self.fail(FlateError::Buffer));
            }
        }

        if self.level != level {
            if self.level == 0 && self.matches != 0 {
                if self.matches == 1 {
                    self.slide_hash();
                } else {
                    self.clear_hash();
                }
                self.matches = 0;
            }
            self.level = level;
            self.apply_level_table();
        }
        self.strategy = strategy;
        debug!(level, ?strategy, "deflate parameters changed");
        Ok(())
    }

    /// Override the match finder tuning of the current level.
    pub fn tune(&mut self, good_length: usize, max_lazy: usize, nice_length: usize, max_chain: usize) {
        self.good_match = good_length;
        self.max_lazy_match = max_lazy;
        self.nice_match = nice_length;
        self.max_chain_length = max_chain;
    }

    /// Insert up to 16 raw bits into the output ahead of the next block.
    pub fn prime(&mut self, bits: u32, value: u32) -> Result<()> {
        if bits > 16 {
            return Err(self.fail(FlateError::config("at most 16 bits can be primed")));
        }
        if self.pending.headroom() < 2 {
            return Err(self.fail(FlateError::Buffer));
        }
        let (mut bits, mut value) = (bits, value);
        loop {
            let put = self.pending.prime_bits(bits, value);
            value >>= put;
            bits -= put;
            if bits == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Output not yet delivered: whole bytes and bits in the accumulator.
    pub fn pending(&self) -> (usize, u32) {
        (self.pending.len(), self.pending.bits())
    }

    /// Upper bound on the compressed size of `source_len` bytes with this
    /// stream's parameters, framing and header, for a stream compressed
    /// without intermediate flushes.
    pub fn bound(&self, source_len: usize) -> usize {
        let wrap_len = match self.wrap {
            Wrap::Raw | Wrap::Auto => 0,
            Wrap::Zlib => 6 + if self.strstart != 0 { 4 } else { 0 },
            Wrap::Gzip => 8 + self.gzhead.unwrap_or_default().encoded_len(),
        };
        crate::bound::deflate_bound(source_len, usize::from(self.w_bits), self.hash_bits, self.level)
            + wrap_len
    }

    /// Release the stream.
    ///
    /// # Errors
    ///
    /// [`FlateError::Data`] when the stream was still compressing: input or
    /// output was discarded.
    pub fn end(self) -> Result<()> {
        if self.status == DeflateStatus::Busy {
            return Err(FlateError::data("stream freed prematurely"));
        }
        Ok(())
    }

    /// Copy as much pending output as fits to the caller.
    pub(crate) fn flush_pending(&mut self, strm: &mut StreamBuffers<'_, '_>) {
        let copied = self.pending.drain_into(strm);
        self.info.total_out += copied as u64;
    }

    /// Update the gzip header CRC with the pending bytes from `beg` on.
    fn hcrc_update(&mut self, beg: usize, hcrc: bool) {
        if hcrc && self.pending.len() > beg {
            self.info.adler = Crc32::update(self.info.adler, self.pending.since(beg));
        }
    }

    /// The XFL byte: 2 for best compression, 4 for fastest.
    fn gzip_xfl(&self) -> u8 {
        if self.level == 9 {
            2
        } else if self.fast_header_level() {
            4
        } else {
            0
        }
    }

    fn fast_header_level(&self) -> bool {
        matches!(self.strategy, Strategy::HuffmanOnly | Strategy::Rle | Strategy::Fixed) || self.level < 2
    }

    /// Write whatever header is still owed. Returns false when pending
    /// output could not be delivered, in which case the call must return.
    fn write_header(&mut self, strm: &mut StreamBuffers<'_, '_>) -> bool {
        if self.status == DeflateStatus::Init && self.wrap == Wrap::Raw {
            self.status = DeflateStatus::Busy;
        }

        if self.status == DeflateStatus::Init {
            let mut header = (u16::from(CM_DEFLATE) + (u16::from(self.w_bits - 8) << 4)) << 8;
            let level_flags: u16 = if self.fast_header_level() {
                0
            } else if self.level < 6 {
                1
            } else if self.level == 6 {
                2
            } else {
                3
            };
            header |= level_flags << 6;
            if self.strstart != 0 {
                header |= PRESET_DICT;
            }
            header += 31 - (header % 31);
            self.pending.put_short_msb(header);

            if self.strstart != 0 {
                let dict_id = self.info.adler;
                self.pending.put_short_msb((dict_id >> 16) as u16);
                self.pending.put_short_msb(dict_id as u16);
            }
            self.info.adler = Adler32::IDENTITY;
            self.status = DeflateStatus::Busy;

            self.flush_pending(strm);
            if !self.pending.is_empty() {
                return false;
            }
        }

        if self.status == DeflateStatus::GzipHeader {
            self.info.adler = Crc32::IDENTITY;
            self.pending.put_bytes(&[0x1F, 0x8B, CM_DEFLATE]);
            let xfl = self.gzip_xfl();
            match self.gzhead {
                None => {
                    self.pending.put_bytes(&[0, 0, 0, 0, 0, xfl, OS_CODE]);
                    self.status = DeflateStatus::Busy;
                    self.flush_pending(strm);
                    if !self.pending.is_empty() {
                        return false;
                    }
                }
                Some(head) => {
                    self.pending.put_byte(head.flags());
                    self.pending.put_bytes(&head.mtime.to_le_bytes());
                    self.pending.put_byte(xfl);
                    self.pending.put_byte(head.os);
                    if let Some(extra) = head.extra {
                        self.pending.put_short(extra.len() as u16);
                    }
                    if head.hcrc {
                        self.info.adler = Crc32::update(self.info.adler, self.pending.since(0));
                    }
                    self.gzindex = 0;
                    self.status = DeflateStatus::Extra;
                }
            }
        }

        let Some(head) = self.gzhead else {
            return true;
        };

        if self.status == DeflateStatus::Extra {
            if let Some(extra) = head.extra {
                let mut beg = self.pending.len();
                let mut left = extra.len() - self.gzindex;
                while self.pending.len() + left > self.pending.capacity() {
                    let copy = self.pending.capacity() - self.pending.len();
                    self.pending.put_bytes(&extra[self.gzindex..self.gzindex + copy]);
                    self.hcrc_update(beg, head.hcrc);
                    self.gzindex += copy;
                    self.flush_pending(strm);
                    if !self.pending.is_empty() {
                        return false;
                    }
                    beg = 0;
                    left -= copy;
                }
                self.pending.put_bytes(&extra[self.gzindex..self.gzindex + left]);
                self.hcrc_update(beg, head.hcrc);
                self.gzindex = 0;
            }
            self.status = DeflateStatus::Name;
        }

        if self.status == DeflateStatus::Name {
            if let Some(name) = head.name {
                if !self.put_zero_terminated(strm, name, head.hcrc) {
                    return false;
                }
            }
            self.status = DeflateStatus::Comment;
        }

        if self.status == DeflateStatus::Comment {
            if let Some(comment) = head.comment {
                if !self.put_zero_terminated(strm, comment, head.hcrc) {
                    return false;
                }
            }
            self.status = DeflateStatus::Hcrc;
        }

        if self.status == DeflateStatus::Hcrc {
            if head.hcrc {
                if self.pending.len() + 2 > self.pending.capacity() {
                    self.flush_pending(strm);
                    if !self.pending.is_empty() {
                        return false;
                    }
                }
                self.pending.put_short(self.info.adler as u16);
                self.info.adler = Crc32::IDENTITY;
            }
            self.status = DeflateStatus::Busy;
            self.flush_pending(strm);
            if !self.pending.is_empty() {
                return false;
            }
        }
        true
    }

    /// Write `field` and its terminating zero, resuming at `gzindex`.
    fn put_zero_terminated(&mut self, strm: &mut StreamBuffers<'_, '_>, field: &[u8], hcrc: bool) -> bool {
        let mut beg = self.pending.len();
        loop {
            if self.pending.len() == self.pending.capacity() {
                self.hcrc_update(beg, hcrc);
                self.flush_pending(strm);
                if !self.pending.is_empty() {
                    return false;
                }
                beg = 0;
            }
            let val = field.get(self.gzindex).copied().unwrap_or(0);
            self.gzindex += 1;
            self.pending.put_byte(val);
            if val == 0 {
                break;
            }
        }
        self.hcrc_update(beg, hcrc);
        self.gzindex = 0;
        true
    }

    /// Run the block compressor selected by level and strategy.
    fn compress_blocks(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> BlockState {
        if self.level == 0 {
            return self.deflate_stored(strm, flush);
        }
        match self.strategy {
            Strategy::HuffmanOnly => self.deflate_huff(strm, flush),
            Strategy::Rle => self.deflate_rle(strm, flush),
            Strategy::Default | Strategy::Filtered | Strategy::Fixed => {
                match CONFIGURATION_TABLE[usize::from(self.level)].func {
                    MatchFn::Stored => self.deflate_stored(strm, flush),
                    MatchFn::Fast => self.deflate_fast(strm, flush),
                    MatchFn::Slow => self.deflate_slow(strm, flush),
                }
            }
        }
    }

    /// Compress as much as possible from `strm`, honoring `flush`.
    ///
    /// Returns [`Status::StreamEnd`] once a [`Flush::Finish`] call has
    /// written the whole trailer. A call that runs out of output space
    /// returns [`Status::Ok`] and must be repeated with the same flush.
    ///
    /// # Errors
    ///
    /// - [`FlateError::Stream`] for [`Flush::Trees`], or for any flush other
    ///   than `Finish` once finishing has started.
    /// - [`FlateError::Buffer`] when no progress is possible: no output
    ///   space, input after `Finish`, or a repeated flush with no new input.
    ///   Not fatal.
    pub fn deflate(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> Result<Status> {
        if flush == Flush::Trees {
            return Err(self.fail(FlateError::stream("Trees flush is only valid when decompressing")));
        }
        if self.status == DeflateStatus::Finish && flush != Flush::Finish {
            return Err(self.fail(FlateError::stream("stream is finishing")));
        }
        if strm.avail_out() == 0 {
            return Err(self.fail(FlateError::Buffer));
        }

        let old_flush = self.last_flush;
        self.last_flush = Some(flush);
        self.started = true;

        if !self.pending.is_empty() {
            self.flush_pending(strm);
            if strm.avail_out() == 0 {
                // Let the next call through even with the same flush.
                self.last_flush = None;
                return Ok(Status::Ok);
            }
        } else if strm.avail_in() == 0
            && old_flush.is_some_and(|old| flush.rank() <= old.rank())
            && flush != Flush::Finish
        {
            return Err(self.fail(FlateError::Buffer));
        }

        if self.status == DeflateStatus::Finish && strm.avail_in() != 0 {
            return Err(self.fail(FlateError::Buffer));
        }

        if !self.write_header(strm) {
            self.last_flush = None;
            return Ok(Status::Ok);
        }

        if strm.avail_in() != 0
            || self.lookahead != 0
            || (flush != Flush::NoFlush && self.status != DeflateStatus::Finish)
        {
            let bstate = self.compress_blocks(strm, flush);

            if matches!(bstate, BlockState::FinishStarted | BlockState::FinishDone) {
                self.status = DeflateStatus::Finish;
            }
            if matches!(bstate, BlockState::NeedMore | BlockState::FinishStarted) {
                if strm.avail_out() == 0 {
                    self.last_flush = None;
                }
                return Ok(Status::Ok);
            }
            if bstate == BlockState::BlockDone {
                match flush {
                    Flush::PartialFlush => self.pending.align(),
                    Flush::Block => {}
                    _ => {
                        // Empty stored block: byte alignment and the
                        // 00 00 FF FF marker.
                        self.pending.stored_block(&[], false);
                        if flush == Flush::FullFlush {
                            self.clear_hash();
                            if self.lookahead == 0 {
                                self.strstart = 0;
                                self.block_start = 0;
                                self.insert = 0;
                            }
                        }
                    }
                }
                self.flush_pending(strm);
                if strm.avail_out() == 0 {
                    self.last_flush = None;
                    return Ok(Status::Ok);
                }
            }
        }

        if flush != Flush::Finish {
            return Ok(Status::Ok);
        }
        if self.wrap == Wrap::Raw || self.trailer_written {
            return Ok(Status::StreamEnd);
        }

        let check = self.info.adler;
        if self.wrap == Wrap::Gzip {
            self.pending.put_bytes(&check.to_le_bytes());
            self.pending.put_bytes(&(self.info.total_in as u32).to_le_bytes());
        } else {
            self.pending.put_short_msb((check >> 16) as u16);
            self.pending.put_short_msb(check as u16);
        }
        self.flush_pending(strm);
        self.trailer_written = true;

        if self.pending.is_empty() {
            Ok(Status::StreamEnd)
        } else {
            Ok(Status::Ok)
        }
    }

    /// Content type guessed from the first block.
    pub fn data_type(&self) -> DataType {
        self.info.data_type
    }
}

impl StreamCodec for Deflater<'_> {
    fn process(&mut self, buffers: &mut StreamBuffers<'_, '_>, flush: Flush) -> Result<Status> {
        self.deflate(buffers, flush)
    }

    fn info(&self) -> &StreamInfo {
        &self.info
    }
}
