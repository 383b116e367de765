//! Streaming DEFLATE decompressor.
//!
//! An [`Inflater`] carves its window and decoding tables out of an [`Arena`]
//! once and then decodes through repeated calls to [`Inflater::inflate`].
//! Every mode below can suspend when input or output runs out and resume on
//! the next call exactly where it stopped.
//!
//! ## Modes
//!
//! ```text
//! Head ─┬─ zlib ─────────────── [DictId → Dict] ──┐
//!       └─ gzip: Flags → Time → Os → ExLen → Extra │
//!                → Name → Comment → HCrc ─────────┤
//!                                                 ▼
//!     ┌──────────────────────────────────────── Type ◄────────────┐
//!     ▼                  ▼                         ▼              │
//!   Stored → Copy    Table → LenLens → CodeLens   (fixed)         │
//!     │                       └──────────┬─────────┘              │
//!     │                                  ▼                        │
//!     │              Len → LenExt → Dist → DistExt → Match ───────┤
//!     │               └─→ Lit ──────────────────────────────────┤
//!     └─────────────────────────────────────────────────────────┘
//!   (last block) → Check → Length → Done
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::{Arena, Flush, Status};
//! use oxiflate_deflate::{InflateConfig, Inflater, StreamBuffers, bound};
//!
//! // An empty zlib stream made of one stored block.
//! let compressed = [0x78, 0x01, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01];
//!
//! let mut work = vec![0u8; bound::inflate_work_size(15).unwrap()];
//! let mut arena = Arena::new(&mut work);
//! let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
//!
//! let mut output = [0u8; 16];
//! let mut buffers = StreamBuffers::new(&compressed, &mut output);
//! assert_eq!(inflater.inflate(&mut buffers, Flush::Finish).unwrap(), Status::StreamEnd);
//! assert_eq!(buffers.produced(), 0);
//! ```

mod inffast;
mod inftrees;

use crate::config::{InflateConfig, MAX_WBITS, Wrap};
use crate::gzip::flags::{FCOMMENT, FEXTRA, FHCRC, FNAME, FTEXT, RESERVED};
use crate::gzip::{CM_DEFLATE, GZIP_MAGIC, GzipHeaderSink};
use crate::stream::{StreamBuffers, StreamCodec, StreamInfo};
use crate::tables::{BL_CODES, BL_ORDER};
use inffast::{FAST_MIN_INPUT, FAST_MIN_OUTPUT, copy_match};
use inftrees::{
    CODES_ROOT, Code, CodeKind, DIST_ROOT, DISTFIX, ENOUGH, LEN_ROOT, LENFIX, OP_END, OP_INVALID,
    build_table,
};
use oxiflate_core::arena::{Arena, region_size, total_size};
use oxiflate_core::checksum::{Adler32, Checksum, Crc32};
use oxiflate_core::error::{FlateError, Result};
use oxiflate_core::flush::{Flush, Status};
use tracing::{debug, trace};

/// Preset dictionary flag in the zlib header.
const FDICT: u64 = 0x20;

/// Code lengths kept for one dynamic block: 286 literal/length and 30
/// distance codes, plus slack for the code length code.
const LENS_SIZE: usize = 320;

/// Sort scratch for table building.
const WORK_SIZE: usize = 288;

/// Sizes of the arena regions of a decompressor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InflateLayout {
    w_size: usize,
}

impl InflateLayout {
    pub(crate) fn new(window_bits: u8) -> Self {
        Self {
            w_size: 1 << window_bits,
        }
    }

    /// Worst-case arena bytes, in reservation order.
    pub(crate) fn work_size(&self) -> Option<usize> {
        total_size(&[
            region_size::<u8>(self.w_size),
            region_size::<u16>(LENS_SIZE),
            region_size::<u16>(WORK_SIZE),
            region_size::<Code>(ENOUGH),
        ])
    }
}

/// Decoder state. The order matters: everything from `Check` on is past
/// the compressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Mode {
    Head,
    Flags,
    Time,
    Os,
    ExLen,
    Extra,
    Name,
    Comment,
    HCrc,
    DictId,
    Dict,
    /// At a block boundary; stops here for block flushes.
    Type,
    /// At a block boundary, not stopping.
    TypeDo,
    Stored,
    CopyStart,
    Copy,
    Table,
    LenLens,
    CodeLens,
    LenStart,
    Len,
    LenExt,
    Dist,
    DistExt,
    Match,
    Lit,
    Check,
    Length,
    Done,
    Bad,
    /// Searching for a full flush point.
    Sync,
}

/// Where the current literal/length or distance table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeTable {
    Fixed,
    Dynamic(usize),
}

fn table_slice<'c>(codes: &'c [Code], table: CodeTable, fixed: &'static [Code]) -> &'c [Code] {
    match table {
        CodeTable::Fixed => fixed,
        CodeTable::Dynamic(offset) => &codes[offset..],
    }
}

/// Why the mode loop returned.
enum Leave {
    /// Out of input or output, or stopped at a block boundary.
    Suspend,
    End,
    NeedDict,
    Bad,
    Sync,
}

#[derive(Debug, Clone, Copy)]
enum HeaderField {
    Name,
    Comment,
}

/// Streaming DEFLATE decompressor over arena-carved buffers.
#[derive(Debug)]
pub struct Inflater<'a> {
    info: StreamInfo,
    mode: Mode,
    /// Configuration of the stream, restored on reset.
    config: InflateConfig,
    /// Framing in effect; a resync before any header switches to raw.
    wrap: Wrap,
    /// Verify check values and header CRC.
    verify: bool,
    last: bool,
    havedict: bool,
    /// `None` before a header was read, `Some(0)` for zlib, otherwise the
    /// gzip method and flag bytes.
    flags: Option<u16>,
    check: u32,
    /// Output bytes, for the gzip length check.
    total: u64,
    head: Option<GzipHeaderSink<'a>>,

    wbits: u8,
    /// Window size in use; zero until the window first receives data.
    wsize: usize,
    whave: usize,
    wnext: usize,
    window: &'a mut [u8],

    hold: u64,
    bits: u32,

    /// Literal, copy or match length, or header field progress.
    length: usize,
    offset: usize,
    extra: u32,

    lencode: CodeTable,
    distcode: CodeTable,
    lenbits: u32,
    distbits: u32,
    ncode: usize,
    nlen: usize,
    ndist: usize,
    /// Code lengths read so far, or bytes matched by a sync search.
    have: usize,
    next: usize,
    lens: &'a mut [u16],
    work: &'a mut [u16],
    codes: &'a mut [Code],

    /// Bits consumed by the current symbol, or -1 at a block boundary.
    back: i32,
    /// Full length of the current match.
    was: usize,
}

impl<'a> Inflater<'a> {
    /// Create a decompressor, carving its buffers from `arena`.
    ///
    /// # Errors
    ///
    /// [`FlateError::Config`] for invalid parameters and
    /// [`FlateError::ArenaTooSmall`] when fewer bytes than
    /// [`crate::bound::inflate_work_size`] remain in the arena. In both cases
    /// the arena is untouched.
    pub fn new(arena: &mut Arena<'a>, config: InflateConfig) -> Result<Self> {
        Self::with_version(arena, config, crate::VERSION)
    }

    /// Create a decompressor after checking that `version`, the library
    /// version the caller was built against, is compatible.
    pub fn with_version(arena: &mut Arena<'a>, config: InflateConfig, version: &'static str) -> Result<Self> {
        crate::check_version(version)?;
        let config = config.validate()?;

        let layout = InflateLayout::new(config.window_bits);
        let needed = layout
            .work_size()
            .ok_or(FlateError::arena_too_small(usize::MAX, arena.remaining()))?;
        arena.ensure_capacity(needed)?;

        let window = arena.reserve::<u8>(layout.w_size)?;
        let lens = arena.reserve::<u16>(LENS_SIZE)?;
        let work = arena.reserve::<u16>(WORK_SIZE)?;
        let codes = arena.reserve::<Code>(ENOUGH)?;

        let mut inflater = Self {
            info: StreamInfo::default(),
            mode: Mode::Head,
            config,
            wrap: config.wrap,
            verify: config.wrap != Wrap::Raw,
            last: false,
            havedict: false,
            flags: None,
            check: 0,
            total: 0,
            head: None,
            wbits: config.window_bits,
            wsize: 0,
            whave: 0,
            wnext: 0,
            window,
            hold: 0,
            bits: 0,
            length: 0,
            offset: 0,
            extra: 0,
            lencode: CodeTable::Dynamic(0),
            distcode: CodeTable::Dynamic(0),
            lenbits: 0,
            distbits: 0,
            ncode: 0,
            nlen: 0,
            ndist: 0,
            have: 0,
            next: 0,
            lens,
            work,
            codes,
            back: -1,
            was: 0,
        };
        inflater.reset();

        debug!(
            window_bits = config.window_bits,
            wrap = ?config.wrap,
            work_size = needed,
            "inflate stream initialized"
        );
        Ok(inflater)
    }

    /// Bookkeeping of the stream.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Message of the last data error, if any.
    pub fn msg(&self) -> Option<&'static str> {
        self.info.msg
    }

    /// Restart the stream and forget the window.
    pub fn reset(&mut self) {
        self.wsize = 0;
        self.whave = 0;
        self.wnext = 0;
        self.reset_keep();
        debug!("inflate stream reset");
    }

    /// Restart the stream, keeping the window contents for a following
    /// stream that refers back into them. A header sink stays attached and
    /// is cleared.
    pub fn reset_keep(&mut self) {
        self.wrap = self.config.wrap;
        self.verify = self.wrap != Wrap::Raw;
        self.restart();
        if let Some(head) = self.head.as_mut() {
            head.clear();
        }
    }

    /// Restart with a new framing and window size.
    ///
    /// # Errors
    ///
    /// [`FlateError::Config`] when the parameters are invalid or ask for a
    /// larger window than was carved at creation.
    pub fn reset_with(&mut self, config: InflateConfig) -> Result<()> {
        let config = config.validate()?;
        if 1usize << config.window_bits > self.window.len() {
            return Err(FlateError::config("window larger than the one carved at creation"));
        }
        self.config = config;
        self.wbits = config.window_bits;
        self.reset();
        Ok(())
    }

    fn restart(&mut self) {
        self.info.total_in = 0;
        self.info.total_out = 0;
        self.info.msg = None;
        self.total = 0;
        if self.wrap != Wrap::Raw {
            self.info.adler = u32::from(matches!(self.wrap, Wrap::Zlib | Wrap::Auto));
        }
        self.mode = Mode::Head;
        self.last = false;
        self.havedict = false;
        self.flags = None;
        self.hold = 0;
        self.bits = 0;
        self.lencode = CodeTable::Dynamic(0);
        self.distcode = CodeTable::Dynamic(0);
        self.next = 0;
        self.back = -1;
    }

    /// Capture the gzip header of the stream into `sink`.
    ///
    /// # Errors
    ///
    /// [`FlateError::Stream`] unless gzip framing is accepted.
    pub fn set_header_sink(&mut self, mut sink: GzipHeaderSink<'a>) -> Result<()> {
        if !matches!(self.wrap, Wrap::Gzip | Wrap::Auto) {
            return Err(FlateError::stream("header sink needs gzip framing"));
        }
        sink.clear();
        self.head = Some(sink);
        Ok(())
    }

    /// The attached header sink.
    pub fn header(&self) -> Option<&GzipHeaderSink<'a>> {
        self.head.as_ref()
    }

    /// Detach and return the header sink.
    pub fn take_header(&mut self) -> Option<GzipHeaderSink<'a>> {
        self.head.take()
    }

    /// Supply the preset dictionary. For zlib streams this is only valid
    /// right after [`Status::NeedDict`]; raw streams accept it before
    /// decoding starts.
    ///
    /// # Errors
    ///
    /// [`FlateError::Stream`] when no dictionary is expected, and
    /// [`FlateError::Data`] when its Adler-32 does not match the id in the
    /// header.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        if self.wrap != Wrap::Raw && self.mode != Mode::Dict {
            return Err(FlateError::stream("dictionary not expected"));
        }
        if self.mode == Mode::Dict && Adler32::compute(dictionary) != self.check {
            return Err(FlateError::data("incorrect dictionary"));
        }
        self.update_window(dictionary);
        self.havedict = true;
        trace!(len = dictionary.len(), "dictionary set");
        Ok(())
    }

    /// Copy the window contents, oldest first, into `out` and return their
    /// length.
    ///
    /// # Errors
    ///
    /// [`FlateError::Buffer`] when `out` is shorter than the history.
    pub fn get_dictionary(&self, out: &mut [u8]) -> Result<usize> {
        let (whave, wnext) = (self.whave, self.wnext);
        if out.len() < whave {
            return Err(FlateError::Buffer);
        }
        out[..whave - wnext].copy_from_slice(&self.window[wnext..whave]);
        out[whave - wnext..whave].copy_from_slice(&self.window[..wnext]);
        Ok(whave)
    }

    /// Insert up to 16 bits ahead of the next input byte.
    ///
    /// # Errors
    ///
    /// [`FlateError::Config`] for more than 16 bits, and
    /// [`FlateError::Stream`] when the bit accumulator would overflow.
    pub fn prime(&mut self, bits: u32, value: u32) -> Result<()> {
        if bits == 0 {
            return Ok(());
        }
        if bits > 16 {
            return Err(FlateError::config("at most 16 bits can be primed"));
        }
        if self.bits + bits > 32 {
            return Err(FlateError::stream("bit accumulator full"));
        }
        let value = u64::from(value) & ((1 << bits) - 1);
        self.hold += value << self.bits;
        self.bits += bits;
        Ok(())
    }

    /// Drop all bits in the accumulator.
    pub fn clear_bits(&mut self) {
        self.hold = 0;
        self.bits = 0;
    }

    /// Skip input up to and including the next `00 00 FF FF` marker that a
    /// full flush leaves, then restart decoding at the following block.
    ///
    /// The search state survives across calls, so a marker split between
    /// inputs is still found. Totals are kept; the window is forgotten and
    /// check values are no longer verified. A stream without a header yet
    /// continues as raw deflate.
    ///
    /// # Errors
    ///
    /// [`FlateError::Buffer`] when there is nothing to search, and
    /// [`FlateError::Data`] when the input ran out before a marker was
    /// found. The searched input is consumed in both cases.
    pub fn sync(&mut self, strm: &mut StreamBuffers<'_, '_>) -> Result<()> {
        if strm.avail_in() == 0 && self.bits < 8 {
            return Err(FlateError::Buffer);
        }

        if self.mode != Mode::Sync {
            self.mode = Mode::Sync;
            self.byte_bits();
            let mut buf = [0u8; 8];
            let mut len = 0;
            while self.bits >= 8 {
                buf[len] = self.hold as u8;
                len += 1;
                self.hold >>= 8;
                self.bits -= 8;
            }
            self.have = 0;
            self.sync_search(&buf[..len]);
        }

        let len = self.sync_search(strm.remaining_input());
        strm.next_in += len;
        self.info.total_in += len as u64;

        if self.have != 4 {
            return Err(FlateError::data("no full flush point found"));
        }
        if self.flags.is_none() {
            self.wrap = Wrap::Raw;
        }
        self.verify = false;

        let (flags, total_in, total_out) = (self.flags, self.info.total_in, self.info.total_out);
        self.wsize = 0;
        self.whave = 0;
        self.wnext = 0;
        self.restart();
        self.info.total_in = total_in;
        self.info.total_out = total_out;
        self.flags = flags;
        self.mode = Mode::Type;
        debug!(total_in, total_out, "resynchronized at full flush point");
        Ok(())
    }

    /// Advance the marker search over `buf`, returning the bytes examined.
    fn sync_search(&mut self, buf: &[u8]) -> usize {
        let mut got = self.have;
        let mut next = 0;
        while next < buf.len() && got < 4 {
            let want = if got < 2 { 0x00 } else { 0xFF };
            if buf[next] == want {
                got += 1;
            } else if buf[next] != 0 {
                got = 0;
            } else {
                got = 4 - got;
            }
            next += 1;
        }
        self.have = got;
        next
    }

    /// True when decoding stopped at the start of a stored block's length
    /// field, on a byte boundary: the point a full flush leaves.
    pub fn sync_point(&self) -> bool {
        self.mode == Mode::Stored && self.bits == 0
    }

    /// Decoding position inside the current symbol.
    ///
    /// The upper bits hold the input bits consumed by the current
    /// length/distance or stored block header, or -1 at a block boundary.
    /// The low 16 bits hold how much of the current copy is done.
    pub fn mark(&self) -> i64 {
        let within = match self.mode {
            Mode::Copy => self.length,
            Mode::Match => self.was - self.length,
            _ => 0,
        };
        (i64::from(self.back) << 16) + within as i64
    }

    /// Release the stream.
    pub fn end(self) -> Result<()> {
        Ok(())
    }

    fn bad(&mut self, msg: &'static str) -> Leave {
        self.mode = Mode::Bad;
        self.info.msg = Some(msg);
        debug!(msg, total_in = self.info.total_in, "invalid deflate data");
        Leave::Bad
    }

    #[inline]
    fn bits_value(&self, n: u32) -> u32 {
        (self.hold & ((1u64 << n) - 1)) as u32
    }

    #[inline]
    fn drop_bits(&mut self, n: u32) {
        self.hold >>= n;
        self.bits -= n;
    }

    #[inline]
    fn init_bits(&mut self) {
        self.hold = 0;
        self.bits = 0;
    }

    /// Discard bits up to the next byte boundary.
    #[inline]
    fn byte_bits(&mut self) {
        self.drop_bits(self.bits & 7);
    }

    #[inline]
    fn pull_byte(&mut self, strm: &mut StreamBuffers<'_, '_>) -> bool {
        match strm.input.get(strm.next_in) {
            Some(&byte) => {
                self.hold |= u64::from(byte) << self.bits;
                self.bits += 8;
                strm.next_in += 1;
                true
            }
            None => false,
        }
    }

    /// Make at least `n` bits available, or report that input ran out.
    #[inline]
    fn need_bits(&mut self, strm: &mut StreamBuffers<'_, '_>, n: u32) -> bool {
        while self.bits < n {
            if !self.pull_byte(strm) {
                return false;
            }
        }
        true
    }

    /// Look up the next code, pulling input until all its bits are there.
    fn decode(&mut self, strm: &mut StreamBuffers<'_, '_>, table: CodeTable, fixed: &'static [Code], root: u32) -> Option<Code> {
        loop {
            let here = table_slice(self.codes, table, fixed)[self.bits_value(root) as usize];
            if u32::from(here.bits) <= self.bits {
                return Some(here);
            }
            if !self.pull_byte(strm) {
                return None;
            }
        }
    }

    /// Follow the link entry `link` into its sub-table.
    fn decode_sub(
        &mut self,
        strm: &mut StreamBuffers<'_, '_>,
        table: CodeTable,
        fixed: &'static [Code],
        link: Code,
    ) -> Option<Code> {
        let (root, width) = (u32::from(link.bits), u32::from(link.bits + link.op));
        loop {
            let index = usize::from(link.val) + (self.bits_value(width) >> root) as usize;
            let here = table_slice(self.codes, table, fixed)[index];
            if root + u32::from(here.bits) <= self.bits {
                return Some(here);
            }
            if !self.pull_byte(strm) {
                return None;
            }
        }
    }

    fn gzip_flag(&self, flag: u8) -> bool {
        self.flags.is_some_and(|flags| (flags >> 8) as u8 & flag != 0)
    }

    fn header_crc(&self) -> bool {
        self.verify && self.gzip_flag(FHCRC)
    }

    /// Fold the low `n` bytes of the accumulator into the header CRC.
    fn header_word(&mut self, n: usize) {
        if self.header_crc() {
            self.check = Crc32::update(self.check, &self.hold.to_le_bytes()[..n]);
        }
    }

    fn header_bytes(&mut self, bytes: &[u8]) {
        if self.header_crc() {
            self.check = Crc32::update(self.check, bytes);
        }
    }

    /// Consume a zero-terminated header field. False while the terminator
    /// has not arrived.
    fn header_string(&mut self, strm: &mut StreamBuffers<'_, '_>, field: HeaderField) -> bool {
        let input = strm.remaining_input();
        let (copy, done) = match input.iter().position(|&b| b == 0) {
            Some(zero) => (zero + 1, true),
            None => (input.len(), false),
        };
        if let Some(head) = self.head.as_mut() {
            let sink = match field {
                HeaderField::Name => &mut head.name,
                HeaderField::Comment => &mut head.comment,
            };
            if self.length == 0 {
                sink.begin();
            }
            sink.extend(&input[..copy - usize::from(done)]);
        }
        self.length += copy;
        self.header_bytes(&input[..copy]);
        strm.next_in += copy;
        done
    }

    /// Running check of the uncompressed data: CRC-32 for gzip, Adler-32
    /// otherwise.
    fn fold_check(&self, check: u32, data: &[u8]) -> u32 {
        if self.flags.is_some_and(|flags| flags != 0) {
            Crc32::update(check, data)
        } else {
            Adler32::update(check, data)
        }
    }

    /// Append output to the circular window.
    fn update_window(&mut self, data: &[u8]) {
        if self.wsize == 0 {
            self.wsize = 1 << self.wbits;
            self.wnext = 0;
            self.whave = 0;
        }
        let wsize = self.wsize;

        if data.len() >= wsize {
            self.window[..wsize].copy_from_slice(&data[data.len() - wsize..]);
            self.wnext = 0;
            self.whave = wsize;
            return;
        }

        let dist = (wsize - self.wnext).min(data.len());
        self.window[self.wnext..self.wnext + dist].copy_from_slice(&data[..dist]);
        let rest = data.len() - dist;
        if rest > 0 {
            self.window[..rest].copy_from_slice(&data[dist..]);
            self.wnext = rest;
            self.whave = wsize;
        } else {
            self.wnext += dist;
            if self.wnext == wsize {
                self.wnext = 0;
            }
            if self.whave < wsize {
                self.whave += dist;
            }
        }
    }

    /// Decompress as much as the buffers allow.
    ///
    /// `Flush::Block` and `Flush::Trees` stop at the next block boundary,
    /// and `Flush::Trees` also right after a block header. `Flush::Finish`
    /// only changes the outcome: running out of room is then an error.
    ///
    /// # Errors
    ///
    /// - [`FlateError::Data`]: invalid compressed data; see [`Self::msg`]
    /// - [`FlateError::Buffer`]: no progress was possible, or the stream
    ///   did not end under `Flush::Finish`
    /// - [`FlateError::Stream`]: called while a [`Self::sync`] search is
    ///   pending
    pub fn inflate(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush) -> Result<Status> {
        if self.mode == Mode::Type {
            self.mode = Mode::TypeDo;
        }
        let in_start = strm.next_in;
        let out_start = strm.next_out;
        let mut out_base = out_start;

        let leave = self.run(strm, flush, out_start, &mut out_base);

        let produced = &strm.output[out_base..strm.next_out];
        if self.wsize != 0
            || (!produced.is_empty()
                && self.mode < Mode::Bad
                && (self.mode < Mode::Check || flush != Flush::Finish))
        {
            self.update_window(produced);
        }

        let consumed = strm.next_in - in_start;
        self.info.total_in += consumed as u64;
        self.info.total_out += produced.len() as u64;
        self.total += produced.len() as u64;
        if self.verify && !produced.is_empty() {
            self.check = self.fold_check(self.check, produced);
            self.info.adler = self.check;
        }

        let progress = consumed != 0 || strm.next_out != out_start;
        match leave {
            Leave::End => Ok(Status::StreamEnd),
            Leave::NeedDict => Ok(Status::NeedDict),
            Leave::Bad => Err(FlateError::data(self.info.msg.unwrap_or("invalid deflate data"))),
            Leave::Sync => Err(FlateError::stream("resynchronization pending")),
            Leave::Suspend if !progress || flush == Flush::Finish => Err(FlateError::Buffer),
            Leave::Suspend => Ok(Status::Ok),
        }
    }

    /// The mode loop. Output written since `out_base` is not yet folded into
    /// the totals and check value.
    fn run(&mut self, strm: &mut StreamBuffers<'_, '_>, flush: Flush, out_start: usize, out_base: &mut usize) -> Leave {
        loop {
            match self.mode {
                Mode::Head => {
                    if self.wrap == Wrap::Raw {
                        self.mode = Mode::TypeDo;
                        continue;
                    }
                    if !self.need_bits(strm, 16) {
                        return Leave::Suspend;
                    }
                    if matches!(self.wrap, Wrap::Gzip | Wrap::Auto) && self.hold == 0x8B1F {
                        self.check = Crc32::update(Crc32::IDENTITY, &GZIP_MAGIC);
                        self.init_bits();
                        self.mode = Mode::Flags;
                        continue;
                    }
                    let (cmf, flg) = (self.hold & 0xFF, (self.hold >> 8) & 0xFF);
                    if self.wrap == Wrap::Gzip || ((cmf << 8) + flg) % 31 != 0 {
                        return self.bad("incorrect header check");
                    }
                    if cmf & 0x0F != u64::from(CM_DEFLATE) {
                        return self.bad("unknown compression method");
                    }
                    let len = (cmf >> 4) + 8;
                    if len > u64::from(MAX_WBITS) || len > u64::from(self.wbits) {
                        return self.bad("invalid window size");
                    }
                    trace!(window_bits = len, "zlib header ok");
                    self.flags = Some(0);
                    self.check = Adler32::IDENTITY;
                    self.info.adler = self.check;
                    self.mode = if flg & FDICT != 0 { Mode::DictId } else { Mode::Type };
                    self.init_bits();
                }
                Mode::Flags => {
                    if !self.need_bits(strm, 16) {
                        return Leave::Suspend;
                    }
                    let flags = self.hold as u16;
                    self.flags = Some(flags);
                    if flags & 0xFF != u16::from(CM_DEFLATE) {
                        return self.bad("unknown compression method");
                    }
                    if (flags >> 8) as u8 & RESERVED != 0 {
                        return self.bad("unknown header flags set");
                    }
                    if let Some(head) = self.head.as_mut() {
                        head.text = (flags >> 8) as u8 & FTEXT != 0;
                    }
                    self.header_word(2);
                    self.init_bits();
                    self.mode = Mode::Time;
                }
                Mode::Time => {
                    if !self.need_bits(strm, 32) {
                        return Leave::Suspend;
                    }
                    if let Some(head) = self.head.as_mut() {
                        head.mtime = self.hold as u32;
                    }
                    self.header_word(4);
                    self.init_bits();
                    self.mode = Mode::Os;
                }
                Mode::Os => {
                    if !self.need_bits(strm, 16) {
                        return Leave::Suspend;
                    }
                    if let Some(head) = self.head.as_mut() {
                        head.xflags = self.hold as u8;
                        head.os = (self.hold >> 8) as u8;
                    }
                    self.header_word(2);
                    self.init_bits();
                    self.mode = Mode::ExLen;
                }
                Mode::ExLen => {
                    if self.gzip_flag(FEXTRA) {
                        if !self.need_bits(strm, 16) {
                            return Leave::Suspend;
                        }
                        self.length = (self.hold & 0xFFFF) as usize;
                        if let Some(head) = self.head.as_mut() {
                            head.extra.begin();
                        }
                        self.header_word(2);
                        self.init_bits();
                    }
                    self.mode = Mode::Extra;
                }
                Mode::Extra => {
                    if self.gzip_flag(FEXTRA) {
                        let copy = self.length.min(strm.avail_in());
                        if copy > 0 {
                            let bytes = &strm.remaining_input()[..copy];
                            if let Some(head) = self.head.as_mut() {
                                head.extra.extend(bytes);
                            }
                            self.header_bytes(bytes);
                            strm.next_in += copy;
                            self.length -= copy;
                        }
                        if self.length != 0 {
                            return Leave::Suspend;
                        }
                    }
                    self.length = 0;
                    self.mode = Mode::Name;
                }
                Mode::Name => {
                    if self.gzip_flag(FNAME)
                        && (strm.avail_in() == 0 || !self.header_string(strm, HeaderField::Name))
                    {
                        return Leave::Suspend;
                    }
                    self.length = 0;
                    self.mode = Mode::Comment;
                }
                Mode::Comment => {
                    if self.gzip_flag(FCOMMENT)
                        && (strm.avail_in() == 0 || !self.header_string(strm, HeaderField::Comment))
                    {
                        return Leave::Suspend;
                    }
                    self.length = 0;
                    self.mode = Mode::HCrc;
                }
                Mode::HCrc => {
                    let hcrc = self.gzip_flag(FHCRC);
                    if hcrc {
                        if !self.need_bits(strm, 16) {
                            return Leave::Suspend;
                        }
                        if self.verify && self.hold & 0xFFFF != u64::from(self.check & 0xFFFF) {
                            return self.bad("header crc mismatch");
                        }
                        self.init_bits();
                    }
                    if let Some(head) = self.head.as_mut() {
                        head.hcrc = hcrc;
                        head.done = true;
                    }
                    trace!("gzip header ok");
                    self.check = Crc32::IDENTITY;
                    self.info.adler = self.check;
                    self.mode = Mode::Type;
                }
                Mode::DictId => {
                    if !self.need_bits(strm, 32) {
                        return Leave::Suspend;
                    }
                    self.check = (self.hold as u32).swap_bytes();
                    self.info.adler = self.check;
                    self.init_bits();
                    self.mode = Mode::Dict;
                }
                Mode::Dict => {
                    if !self.havedict {
                        return Leave::NeedDict;
                    }
                    self.check = Adler32::IDENTITY;
                    self.info.adler = self.check;
                    self.mode = Mode::Type;
                }
                Mode::Type => {
                    if matches!(flush, Flush::Block | Flush::Trees) {
                        return Leave::Suspend;
                    }
                    self.mode = Mode::TypeDo;
                }
                Mode::TypeDo => {
                    if self.last {
                        self.byte_bits();
                        self.mode = Mode::Check;
                        continue;
                    }
                    if !self.need_bits(strm, 3) {
                        return Leave::Suspend;
                    }
                    self.last = self.hold & 1 != 0;
                    self.drop_bits(1);
                    match self.bits_value(2) {
                        0 => self.mode = Mode::Stored,
                        1 => {
                            trace!(last = self.last, "fixed block");
                            self.lencode = CodeTable::Fixed;
                            self.lenbits = LEN_ROOT;
                            self.distcode = CodeTable::Fixed;
                            self.distbits = 5;
                            self.mode = Mode::LenStart;
                            if flush == Flush::Trees {
                                self.drop_bits(2);
                                return Leave::Suspend;
                            }
                        }
                        2 => self.mode = Mode::Table,
                        _ => {
                            self.drop_bits(2);
                            return self.bad("invalid block type");
                        }
                    }
                    self.drop_bits(2);
                }
                Mode::Stored => {
                    self.byte_bits();
                    if !self.need_bits(strm, 32) {
                        return Leave::Suspend;
                    }
                    let word = self.hold as u32;
                    if word & 0xFFFF != (word >> 16) ^ 0xFFFF {
                        return self.bad("invalid stored block lengths");
                    }
                    self.length = (word & 0xFFFF) as usize;
                    trace!(last = self.last, len = self.length, "stored block");
                    self.init_bits();
                    self.mode = Mode::CopyStart;
                    if flush == Flush::Trees {
                        return Leave::Suspend;
                    }
                }
                Mode::CopyStart => self.mode = Mode::Copy,
                Mode::Copy => {
                    if self.length == 0 {
                        self.mode = Mode::Type;
                        continue;
                    }
                    let copy = self.length.min(strm.avail_in()).min(strm.avail_out());
                    if copy == 0 {
                        return Leave::Suspend;
                    }
                    strm.pass_through(copy);
                    self.length -= copy;
                }
                Mode::Table => {
                    if !self.need_bits(strm, 14) {
                        return Leave::Suspend;
                    }
                    self.nlen = self.bits_value(5) as usize + 257;
                    self.drop_bits(5);
                    self.ndist = self.bits_value(5) as usize + 1;
                    self.drop_bits(5);
                    self.ncode = self.bits_value(4) as usize + 4;
                    self.drop_bits(4);
                    if self.nlen > 286 || self.ndist > 30 {
                        return self.bad("too many length or distance symbols");
                    }
                    self.have = 0;
                    self.mode = Mode::LenLens;
                }
                Mode::LenLens => {
                    while self.have < self.ncode {
                        if !self.need_bits(strm, 3) {
                            return Leave::Suspend;
                        }
                        self.lens[BL_ORDER[self.have]] = self.bits_value(3) as u16;
                        self.have += 1;
                        self.drop_bits(3);
                    }
                    while self.have < BL_CODES {
                        self.lens[BL_ORDER[self.have]] = 0;
                        self.have += 1;
                    }
                    let built = build_table(CodeKind::Codes, &self.lens[..BL_CODES], self.codes, CODES_ROOT, self.work);
                    let Some((used, root)) = built else {
                        return self.bad("invalid code lengths set");
                    };
                    self.lencode = CodeTable::Dynamic(0);
                    self.lenbits = root;
                    self.next = used;
                    self.have = 0;
                    self.mode = Mode::CodeLens;
                }
                Mode::CodeLens => {
                    while self.have < self.nlen + self.ndist {
                        let Some(here) = self.decode(strm, self.lencode, &LENFIX, self.lenbits) else {
                            return Leave::Suspend;
                        };
                        let code_bits = u32::from(here.bits);
                        if here.val < 16 {
                            self.drop_bits(code_bits);
                            self.lens[self.have] = here.val;
                            self.have += 1;
                            continue;
                        }
                        let (repeat_bits, base) = match here.val {
                            16 => (2, 3),
                            17 => (3, 3),
                            _ => (7, 11),
                        };
                        if !self.need_bits(strm, code_bits + repeat_bits) {
                            return Leave::Suspend;
                        }
                        self.drop_bits(code_bits);
                        let len = if here.val == 16 {
                            if self.have == 0 {
                                return self.bad("invalid bit length repeat");
                            }
                            self.lens[self.have - 1]
                        } else {
                            0
                        };
                        let copy = base + self.bits_value(repeat_bits) as usize;
                        self.drop_bits(repeat_bits);
                        if self.have + copy > self.nlen + self.ndist {
                            return self.bad("invalid bit length repeat");
                        }
                        self.lens[self.have..self.have + copy].fill(len);
                        self.have += copy;
                    }

                    if self.lens[256] == 0 {
                        return self.bad("invalid code -- missing end-of-block");
                    }

                    let (nlen, ndist) = (self.nlen, self.ndist);
                    let built = build_table(CodeKind::Lens, &self.lens[..nlen], self.codes, LEN_ROOT, self.work);
                    let Some((used, root)) = built else {
                        return self.bad("invalid literal/lengths set");
                    };
                    self.lencode = CodeTable::Dynamic(0);
                    self.lenbits = root;
                    self.next = used;

                    let built = build_table(
                        CodeKind::Dists,
                        &self.lens[nlen..nlen + ndist],
                        &mut self.codes[used..],
                        DIST_ROOT,
                        self.work,
                    );
                    let Some((used, root)) = built else {
                        return self.bad("invalid distances set");
                    };
                    self.distcode = CodeTable::Dynamic(self.next);
                    self.distbits = root;
                    self.next += used;

                    trace!(last = self.last, nlen, ndist, ncode = self.ncode, "dynamic block");
                    self.mode = Mode::LenStart;
                    if flush == Flush::Trees {
                        return Leave::Suspend;
                    }
                }
                Mode::LenStart => self.mode = Mode::Len,
                Mode::Len => {
                    if strm.avail_in() >= FAST_MIN_INPUT && strm.avail_out() >= FAST_MIN_OUTPUT {
                        self.inflate_fast(strm, out_start);
                        if self.mode == Mode::Type {
                            self.back = -1;
                        }
                        continue;
                    }
                    self.back = 0;
                    let Some(mut here) = self.decode(strm, self.lencode, &LENFIX, self.lenbits) else {
                        return Leave::Suspend;
                    };
                    if here.op != 0 && here.op & 0xF0 == 0 {
                        let link = here;
                        let Some(sub) = self.decode_sub(strm, self.lencode, &LENFIX, link) else {
                            return Leave::Suspend;
                        };
                        self.drop_bits(u32::from(link.bits));
                        self.back += i32::from(link.bits);
                        here = sub;
                    }
                    self.drop_bits(u32::from(here.bits));
                    self.back += i32::from(here.bits);
                    self.length = usize::from(here.val);

                    if here.op == 0 {
                        self.mode = Mode::Lit;
                    } else if here.op & OP_END != 0 {
                        self.back = -1;
                        self.mode = Mode::Type;
                    } else if here.op & OP_INVALID != 0 {
                        return self.bad("invalid literal/length code");
                    } else {
                        self.extra = u32::from(here.op & 15);
                        self.mode = Mode::LenExt;
                    }
                }
                Mode::LenExt => {
                    if self.extra > 0 {
                        if !self.need_bits(strm, self.extra) {
                            return Leave::Suspend;
                        }
                        self.length += self.bits_value(self.extra) as usize;
                        self.drop_bits(self.extra);
                        self.back += self.extra as i32;
                    }
                    self.was = self.length;
                    self.mode = Mode::Dist;
                }
                Mode::Dist => {
                    let Some(mut here) = self.decode(strm, self.distcode, &DISTFIX, self.distbits) else {
                        return Leave::Suspend;
                    };
                    if here.op & 0xF0 == 0 {
                        let link = here;
                        let Some(sub) = self.decode_sub(strm, self.distcode, &DISTFIX, link) else {
                            return Leave::Suspend;
                        };
                        self.drop_bits(u32::from(link.bits));
                        self.back += i32::from(link.bits);
                        here = sub;
                    }
                    self.drop_bits(u32::from(here.bits));
                    self.back += i32::from(here.bits);
                    if here.op & OP_INVALID != 0 {
                        return self.bad("invalid distance code");
                    }
                    self.offset = usize::from(here.val);
                    self.extra = u32::from(here.op & 15);
                    self.mode = Mode::DistExt;
                }
                Mode::DistExt => {
                    if self.extra > 0 {
                        if !self.need_bits(strm, self.extra) {
                            return Leave::Suspend;
                        }
                        self.offset += self.bits_value(self.extra) as usize;
                        self.drop_bits(self.extra);
                        self.back += self.extra as i32;
                    }
                    self.mode = Mode::Match;
                }
                Mode::Match => {
                    if strm.avail_out() == 0 {
                        return Leave::Suspend;
                    }
                    let emitted = strm.next_out - out_start;
                    let copy = if self.offset > emitted {
                        // Reaches back past this call's output into the window.
                        let back = self.offset - emitted;
                        if back > self.whave {
                            return self.bad("invalid distance too far back");
                        }
                        let (from, avail) = if back > self.wnext {
                            (self.wsize - (back - self.wnext), back - self.wnext)
                        } else {
                            (self.wnext - back, back)
                        };
                        let copy = avail.min(self.length).min(strm.avail_out());
                        let to = strm.next_out;
                        strm.output[to..to + copy].copy_from_slice(&self.window[from..from + copy]);
                        copy
                    } else {
                        let copy = self.length.min(strm.avail_out());
                        copy_match(strm.output, strm.next_out, self.offset, copy);
                        copy
                    };
                    strm.next_out += copy;
                    self.length -= copy;
                    if self.length == 0 {
                        self.mode = Mode::Len;
                    }
                }
                Mode::Lit => {
                    if strm.avail_out() == 0 {
                        return Leave::Suspend;
                    }
                    strm.output[strm.next_out] = self.length as u8;
                    strm.next_out += 1;
                    self.mode = Mode::Len;
                }
                Mode::Check => {
                    if self.wrap != Wrap::Raw {
                        if !self.need_bits(strm, 32) {
                            return Leave::Suspend;
                        }
                        let produced = &strm.output[*out_base..strm.next_out];
                        self.info.total_out += produced.len() as u64;
                        self.total += produced.len() as u64;
                        if self.verify && !produced.is_empty() {
                            self.check = self.fold_check(self.check, produced);
                            self.info.adler = self.check;
                        }
                        *out_base = strm.next_out;

                        let word = self.hold as u32;
                        let gzip = self.flags.is_some_and(|flags| flags != 0);
                        let expected = if gzip { word } else { word.swap_bytes() };
                        if self.verify && expected != self.check {
                            return self.bad("incorrect data check");
                        }
                        self.init_bits();
                    }
                    self.mode = Mode::Length;
                }
                Mode::Length => {
                    if self.wrap != Wrap::Raw && self.flags.is_some_and(|flags| flags != 0) {
                        if !self.need_bits(strm, 32) {
                            return Leave::Suspend;
                        }
                        if self.verify && self.hold as u32 != self.total as u32 {
                            return self.bad("incorrect length check");
                        }
                        self.init_bits();
                    }
                    self.mode = Mode::Done;
                }
                Mode::Done => {
                    trace!("inflate stream end");
                    return Leave::End;
                }
                Mode::Bad => return Leave::Bad,
                Mode::Sync => return Leave::Sync,
            }
        }
    }
}

impl StreamCodec for Inflater<'_> {
    fn process(&mut self, buffers: &mut StreamBuffers<'_, '_>, flush: Flush) -> Result<Status> {
        self.inflate(buffers, flush)
    }

    fn info(&self) -> &StreamInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_ZLIB: [u8; 11] = [0x78, 0x01, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01];

    fn work_buffer(window_bits: u8) -> Vec<u8> {
        vec![0u8; InflateLayout::new(window_bits).work_size().unwrap()]
    }

    #[test]
    fn test_empty_stored_stream() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&EMPTY_ZLIB, &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
        assert_eq!(strm.consumed(), EMPTY_ZLIB.len());
        assert_eq!(strm.produced(), 0);
        assert_eq!(inflater.info().adler, 1);
        assert_eq!(inflater.info().total_in, EMPTY_ZLIB.len() as u64);
    }

    #[test]
    fn test_incorrect_header_check() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&[0x78, 0x02, 0x00], &mut out);
        let err = inflater.inflate(&mut strm, Flush::NoFlush).unwrap_err();
        assert_eq!(err, FlateError::data("incorrect header check"));
        assert_eq!(inflater.msg(), Some("incorrect header check"));

        // The stream stays failed.
        let mut strm = StreamBuffers::new(&[0x00], &mut out);
        assert!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap_err().is_data_error());
    }

    #[test]
    fn test_window_larger_than_configured() {
        let mut work = work_buffer(9);
        let mut arena = Arena::new(&mut work);
        let config = InflateConfig::default().with_window_bits(9);
        let mut inflater = Inflater::new(&mut arena, config).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&EMPTY_ZLIB, &mut out);
        assert_eq!(
            inflater.inflate(&mut strm, Flush::Finish).unwrap_err(),
            FlateError::data("invalid window size")
        );
    }

    #[test]
    fn test_gzip_only_rejects_zlib_header() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Gzip)).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&EMPTY_ZLIB, &mut out);
        assert_eq!(
            inflater.inflate(&mut strm, Flush::Finish).unwrap_err(),
            FlateError::data("incorrect header check")
        );
    }

    #[test]
    fn test_invalid_block_type() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&[0x07], &mut out);
        assert_eq!(
            inflater.inflate(&mut strm, Flush::NoFlush).unwrap_err(),
            FlateError::data("invalid block type")
        );
    }

    #[test]
    fn test_primed_block_header() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();

        // Final fixed block header supplied as primed bits, then the
        // end-of-block code.
        inflater.prime(3, 0b011).unwrap();
        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&[0x00], &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
        assert_eq!(strm.produced(), 0);

        assert!(matches!(inflater.prime(17, 0), Err(FlateError::Config { .. })));
    }

    #[test]
    fn test_stored_block_sync_point_and_mark() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();

        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&[0x00], &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap(), Status::Ok);
        assert!(inflater.sync_point());
        assert_eq!(inflater.mark(), -(1 << 16));
    }

    #[test]
    fn test_history_and_dictionary() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();

        let stored = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&stored, &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap(), Status::StreamEnd);
        assert_eq!(strm.written(), b"abc");

        let mut history = [0u8; 8];
        assert_eq!(inflater.get_dictionary(&mut history).unwrap(), 3);
        assert_eq!(&history[..3], b"abc");
        assert_eq!(inflater.get_dictionary(&mut [0u8; 2]), Err(FlateError::Buffer));
    }

    #[test]
    fn test_dictionary_only_when_asked() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::default()).unwrap();
        assert!(matches!(inflater.set_dictionary(b"abc"), Err(FlateError::Stream { .. })));
    }

    #[test]
    fn test_sync_search_spans_calls() {
        let mut work = work_buffer(15);
        let mut arena = Arena::new(&mut work);
        let mut inflater = Inflater::new(&mut arena, InflateConfig::new(Wrap::Raw)).unwrap();

        let mut strm = StreamBuffers::new(&[0x12, 0x00, 0x00], &mut []);
        assert!(inflater.sync(&mut strm).unwrap_err().is_data_error());
        assert_eq!(strm.consumed(), 3);

        let mut strm = StreamBuffers::new(&[0xFF, 0xFF, 0x03, 0x00], &mut []);
        inflater.sync(&mut strm).unwrap();
        assert_eq!(strm.consumed(), 2);
        assert_eq!(inflater.info().total_in, 5);

        // A final empty fixed block follows the marker.
        let mut out = [0u8; 8];
        let mut strm = StreamBuffers::new(&[0x03, 0x00], &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    }

    #[test]
    fn test_reset_with_smaller_window_only() {
        let mut work = work_buffer(9);
        let mut arena = Arena::new(&mut work);
        let config = InflateConfig::default().with_window_bits(9);
        let mut inflater = Inflater::new(&mut arena, config).unwrap();

        assert!(matches!(
            inflater.reset_with(InflateConfig::default()),
            Err(FlateError::Config { .. })
        ));
        assert!(inflater.reset_with(InflateConfig::new(Wrap::Raw).with_window_bits(8)).is_ok());
    }

    #[test]
    fn test_arena_too_small() {
        let size = InflateLayout::new(15).work_size().unwrap();
        let mut work = vec![0u8; size - 1];
        let mut arena = Arena::new(&mut work);
        assert!(matches!(
            Inflater::new(&mut arena, InflateConfig::default()),
            Err(FlateError::ArenaTooSmall { .. })
        ));
        assert_eq!(arena.used(), 0);
    }
}
