//! GZIP member metadata (RFC 1952).
//!
//! The compressor writes a [`GzipHeader`] built from borrowed slices. The
//! decompressor fills a [`GzipHeaderSink`], whose variable-length fields are
//! caller-sized buffers: anything beyond their capacity is counted but
//! dropped, and the truncation can be queried afterwards.

use oxiflate_core::error::{FlateError, Result};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Operating system code written when no header is supplied (Unix).
pub const OS_CODE: u8 = 3;

/// Operating system code meaning "unknown".
pub const OS_UNKNOWN: u8 = 255;

/// Size of a header without optional fields.
pub const GZIP_BASE_HEADER_LEN: usize = 10;

/// GZIP header flags.
pub mod flags {
    /// Probably text.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original file name present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// Header written by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipHeader<'a> {
    /// Set the FTEXT flag.
    pub text: bool,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: u32,
    /// Operating system code.
    pub os: u8,
    /// Extra field, at most 65535 bytes.
    pub extra: Option<&'a [u8]>,
    /// File name, without the terminating zero.
    pub name: Option<&'a [u8]>,
    /// Comment, without the terminating zero.
    pub comment: Option<&'a [u8]>,
    /// Append a CRC-16 of the header.
    pub hcrc: bool,
}

impl Default for GzipHeader<'_> {
    fn default() -> Self {
        Self {
            text: false,
            mtime: 0,
            os: OS_UNKNOWN,
            extra: None,
            name: None,
            comment: None,
            hcrc: false,
        }
    }
}

impl<'a> GzipHeader<'a> {
    /// Create a header with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header carrying a file name.
    pub fn with_name(name: &'a [u8]) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    /// Check that the fields are encodable.
    pub fn validate(&self) -> Result<()> {
        if self.extra.is_some_and(|extra| extra.len() > usize::from(u16::MAX)) {
            return Err(FlateError::config("gzip extra field longer than 65535 bytes"));
        }
        if self.name.is_some_and(|name| name.contains(&0)) {
            return Err(FlateError::config("gzip name contains a zero byte"));
        }
        if self.comment.is_some_and(|comment| comment.contains(&0)) {
            return Err(FlateError::config("gzip comment contains a zero byte"));
        }
        Ok(())
    }

    /// The FLG byte for this header.
    pub fn flags(&self) -> u8 {
        let mut flg = 0;
        if self.text {
            flg |= flags::FTEXT;
        }
        if self.hcrc {
            flg |= flags::FHCRC;
        }
        if self.extra.is_some() {
            flg |= flags::FEXTRA;
        }
        if self.name.is_some() {
            flg |= flags::FNAME;
        }
        if self.comment.is_some() {
            flg |= flags::FCOMMENT;
        }
        flg
    }

    /// Encoded size of the header, optional fields included.
    pub fn encoded_len(&self) -> usize {
        let mut len = GZIP_BASE_HEADER_LEN;
        if let Some(extra) = self.extra {
            len += 2 + extra.len();
        }
        if let Some(name) = self.name {
            len += name.len() + 1;
        }
        if let Some(comment) = self.comment {
            len += comment.len() + 1;
        }
        if self.hcrc {
            len += 2;
        }
        len
    }
}

/// One variable-length field captured into a caller buffer.
#[derive(Debug, Default)]
pub(crate) struct FieldSink<'a> {
    buf: &'a mut [u8],
    stored: usize,
    total: usize,
    present: bool,
}

impl<'a> FieldSink<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            stored: 0,
            total: 0,
            present: false,
        }
    }

    /// Start capturing a field that is present in the header.
    pub(crate) fn begin(&mut self) {
        self.present = true;
        self.stored = 0;
        self.total = 0;
    }

    /// Append bytes, keeping what fits.
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        let room = self.buf.len() - self.stored;
        let keep = room.min(bytes.len());
        self.buf[self.stored..self.stored + keep].copy_from_slice(&bytes[..keep]);
        self.stored += keep;
        self.total += bytes.len();
    }

    fn clear(&mut self) {
        self.present = false;
        self.stored = 0;
        self.total = 0;
    }

    fn reborrow(&mut self) -> FieldSink<'_> {
        FieldSink {
            buf: &mut *self.buf,
            stored: self.stored,
            total: self.total,
            present: self.present,
        }
    }
}

/// Counters of a [`FieldSink`].
#[derive(Debug, Clone, Copy)]
struct FieldState {
    stored: usize,
    total: usize,
    present: bool,
}

impl From<&FieldSink<'_>> for FieldState {
    fn from(sink: &FieldSink<'_>) -> Self {
        Self {
            stored: sink.stored,
            total: sink.total,
            present: sink.present,
        }
    }
}

impl FieldSink<'_> {
    fn restore(&mut self, state: FieldState) {
        self.stored = state.stored;
        self.total = state.total;
        self.present = state.present;
    }
}

/// Everything a [`GzipHeaderSink`] records besides the captured bytes.
///
/// Lets a short-lived sink that shares the caller's buffers hand its
/// progress back to the caller's sink.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SinkState {
    text: bool,
    mtime: u32,
    xflags: u8,
    os: u8,
    hcrc: bool,
    done: bool,
    fields: [FieldState; 3],
}

/// Header fields read by the decompressor.
///
/// The buffers are sized by the caller; the decompressor never writes past
/// them. Name and comment are stored without their terminating zero.
#[derive(Debug, Default)]
pub struct GzipHeaderSink<'a> {
    /// FTEXT flag.
    pub text: bool,
    /// Modification time.
    pub mtime: u32,
    /// Extra flags.
    pub xflags: u8,
    /// Operating system code.
    pub os: u8,
    /// FHCRC flag.
    pub hcrc: bool,
    /// Set once the whole header has been read.
    pub done: bool,
    pub(crate) extra: FieldSink<'a>,
    pub(crate) name: FieldSink<'a>,
    pub(crate) comment: FieldSink<'a>,
}

impl<'a> GzipHeaderSink<'a> {
    /// Create a sink with capture buffers for the variable-length fields.
    pub fn new(extra: &'a mut [u8], name: &'a mut [u8], comment: &'a mut [u8]) -> Self {
        Self {
            extra: FieldSink::new(extra),
            name: FieldSink::new(name),
            comment: FieldSink::new(comment),
            ..Self::default()
        }
    }

    /// Forget everything captured so far.
    pub(crate) fn clear(&mut self) {
        self.text = false;
        self.mtime = 0;
        self.xflags = 0;
        self.os = 0;
        self.hcrc = false;
        self.done = false;
        self.extra.clear();
        self.name.clear();
        self.comment.clear();
    }

    /// A sink writing into the same buffers for a shorter lifetime.
    pub(crate) fn reborrow(&mut self) -> GzipHeaderSink<'_> {
        GzipHeaderSink {
            text: self.text,
            mtime: self.mtime,
            xflags: self.xflags,
            os: self.os,
            hcrc: self.hcrc,
            done: self.done,
            extra: self.extra.reborrow(),
            name: self.name.reborrow(),
            comment: self.comment.reborrow(),
        }
    }

    pub(crate) fn state(&self) -> SinkState {
        SinkState {
            text: self.text,
            mtime: self.mtime,
            xflags: self.xflags,
            os: self.os,
            hcrc: self.hcrc,
            done: self.done,
            fields: [(&self.extra).into(), (&self.name).into(), (&self.comment).into()],
        }
    }

    /// Adopt the progress of a reborrowed sink.
    pub(crate) fn restore(&mut self, state: SinkState) {
        self.text = state.text;
        self.mtime = state.mtime;
        self.xflags = state.xflags;
        self.os = state.os;
        self.hcrc = state.hcrc;
        self.done = state.done;
        self.extra.restore(state.fields[0]);
        self.name.restore(state.fields[1]);
        self.comment.restore(state.fields[2]);
    }

    /// The captured part of the extra field, if the header had one.
    pub fn extra(&self) -> Option<&[u8]> {
        self.extra.present.then(|| &self.extra.buf[..self.extra.stored])
    }

    /// The captured part of the file name, if the header had one.
    pub fn name(&self) -> Option<&[u8]> {
        self.name.present.then(|| &self.name.buf[..self.name.stored])
    }

    /// The captured part of the comment, if the header had one.
    pub fn comment(&self) -> Option<&[u8]> {
        self.comment.present.then(|| &self.comment.buf[..self.comment.stored])
    }

    /// Full length of the extra field as announced in the header.
    pub fn extra_len(&self) -> usize {
        self.extra.total
    }

    /// Bytes of extra, name and comment that did not fit, in that order.
    pub fn truncated(&self) -> [usize; 3] {
        [
            self.extra.total - self.extra.stored,
            self.name.total - self.name.stored,
            self.comment.total - self.comment.stored,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_flags_and_len() {
        let header = GzipHeader {
            text: true,
            extra: Some(b"ab"),
            name: Some(b"file.txt"),
            comment: Some(b"hi"),
            hcrc: true,
            ..GzipHeader::default()
        };
        assert_eq!(
            header.flags(),
            flags::FTEXT | flags::FHCRC | flags::FEXTRA | flags::FNAME | flags::FCOMMENT
        );
        assert_eq!(header.encoded_len(), 10 + 4 + 9 + 3 + 2);
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_header_rejects_embedded_zero() {
        let header = GzipHeader::with_name(b"a\0b");
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_sink_truncates() {
        let mut extra = [0u8; 2];
        let mut name = [0u8; 4];
        let mut comment = [0u8; 0];
        let mut sink = GzipHeaderSink::new(&mut extra, &mut name, &mut comment);

        sink.name.begin();
        sink.name.extend(b"long");
        sink.name.extend(b"name");
        sink.extra.begin();
        sink.extra.extend(&[1, 2, 3]);

        assert_eq!(sink.name(), Some(&b"long"[..]));
        assert_eq!(sink.extra(), Some(&[1u8, 2][..]));
        assert_eq!(sink.extra_len(), 3);
        assert_eq!(sink.comment(), None);
        assert_eq!(sink.truncated(), [1, 4, 0]);
    }

    #[test]
    fn test_reborrowed_sink_progress_restored() {
        let mut extra = [0u8; 0];
        let mut name = [0u8; 8];
        let mut comment = [0u8; 0];
        let mut sink = GzipHeaderSink::new(&mut extra, &mut name, &mut comment);

        let state = {
            let mut short = sink.reborrow();
            short.mtime = 7;
            short.done = true;
            short.name.begin();
            short.name.extend(b"a.txt");
            short.state()
        };
        sink.restore(state);

        assert_eq!(sink.mtime, 7);
        assert!(sink.done);
        assert_eq!(sink.name(), Some(&b"a.txt"[..]));
        assert_eq!(sink.extra(), None);
    }
}
