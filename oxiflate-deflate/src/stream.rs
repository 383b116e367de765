//! Caller-facing stream cursors and per-stream bookkeeping.
//!
//! A streaming call borrows the caller's input and output slices through a
//! [`StreamBuffers`] for the duration of that call only. Progress is recorded
//! in the cursor positions, so it survives even when the call fails, and the
//! caller resumes by building a new `StreamBuffers` over whatever is left.
//!
//! Running totals, the last advisory message and the checksum accumulator
//! persist across calls in [`StreamInfo`], owned by the engine.

use crate::config::Wrap;
use oxiflate_core::checksum::{Adler32, Checksum, Crc32};
use oxiflate_core::error::Result;
use oxiflate_core::flush::{DataType, Flush, Status};

/// Fold `data` into the check value carried for the given framing.
pub(crate) fn running_check(wrap: Wrap, check: u32, data: &[u8]) -> u32 {
    match wrap {
        Wrap::Zlib => Adler32::update(check, data),
        Wrap::Gzip => Crc32::update(check, data),
        Wrap::Raw | Wrap::Auto => check,
    }
}

/// Input and output cursors for one streaming call.
#[derive(Debug)]
pub struct StreamBuffers<'i, 'o> {
    pub(crate) input: &'i [u8],
    pub(crate) next_in: usize,
    pub(crate) output: &'o mut [u8],
    pub(crate) next_out: usize,
}

impl<'i, 'o> StreamBuffers<'i, 'o> {
    /// Wrap an input slice and an output slice, both at position zero.
    pub fn new(input: &'i [u8], output: &'o mut [u8]) -> Self {
        Self {
            input,
            next_in: 0,
            output,
            next_out: 0,
        }
    }

    /// Bytes consumed from the input so far.
    pub fn consumed(&self) -> usize {
        self.next_in
    }

    /// Bytes written to the output so far.
    pub fn produced(&self) -> usize {
        self.next_out
    }

    /// Input bytes not consumed yet.
    pub fn avail_in(&self) -> usize {
        self.input.len() - self.next_in
    }

    /// Output space left.
    pub fn avail_out(&self) -> usize {
        self.output.len() - self.next_out
    }

    /// The unconsumed tail of the input.
    pub fn remaining_input(&self) -> &'i [u8] {
        &self.input[self.next_in..]
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.output[..self.next_out]
    }

    /// Copy as much unconsumed input as fits into `buf`, returning the count.
    pub(crate) fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.avail_in());
        buf[..len].copy_from_slice(&self.input[self.next_in..self.next_in + len]);
        self.next_in += len;
        len
    }

    /// Move `len` bytes straight from input to output and return them.
    /// The caller has checked that both sides have room.
    pub(crate) fn pass_through(&mut self, len: usize) -> &[u8] {
        let (from, to) = (self.next_in, self.next_out);
        self.output[to..to + len].copy_from_slice(&self.input[from..from + len]);
        self.next_in += len;
        self.next_out += len;
        &self.output[to..to + len]
    }

    /// The `len` input bytes just before the cursor.
    pub(crate) fn consumed_tail(&self, len: usize) -> &'i [u8] {
        &self.input[self.next_in - len..self.next_in]
    }

    /// Copy as much of `data` as fits into the output, returning the count.
    pub(crate) fn write_from(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.avail_out());
        self.output[self.next_out..self.next_out + len].copy_from_slice(&data[..len]);
        self.next_out += len;
        len
    }
}

/// Bookkeeping carried across calls for one stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamInfo {
    /// Total input bytes consumed.
    pub total_in: u64,
    /// Total output bytes produced.
    pub total_out: u64,
    /// Running Adler-32 or CRC-32 of the uncompressed data, or the dictionary
    /// id while a dictionary is awaited.
    pub adler: u32,
    /// Content type guess from the first compressed block.
    pub data_type: DataType,
    /// Advisory message of the last error.
    pub msg: Option<&'static str>,
}

/// A streaming engine driven by repeated calls.
pub trait StreamCodec {
    /// Advance the stream as far as the buffers allow.
    fn process(&mut self, buffers: &mut StreamBuffers<'_, '_>, flush: Flush) -> Result<Status>;

    /// Bookkeeping of the stream.
    fn info(&self) -> &StreamInfo;

    /// Process slices in one call.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn process_slices(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<(usize, usize, Status)> {
        let mut buffers = StreamBuffers::new(input, output);
        let status = self.process(&mut buffers, flush)?;
        Ok((buffers.consumed(), buffers.produced(), status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursors_advance() {
        let input = [1u8, 2, 3, 4, 5];
        let mut output = [0u8; 3];
        let mut buffers = StreamBuffers::new(&input, &mut output);

        let mut scratch = [0u8; 2];
        assert_eq!(buffers.read_into(&mut scratch), 2);
        assert_eq!(scratch, [1, 2]);
        assert_eq!(buffers.avail_in(), 3);
        assert_eq!(buffers.remaining_input(), &[3, 4, 5]);

        assert_eq!(buffers.write_from(&[9, 8, 7, 6]), 3);
        assert_eq!(buffers.avail_out(), 0);
        assert_eq!(buffers.written(), &[9, 8, 7]);
        assert_eq!(buffers.consumed(), 2);
        assert_eq!(buffers.produced(), 3);
    }
}
