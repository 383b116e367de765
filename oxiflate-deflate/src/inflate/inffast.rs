//! Fast decoding loop.
//!
//! Used while at least [`FAST_MIN_INPUT`] input bytes and [`FAST_MIN_OUTPUT`]
//! output bytes remain, which is enough for one length/distance pair with
//! all extra bits. Under that guarantee the loop needs no bounds bookkeeping
//! between symbols and never suspends.

use super::inftrees::{DISTFIX, LENFIX, OP_BASE, OP_END, OP_INVALID, OP_LITERAL};
use super::{Inflater, Mode, table_slice};
use crate::stream::StreamBuffers;

/// Input bytes one length/distance pair can use.
pub(super) const FAST_MIN_INPUT: usize = 6;

/// Output bytes one length/distance pair can produce.
pub(super) const FAST_MIN_OUTPUT: usize = 258;

/// Copy `len` bytes from `dist` bytes back, repeating the pattern when the
/// ranges overlap.
pub(super) fn copy_match(output: &mut [u8], pos: usize, dist: usize, len: usize) {
    let from = pos - dist;
    if dist >= len {
        output.copy_within(from..from + len, pos);
    } else {
        for i in 0..len {
            output[pos + i] = output[from + i];
        }
    }
}

impl Inflater<'_> {
    /// Decode literals and matches until the block ends, the data turns out
    /// invalid, or the input or output margin runs out. The mode is left at
    /// `Len`, `Type` or `Bad`.
    pub(super) fn inflate_fast(&mut self, strm: &mut StreamBuffers<'_, '_>, out_start: usize) {
        let input = strm.input;
        let last = input.len() - (FAST_MIN_INPUT - 1);
        let output = &mut *strm.output;
        let end = output.len() - (FAST_MIN_OUTPUT - 1);
        let mut pos = strm.next_in;
        let mut out = strm.next_out;
        let mut hold = self.hold;
        let mut bits = self.bits;

        let (wsize, whave, wnext) = (self.wsize, self.whave, self.wnext);
        let window = &*self.window;
        let lcode = table_slice(self.codes, self.lencode, &LENFIX);
        let dcode = table_slice(self.codes, self.distcode, &DISTFIX);
        let lmask = (1u64 << self.lenbits) - 1;
        let dmask = (1u64 << self.distbits) - 1;

        // Some(Ok) at end of block, Some(Err) on invalid data.
        let mut outcome: Option<Result<(), &'static str>> = None;

        'symbols: loop {
            if bits < 15 {
                hold |= u64::from(input[pos]) << bits;
                hold |= u64::from(input[pos + 1]) << (bits + 8);
                pos += 2;
                bits += 16;
            }
            let mut here = lcode[(hold & lmask) as usize];
            loop {
                hold >>= here.bits;
                bits -= u32::from(here.bits);
                let op = here.op;

                if op == OP_LITERAL {
                    output[out] = here.val as u8;
                    out += 1;
                    break;
                }

                if op & OP_BASE != 0 {
                    let mut len = usize::from(here.val);
                    let extra = u32::from(op & 15);
                    if extra != 0 {
                        if bits < extra {
                            hold |= u64::from(input[pos]) << bits;
                            pos += 1;
                            bits += 8;
                        }
                        len += (hold & ((1u64 << extra) - 1)) as usize;
                        hold >>= extra;
                        bits -= extra;
                    }
                    if bits < 15 {
                        hold |= u64::from(input[pos]) << bits;
                        hold |= u64::from(input[pos + 1]) << (bits + 8);
                        pos += 2;
                        bits += 16;
                    }

                    let mut here = dcode[(hold & dmask) as usize];
                    loop {
                        hold >>= here.bits;
                        bits -= u32::from(here.bits);
                        let op = here.op;

                        if op & OP_BASE != 0 {
                            let mut dist = usize::from(here.val);
                            let extra = u32::from(op & 15);
                            while bits < extra {
                                hold |= u64::from(input[pos]) << bits;
                                pos += 1;
                                bits += 8;
                            }
                            dist += (hold & ((1u64 << extra) - 1)) as usize;
                            hold >>= extra;
                            bits -= extra;

                            let emitted = out - out_start;
                            if dist > emitted {
                                let back = dist - emitted;
                                if back > whave {
                                    outcome = Some(Err("invalid distance too far back"));
                                    break 'symbols;
                                }
                                if wnext == 0 {
                                    // Window is full and unwrapped.
                                    let take = back.min(len);
                                    let from = wsize - back;
                                    output[out..out + take].copy_from_slice(&window[from..from + take]);
                                    out += take;
                                    len -= take;
                                } else if wnext < back {
                                    // Window end, then window start.
                                    let from = wsize + wnext - back;
                                    let take = (back - wnext).min(len);
                                    output[out..out + take].copy_from_slice(&window[from..from + take]);
                                    out += take;
                                    len -= take;
                                    let take = wnext.min(len);
                                    output[out..out + take].copy_from_slice(&window[..take]);
                                    out += take;
                                    len -= take;
                                } else {
                                    let from = wnext - back;
                                    let take = back.min(len);
                                    output[out..out + take].copy_from_slice(&window[from..from + take]);
                                    out += take;
                                    len -= take;
                                }
                            }
                            if len > 0 {
                                copy_match(output, out, dist, len);
                                out += len;
                            }
                            break;
                        } else if op & OP_INVALID == 0 {
                            here = dcode[usize::from(here.val) + (hold & ((1u64 << op) - 1)) as usize];
                        } else {
                            outcome = Some(Err("invalid distance code"));
                            break 'symbols;
                        }
                    }
                    break;
                } else if op & OP_INVALID == 0 {
                    here = lcode[usize::from(here.val) + (hold & ((1u64 << op) - 1)) as usize];
                } else if op & OP_END != 0 {
                    outcome = Some(Ok(()));
                    break 'symbols;
                } else {
                    outcome = Some(Err("invalid literal/length code"));
                    break 'symbols;
                }
            }
            if pos >= last || out >= end {
                break;
            }
        }

        // Return whole unused bytes to the input.
        let unused = (bits >> 3) as usize;
        pos -= unused;
        bits -= (unused as u32) << 3;
        hold &= (1u64 << bits) - 1;

        strm.next_in = pos;
        strm.next_out = out;
        self.hold = hold;
        self.bits = bits;

        match outcome {
            Some(Ok(())) => self.mode = Mode::Type,
            Some(Err(msg)) => {
                self.bad(msg);
            }
            None => {}
        }
    }
}
