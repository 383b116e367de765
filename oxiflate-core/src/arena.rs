//! Fixed-buffer arena allocator.
//!
//! All working memory of a compression or decompression stream is carved out
//! of one caller-supplied byte buffer. The arena hands out typed, zeroed,
//! non-overlapping regions and never takes them back: the whole buffer is
//! released at once when the stream that borrowed it is dropped.
//!
//! Sizing is deterministic. [`region_size`] returns the worst-case footprint
//! of a reservation (including alignment padding) without touching any
//! buffer, so callers can compute the exact arena size a configuration needs
//! before allocating anything.
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::arena::{Arena, region_size};
//!
//! let mut buf = [0u8; 64];
//! let mut arena = Arena::new(&mut buf);
//!
//! let words: &mut [u16] = arena.reserve(8).unwrap();
//! words[7] = 0xBEEF;
//! assert!(arena.used() <= region_size::<u16>(8).unwrap());
//!
//! // Too large: fails without moving the cursor
//! let used = arena.used();
//! assert!(arena.reserve::<u32>(100).is_err());
//! assert_eq!(arena.used(), used);
//! ```

use crate::error::{FlateError, Result};
use std::mem::{align_of, size_of};

/// Marker for plain-old-data types that may live in an arena.
///
/// # Safety
///
/// Implementors must be `Copy`, have a non-zero size, contain no padding
/// bytes, and accept every bit pattern (in particular all-zero) as a valid
/// value. References, pointers, `bool`, `char` and enums do not qualify.
pub unsafe trait ArenaItem: Copy + 'static {}

// SAFETY: primitive integers accept every bit pattern.
unsafe impl ArenaItem for u8 {}
// SAFETY: as above.
unsafe impl ArenaItem for u16 {}
// SAFETY: as above.
unsafe impl ArenaItem for u32 {}
// SAFETY: as above.
unsafe impl ArenaItem for i32 {}

/// Worst-case bytes taken by `reserve::<T>(count)`, alignment padding
/// included. Returns `None` on arithmetic overflow.
pub const fn region_size<T: ArenaItem>(count: usize) -> Option<usize> {
    match count.checked_mul(size_of::<T>()) {
        Some(bytes) => bytes.checked_add(align_of::<T>() - 1),
        None => None,
    }
}

/// Sum a list of region sizes, failing on overflow.
pub fn total_size(regions: &[Option<usize>]) -> Option<usize> {
    regions
        .iter()
        .try_fold(0usize, |acc, region| acc.checked_add((*region)?))
}

/// A monotonic allocator over a borrowed byte buffer.
#[derive(Debug)]
pub struct Arena<'a> {
    /// Unreserved tail of the buffer.
    free: &'a mut [u8],
    /// Total length of the buffer.
    capacity: usize,
    /// Bytes handed out so far, padding included.
    used: usize,
}

impl<'a> Arena<'a> {
    /// Wrap a caller-supplied buffer.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let capacity = buf.len();
        Self {
            free: buf,
            capacity,
            used: 0,
        }
    }

    /// Total size of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes reserved so far (the cursor).
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available, before alignment padding.
    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Fail with [`FlateError::ArenaTooSmall`] unless at least `needed`
    /// bytes are still free.
    pub fn ensure_capacity(&self, needed: usize) -> Result<()> {
        if self.free.len() < needed {
            return Err(FlateError::arena_too_small(needed, self.free.len()));
        }
        Ok(())
    }

    /// Reserve a zeroed region of `count` items.
    ///
    /// On failure the cursor does not move.
    pub fn reserve<T: ArenaItem>(&mut self, count: usize) -> Result<&'a mut [T]> {
        let too_small = |needed: usize| FlateError::arena_too_small(needed, self.capacity);

        let bytes = count
            .checked_mul(size_of::<T>())
            .ok_or(too_small(usize::MAX))?;
        let pad = self.free.as_ptr().align_offset(align_of::<T>());
        let needed = pad.checked_add(bytes).ok_or(too_small(usize::MAX))?;
        if needed > self.free.len() {
            return Err(too_small(self.used.saturating_add(needed)));
        }

        let free = std::mem::take(&mut self.free);
        let (_, aligned) = free.split_at_mut(pad);
        let (region, rest) = aligned.split_at_mut(bytes);
        self.free = rest;
        self.used += needed;

        region.fill(0);
        // SAFETY: `region` is exclusively borrowed for 'a, starts at an
        // address aligned for T and spans exactly count * size_of::<T>()
        // bytes. ArenaItem guarantees the all-zero pattern is a valid T.
        let typed = unsafe { std::slice::from_raw_parts_mut(region.as_mut_ptr().cast::<T>(), count) };
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_is_zeroed_and_aligned() {
        let mut buf = [0xAAu8; 256];
        let mut arena = Arena::new(&mut buf);

        let bytes: &mut [u8] = arena.reserve(3).unwrap();
        assert_eq!(bytes, &[0, 0, 0]);

        let words: &mut [u32] = arena.reserve(4).unwrap();
        assert_eq!(words.as_ptr() as usize % align_of::<u32>(), 0);
        assert!(words.iter().all(|&w| w == 0));
    }

    #[test]
    fn test_regions_do_not_overlap() {
        let mut buf = [0u8; 128];
        let mut arena = Arena::new(&mut buf);

        let a: &mut [u16] = arena.reserve(10).unwrap();
        let b: &mut [u16] = arena.reserve(10).unwrap();
        a.fill(1);
        b.fill(2);
        assert!(a.iter().all(|&x| x == 1));
        assert!(b.iter().all(|&x| x == 2));
    }

    #[test]
    fn test_exhaustion_leaves_cursor() {
        let mut buf = [0u8; 16];
        let mut arena = Arena::new(&mut buf);

        let _ = arena.reserve::<u8>(10).unwrap();
        let used = arena.used();
        let err = arena.reserve::<u8>(7).unwrap_err();
        assert!(matches!(err, FlateError::ArenaTooSmall { available: 16, .. }));
        assert_eq!(arena.used(), used);

        // The remaining space is still usable.
        assert_eq!(arena.reserve::<u8>(6).unwrap().len(), 6);
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_count_overflow() {
        let mut buf = [0u8; 16];
        let mut arena = Arena::new(&mut buf);
        assert!(arena.reserve::<u32>(usize::MAX / 2).is_err());
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_region_size_covers_padding() {
        assert_eq!(region_size::<u8>(10), Some(10));
        assert_eq!(region_size::<u32>(10), Some(43));
        assert_eq!(region_size::<u32>(usize::MAX), None);
        assert_eq!(total_size(&[Some(1), Some(2)]), Some(3));
        assert_eq!(total_size(&[Some(1), None]), None);
    }

    #[test]
    fn test_region_size_is_sufficient() {
        // Any starting offset fits in the worst-case size.
        let mut buf = [0u8; 64];
        for offset in 0..4 {
            let size = region_size::<u32>(8).unwrap();
            let mut arena = Arena::new(&mut buf[offset..offset + size]);
            assert!(arena.reserve::<u32>(8).is_ok());
        }
    }

    #[test]
    fn test_ensure_capacity() {
        let mut buf = [0u8; 8];
        let arena = Arena::new(&mut buf);
        assert!(arena.ensure_capacity(8).is_ok());
        assert_eq!(
            arena.ensure_capacity(9),
            Err(FlateError::arena_too_small(9, 8))
        );
    }

    #[test]
    fn test_ensure_capacity_counts_used_space() {
        let mut buf = [0u8; 8];
        let mut arena = Arena::new(&mut buf);
        let _ = arena.reserve::<u8>(3).unwrap();
        assert!(arena.ensure_capacity(5).is_ok());
        assert_eq!(
            arena.ensure_capacity(6),
            Err(FlateError::arena_too_small(6, 5))
        );
    }
}
