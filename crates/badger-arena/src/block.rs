//! Contiguous memory blocks with bump allocation.
//!
//! A [`Block`] is one extent obtained from a
//! [`BlockAllocator`](crate::BlockAllocator) with a cursor that only moves
//! forward. Blocks are never partially freed: they are rewound wholesale by
//! [`Block::reset`] or handed back to their allocator when the arena drops.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::align::align_up;
use crate::alloc::BlockAllocator;
use crate::raw;

/// A snapshot of one block's geometry, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Address of the first byte of the block.
    pub start: usize,
    /// Usable size of the block in bytes.
    pub capacity: usize,
    /// Bytes not yet handed out.
    pub available: usize,
}

/// A single bump-allocated extent owned by one arena.
pub(crate) struct Block {
    base: NonNull<u8>,
    layout: Layout,
    capacity: usize,
    /// Bump pointer: offset of the next free byte.
    cursor: usize,
}

// SAFETY: a block is plain memory with a single owner; nothing about it is
// tied to the thread that allocated it.
unsafe impl Send for Block {}

impl Block {
    /// Wrap a freshly allocated extent.
    ///
    /// `capacity` is the allocator's usable size for `layout`.
    pub(crate) fn new(base: NonNull<u8>, layout: Layout, capacity: usize) -> Self {
        debug_assert!(capacity >= layout.size());
        Self {
            base,
            layout,
            capacity,
            cursor: 0,
        }
    }

    /// Offset at which `size` bytes aligned to `align` would start, or
    /// `None` if they do not fit in the remaining space.
    ///
    /// Padding depends on the block's address, so this does not move the
    /// cursor.
    pub(crate) fn peek(&self, size: usize, align: usize) -> Option<usize> {
        let here = self.start().checked_add(self.cursor)?;
        let aligned = align_up(here, align)?;
        let offset = self.cursor + (aligned - here);
        let end = offset.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        Some(offset)
    }

    /// Claim `size` bytes at `offset` (as returned by [`peek`](Self::peek))
    /// and return a pointer to them.
    ///
    /// # Panics
    ///
    /// Panics if the range lies before the cursor or past the end.
    pub(crate) fn bump(&mut self, offset: usize, size: usize) -> NonNull<u8> {
        assert!(offset >= self.cursor, "bump behind the cursor");
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.capacity)
            .expect("bump past the end of the block");
        self.cursor = end;
        // SAFETY: `offset + size <= capacity`, inside this block's extent.
        unsafe { raw::offset(self.base, offset) }
    }

    /// Rewind the cursor to the start of the block.
    ///
    /// All previous allocations become invalid.
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Address of the first byte.
    pub(crate) fn start(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Bytes consumed, including alignment padding.
    pub(crate) fn used(&self) -> usize {
        self.cursor
    }

    pub(crate) fn available(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Whether `addr..addr + len` lies inside the claimed part of the block.
    pub(crate) fn contains(&self, addr: usize, len: usize) -> bool {
        let start = self.start();
        match addr.checked_add(len) {
            Some(end) => addr >= start && end <= start + self.cursor,
            None => false,
        }
    }

    pub(crate) fn info(&self) -> BlockInfo {
        BlockInfo {
            start: self.start(),
            capacity: self.capacity,
            available: self.available(),
        }
    }

    /// Hand the extent back to the allocator it came from.
    pub(crate) fn release<A: BlockAllocator + ?Sized>(self, allocator: &A) {
        // SAFETY: `base` was produced by `allocator.allocate(self.layout)`
        // and is released exactly once because `self` is consumed.
        unsafe { allocator.deallocate(self.base, self.layout) }
    }
}
