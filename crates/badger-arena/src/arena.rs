//! The block-based bump allocator.
//!
//! An [`Arena`] serves allocations out of a growing set of blocks.
//! Requests go to the block with the most available space first; when no
//! block fits, a new one is sized by the configured [`GrowthPolicy`].
//! Memory is only reclaimed wholesale, by [`Arena::reset`] or by dropping
//! the arena.
//!
//! Allocation takes `&self`, so many borrows of arena memory can be live at
//! once. The bookkeeping sits behind a `RefCell`, which makes the arena
//! `!Sync`.
//!
//! [`GrowthPolicy`]: crate::GrowthPolicy

use std::alloc::Layout;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::ptr::NonNull;

use badger_core::Slice;
use tracing::{debug, warn};

use crate::align::{align_up, is_valid_alignment, MAX_ALIGN, MAX_BLOCK_ALIGN};
use crate::alloc::{BlockAllocator, SystemAllocator};
use crate::block::{Block, BlockInfo};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw;

/// Mutable arena bookkeeping.
struct ArenaState {
    blocks: Vec<Block>,
    /// `(available, block index)` for every block.
    by_available: BTreeSet<(usize, usize)>,
    /// Size the next policy block will get.
    next_block_size: usize,
    /// Bytes requested by callers.
    allocated_bytes: usize,
    /// Bytes of backing memory requested from the allocator.
    memory_bytes: usize,
}

impl ArenaState {
    fn new(initial_block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            by_available: BTreeSet::new(),
            next_block_size: initial_block_size,
            allocated_bytes: 0,
            memory_bytes: 0,
        }
    }

    /// Serve the request from an existing block, probing from the most
    /// available one downwards.
    fn bump_existing(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let mut found = None;
        for &(available, index) in self.by_available.iter().rev() {
            // Padding aside, no smaller block can hold the request either.
            if available < size {
                break;
            }
            if let Some(offset) = self.blocks[index].peek(size, align) {
                found = Some((available, index, offset));
                break;
            }
        }
        let (available, index, offset) = found?;

        self.by_available.remove(&(available, index));
        let block = &mut self.blocks[index];
        let ptr = block.bump(offset, size);
        self.by_available.insert((block.available(), index));
        Some(ptr)
    }

    /// Register a freshly created block that already holds one allocation.
    fn push(&mut self, block: Block, layout: Layout) {
        let index = self.blocks.len();
        self.by_available.insert((block.available(), index));
        self.blocks.push(block);
        self.memory_bytes += layout.size();
    }
}

/// A bump allocator over a growing set of blocks.
///
/// # Examples
///
/// ```
/// use badger_arena::{Arena, ArenaConfig, GrowthPolicy};
///
/// let config = ArenaConfig::new(128).with_growth(GrowthPolicy::Exponential);
/// let arena = Arena::with_config(config).unwrap();
///
/// let a = arena.alloc_slice_copy(b"hello").unwrap();
/// let b = arena.alloc(42u64).unwrap();
/// a[0] = b'j';
/// *b += 1;
/// assert_eq!(a, b"jello");
/// assert_eq!(*b, 43);
/// ```
pub struct Arena<A: BlockAllocator = SystemAllocator> {
    config: ArenaConfig,
    allocator: A,
    state: RefCell<ArenaState>,
}

impl Arena {
    /// Create an arena with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(ArenaConfig::default(), SystemAllocator)
    }

    /// Create an arena whose first block has `block_size` bytes.
    pub fn with_block_size(block_size: usize) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(block_size))
    }

    /// Create an arena from a validated configuration.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_config_in(config, SystemAllocator)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: BlockAllocator> Arena<A> {
    /// Create an arena that takes its blocks from `allocator`.
    pub fn with_config_in(config: ArenaConfig, allocator: A) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::from_parts(config, allocator))
    }

    fn from_parts(config: ArenaConfig, allocator: A) -> Self {
        let state = RefCell::new(ArenaState::new(config.initial_block_size));
        Self {
            config,
            allocator,
            state,
        }
    }

    /// Allocate `size` bytes aligned to [`MAX_ALIGN`].
    ///
    /// See [`allocate_aligned`](Self::allocate_aligned).
    pub fn allocate(&self, size: usize) -> Result<Option<NonNull<u8>>, ArenaError> {
        self.allocate_aligned(size, MAX_ALIGN)
    }

    /// Allocate `size` bytes aligned to `align`.
    ///
    /// A zero-byte request returns `Ok(None)` and changes nothing. The
    /// returned memory is uninitialised and stays valid until the arena is
    /// reset or dropped. On error the arena is left exactly as it was.
    ///
    /// # Panics
    ///
    /// Panics if `align` is a power of two above [`MAX_BLOCK_ALIGN`].
    pub fn allocate_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<Option<NonNull<u8>>, ArenaError> {
        if size == 0 {
            return Ok(None);
        }
        if !is_valid_alignment(align) {
            return Err(ArenaError::InvalidAlignment { alignment: align });
        }
        self.allocate_nonzero(size, align).map(Some)
    }

    /// Allocate uninitialised room for `count` values of `T`.
    ///
    /// Zero-sized requests return a dangling, well-aligned pointer without
    /// touching the arena.
    pub fn allocate_array<T>(&self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::array::<T>(count).map_err(|_| ArenaError::LayoutOverflow {
            count,
            elem_size: std::mem::size_of::<T>(),
        })?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        let ptr = self.allocate_nonzero(layout.size(), layout.align())?;
        Ok(ptr.cast())
    }

    /// Move `value` into the arena and borrow it.
    ///
    /// The value's destructor never runs.
    #[allow(clippy::mut_from_ref)]
    #[allow(unsafe_code)]
    pub fn alloc<T>(&self, value: T) -> Result<&mut T, ArenaError> {
        let ptr = self.allocate_array::<T>(1)?;
        // SAFETY: `ptr` is fresh arena memory sized and aligned for one `T`
        // (dangling only for zero-sized `T`) and handed out nowhere else.
        Ok(unsafe { raw::write_value(ptr.cast(), value) })
    }

    /// Copy `src` into the arena and borrow the copy.
    #[allow(clippy::mut_from_ref)]
    #[allow(unsafe_code)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Result<&mut [T], ArenaError> {
        let ptr = self.allocate_array::<T>(src.len())?;
        // SAFETY: fresh, aligned room for `src.len()` values, disjoint from
        // `src` because the caller cannot hold a borrow of it yet.
        Ok(unsafe { raw::copy_slice(ptr.cast(), src) })
    }

    /// Fill `count` slots with clones of `value` and borrow them.
    ///
    /// Destructors of the stored values never run.
    #[allow(clippy::mut_from_ref)]
    #[allow(unsafe_code)]
    pub fn alloc_slice_fill<T: Clone>(
        &self,
        count: usize,
        value: T,
    ) -> Result<&mut [T], ArenaError> {
        let ptr = self.allocate_array::<T>(count)?;
        // SAFETY: fresh, aligned room for `count` values of `T`.
        Ok(unsafe { raw::fill(ptr.cast(), count, value) })
    }

    /// Allocate `size` zeroed bytes aligned to `align`.
    #[allow(clippy::mut_from_ref)]
    #[allow(unsafe_code)]
    pub fn alloc_zeroed(&self, size: usize, align: usize) -> Result<&mut [u8], ArenaError> {
        match self.allocate_aligned(size, align)? {
            // SAFETY: fresh arena memory of exactly `size` bytes.
            Some(ptr) => Ok(unsafe { raw::zeroed_bytes(ptr, size) }),
            None => Ok(&mut []),
        }
    }

    /// Copy the bytes behind `slice` into the arena.
    pub fn copy_slice(&self, slice: Slice<'_>) -> Result<Slice<'_>, ArenaError> {
        let bytes = self.alloc_slice_copy(slice.as_bytes())?;
        Ok(Slice::new(bytes))
    }

    /// Concatenate `parts` into one contiguous arena buffer.
    #[allow(unsafe_code)]
    pub fn concat(&self, parts: &[Slice<'_>]) -> Result<Slice<'_>, ArenaError> {
        let total = parts
            .iter()
            .try_fold(0usize, |acc, part| acc.checked_add(part.len()))
            .ok_or(ArenaError::LayoutOverflow {
                count: parts.len(),
                elem_size: 1,
            })?;
        let Some(base) = self.allocate_aligned(total, 1)? else {
            return Ok(Slice::empty());
        };
        let mut written = 0;
        for part in parts {
            // SAFETY: `written + part.len() <= total`, inside the fresh
            // allocation, which no part can overlap.
            unsafe { raw::copy_slice(raw::offset(base, written), part.as_bytes()) };
            written += part.len();
        }
        // SAFETY: all `total` bytes were written above and are only
        // reachable through the returned slice.
        Ok(Slice::new(unsafe { raw::bytes(base, total) }))
    }

    fn allocate_nonzero(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        assert!(
            align <= MAX_BLOCK_ALIGN,
            "alignment {align} exceeds the supported maximum of {MAX_BLOCK_ALIGN}"
        );
        let mut state = self.state.borrow_mut();
        let ptr = match state.bump_existing(size, align) {
            Some(ptr) => ptr,
            None => self.allocate_in_new_block(&mut state, size, align)?,
        };
        state.allocated_bytes += size;
        Ok(ptr)
    }

    fn allocate_in_new_block(
        &self,
        state: &mut ArenaState,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        let policy_size = state.next_block_size;
        let block_align = align.max(MAX_ALIGN);
        let dedicated = size > policy_size;
        let out_of_memory = |block_size| ArenaError::OutOfMemory {
            requested: size,
            block_size,
        };
        let block_size = if dedicated {
            align_up(size, block_align).ok_or(out_of_memory(size))?
        } else {
            policy_size
        };

        if let Some(limit) = self.config.memory_limit {
            let over = state
                .memory_bytes
                .checked_add(block_size)
                .is_none_or(|total| total > limit);
            if over {
                warn!(
                    requested = size,
                    block_size,
                    held = state.memory_bytes,
                    limit,
                    "arena memory limit reached"
                );
                return Err(ArenaError::CapacityExceeded {
                    requested: size,
                    limit,
                });
            }
        }

        let layout = Layout::from_size_align(block_size, block_align)
            .map_err(|_| out_of_memory(block_size))?;
        let Some(base) = self.allocator.allocate(layout) else {
            warn!(requested = size, block_size, "backing allocator exhausted");
            return Err(out_of_memory(block_size));
        };
        let capacity = self.allocator.usable_size(layout).max(block_size);

        let mut block = Block::new(base, layout, capacity);
        let offset = block
            .peek(size, align)
            .expect("fresh block is aligned and at least size bytes");
        let ptr = block.bump(offset, size);

        debug!(
            index = state.blocks.len(),
            block_size,
            capacity,
            dedicated,
            "arena block created"
        );
        state.push(block, layout);
        if !dedicated {
            state.next_block_size = self.config.growth.advance(policy_size);
        }
        Ok(ptr)
    }

    /// Rewind every block, invalidating all previous allocations.
    ///
    /// Blocks are kept for reuse, so [`memory_bytes`](Self::memory_bytes)
    /// is unchanged.
    pub fn reset(&mut self) {
        let state = self.state.get_mut();
        state.by_available.clear();
        for (index, block) in state.blocks.iter_mut().enumerate() {
            block.reset();
            state.by_available.insert((block.available(), index));
        }
        state.allocated_bytes = 0;
        debug!(blocks = state.blocks.len(), "arena reset");
    }

    /// Bytes of backing memory held by the arena.
    pub fn memory_bytes(&self) -> usize {
        self.state.borrow().memory_bytes
    }

    /// Bytes requested by callers since creation or the last reset.
    pub fn allocated_bytes(&self) -> usize {
        self.state.borrow().allocated_bytes
    }

    /// Bytes consumed across all blocks, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.state.borrow().blocks.iter().map(Block::used).sum()
    }

    /// Number of blocks currently held.
    pub fn block_count(&self) -> usize {
        self.state.borrow().blocks.len()
    }

    /// Geometry of every block, in creation order.
    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.state.borrow().blocks.iter().map(Block::info).collect()
    }

    /// Size the next policy-sized block will get.
    pub fn next_block_size(&self) -> usize {
        self.state.borrow().next_block_size
    }

    /// Whether `len` bytes at `ptr` lie inside memory this arena handed out.
    pub fn contains(&self, ptr: *const u8, len: usize) -> bool {
        let addr = ptr as usize;
        self.state
            .borrow()
            .blocks
            .iter()
            .any(|block| block.contains(addr, len))
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The backing allocator.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}

impl<A: BlockAllocator> Drop for Arena<A> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.by_available.clear();
        for block in state.blocks.drain(..) {
            block.release(&self.allocator);
        }
    }
}

impl<A: BlockAllocator> fmt::Debug for Arena<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Arena");
        match self.state.try_borrow() {
            Ok(state) => out
                .field("blocks", &state.blocks.len())
                .field("memory_bytes", &state.memory_bytes)
                .field("allocated_bytes", &state.allocated_bytes)
                .field("next_block_size", &state.next_block_size),
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.finish()
    }
}
