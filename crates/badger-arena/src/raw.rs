//! Low-level pointer primitives for arena memory.
//!
//! Every function here takes a pointer into a live block region handed
//! out by `Block::bump`. Callers guarantee the region is large enough and
//! suitably aligned, and that nothing else aliases it for the returned
//! lifetime.

#![allow(unsafe_code)]

use std::ptr::NonNull;

/// Pointer `count` bytes past `base`.
///
/// # Safety
///
/// `base + count` must stay within (or one past) the same allocation.
#[inline]
pub(crate) unsafe fn offset(base: NonNull<u8>, count: usize) -> NonNull<u8> {
    // SAFETY: caller keeps the result inside the block.
    unsafe { base.add(count) }
}

/// Move `value` into the region and borrow it.
///
/// # Safety
///
/// `ptr` must be valid for writes of `T` and aligned for `T`.
#[inline]
pub(crate) unsafe fn write_value<'a, T>(ptr: NonNull<u8>, value: T) -> &'a mut T {
    let ptr = ptr.cast::<T>();
    // SAFETY: caller guarantees validity and alignment; the region is
    // fresh, so no previous value needs dropping.
    unsafe {
        ptr.as_ptr().write(value);
        &mut *ptr.as_ptr()
    }
}

/// Zero `len` bytes and borrow them.
///
/// # Safety
///
/// `ptr` must be valid for writes of `len` bytes.
#[inline]
pub(crate) unsafe fn zeroed_bytes<'a>(ptr: NonNull<u8>, len: usize) -> &'a mut [u8] {
    // SAFETY: caller guarantees `len` writable bytes; after the write
    // every byte is initialised.
    unsafe {
        ptr.as_ptr().write_bytes(0, len);
        std::slice::from_raw_parts_mut(ptr.as_ptr(), len)
    }
}

/// Copy `src` into the region and borrow the copy.
///
/// # Safety
///
/// `ptr` must be valid for writes of `src.len()` values of `T`, aligned
/// for `T`, and must not overlap `src`.
#[inline]
pub(crate) unsafe fn copy_slice<'a, T: Copy>(ptr: NonNull<u8>, src: &[T]) -> &'a mut [T] {
    let dst = ptr.cast::<T>().as_ptr();
    // SAFETY: caller guarantees a disjoint, aligned, writable destination.
    unsafe {
        std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
        std::slice::from_raw_parts_mut(dst, src.len())
    }
}

/// Write `count` clones of `value` into the region and borrow them.
///
/// # Safety
///
/// `ptr` must be valid for writes of `count` values of `T` and aligned
/// for `T`.
pub(crate) unsafe fn fill<'a, T: Clone>(ptr: NonNull<u8>, count: usize, value: T) -> &'a mut [T] {
    let dst = ptr.cast::<T>().as_ptr();
    if count > 0 {
        for i in 0..count - 1 {
            // SAFETY: `i < count`, inside the caller-provided region.
            unsafe { dst.add(i).write(value.clone()) };
        }
        // SAFETY: last slot of the region.
        unsafe { dst.add(count - 1).write(value) };
    }
    // SAFETY: all `count` slots written above.
    unsafe { std::slice::from_raw_parts_mut(dst, count) }
}

/// Borrow `len` initialised bytes as a shared slice.
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` initialised bytes that are not
/// mutated for the returned lifetime.
#[inline]
pub(crate) unsafe fn bytes<'a>(ptr: NonNull<u8>, len: usize) -> &'a [u8] {
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }
}
