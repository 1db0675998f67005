//! Slices that can be pinned to memory owned elsewhere.
//!
//! A [`PinnableSlice`] either views bytes it copied into its own buffer
//! ("self-pinned"), or views external bytes without copying ("pinned") and
//! carries a cleanup chain that releases the external reference when the
//! slice is reset or dropped. The lifetime `'a` bounds how long the
//! external bytes must stay addressable; the chain decides when they are
//! given back.
//!
//! ```
//! use badger_core::{PinnableSlice, Slice};
//!
//! let block = b"value-bytes".to_vec();
//! let mut value = PinnableSlice::new();
//! value.pin_slice(Slice::from(&block), || { /* unref the cache entry */ });
//! assert!(value.is_pinned());
//! assert_eq!(value.as_slice(), "value-bytes");
//! value.reset();
//! assert!(value.is_empty());
//! ```

use std::fmt;

use crate::cleanable::{AsCleanable, Cleanable};
use crate::slice::Slice;

#[derive(Clone, Copy)]
enum View<'a> {
    /// Nothing is viewed; length is zero.
    Empty,
    /// The view is the whole owned buffer.
    Owned,
    /// The view points at external bytes kept alive by the chain.
    Pinned(&'a [u8]),
}

/// A slice plus the cleanup obligation (or private copy) that backs it.
pub struct PinnableSlice<'a> {
    view: View<'a>,
    buf: Vec<u8>,
    cleanable: Cleanable,
}

impl<'a> PinnableSlice<'a> {
    /// Create an empty, unpinned slice.
    pub fn new() -> Self {
        Self {
            view: View::Empty,
            buf: Vec::new(),
            cleanable: Cleanable::new(),
        }
    }

    /// Create an empty slice whose owned buffer has room for `capacity`
    /// bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            view: View::Empty,
            buf: Vec::with_capacity(capacity),
            cleanable: Cleanable::new(),
        }
    }

    /// View `slice` without copying and run `cleanup` on reset or drop.
    ///
    /// # Panics
    ///
    /// Panics if the slice is already pinned.
    pub fn pin_slice<F>(&mut self, slice: Slice<'a>, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.assert_unpinned("pin_slice");
        self.view = View::Pinned(slice.as_bytes());
        self.cleanable.register_cleanup(cleanup);
    }

    /// View `slice` without copying and take over every cleanup pending on
    /// `source`.
    ///
    /// `source` is left without cleanups; its entries run after any this
    /// slice already holds.
    ///
    /// # Panics
    ///
    /// Panics if the slice is already pinned.
    pub fn pin_slice_from<T: AsCleanable + ?Sized>(&mut self, slice: Slice<'a>, source: &mut T) {
        self.assert_unpinned("pin_slice_from");
        self.view = View::Pinned(slice.as_bytes());
        source
            .as_cleanable_mut()
            .delegate_cleanups_to(&mut self.cleanable);
    }

    /// Copy `slice` into the owned buffer and view the copy.
    ///
    /// # Panics
    ///
    /// Panics if the slice is pinned.
    pub fn pin_self(&mut self, slice: Slice<'_>) {
        self.assert_unpinned("pin_self");
        self.buf.clear();
        self.buf.extend_from_slice(slice.as_bytes());
        self.view = View::Owned;
    }

    /// View the owned buffer as it currently is.
    ///
    /// Used after editing the buffer in place through
    /// [`PinnableSlice::buffer_mut`].
    ///
    /// # Panics
    ///
    /// Panics if the slice is pinned.
    pub fn repin_self(&mut self) {
        self.assert_unpinned("repin_self");
        self.view = View::Owned;
    }

    /// The owned buffer, for filling in place before [`PinnableSlice::repin_self`].
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    /// Drop the first `n` bytes of the view.
    ///
    /// Pinned slices only move the view. Self-pinned slices shrink the owned
    /// buffer.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.len()`.
    pub fn remove_prefix(&mut self, n: usize) {
        assert!(
            n <= self.len(),
            "remove_prefix({n}) on slice of length {}",
            self.len()
        );
        match self.view {
            View::Pinned(data) => self.view = View::Pinned(&data[n..]),
            View::Owned => {
                self.buf.drain(..n);
            }
            View::Empty => {}
        }
    }

    /// Drop the last `n` bytes of the view.
    ///
    /// Pinned slices only move the view. Self-pinned slices shrink the owned
    /// buffer.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.len()`.
    pub fn remove_suffix(&mut self, n: usize) {
        let len = self.len();
        assert!(n <= len, "remove_suffix({n}) on slice of length {len}");
        match self.view {
            View::Pinned(data) => self.view = View::Pinned(&data[..len - n]),
            View::Owned => self.buf.truncate(len - n),
            View::Empty => {}
        }
    }

    /// Run and clear the cleanup chain, unpin, and empty the view.
    ///
    /// The owned buffer keeps its allocation for reuse. Calling `reset`
    /// again is harmless.
    pub fn reset(&mut self) {
        self.cleanable.reset();
        self.view = View::Empty;
    }

    /// Whether the view points at external bytes.
    pub fn is_pinned(&self) -> bool {
        matches!(self.view, View::Pinned(_))
    }

    /// The current view.
    pub fn as_slice(&self) -> Slice<'_> {
        Slice::new(self.as_bytes())
    }

    /// The current view as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self.view {
            View::Empty => &[],
            View::Owned => &self.buf,
            View::Pinned(data) => data,
        }
    }

    /// Length of the view in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the viewed bytes into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Register an extra cleanup on this slice's chain.
    pub fn register_cleanup<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanable.register_cleanup(f);
    }

    /// Whether the chain has pending cleanups.
    pub fn has_cleanups(&self) -> bool {
        self.cleanable.has_cleanups()
    }

    fn assert_unpinned(&self, op: &str) {
        assert!(
            !self.is_pinned(),
            "{op} on a pinned slice; call reset() first"
        );
    }
}

impl Default for PinnableSlice<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl AsCleanable for PinnableSlice<'_> {
    fn as_cleanable(&self) -> &Cleanable {
        &self.cleanable
    }

    fn as_cleanable_mut(&mut self) -> &mut Cleanable {
        &mut self.cleanable
    }
}

impl PartialEq for PinnableSlice<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PinnableSlice<'_> {}

impl fmt::Debug for PinnableSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnableSlice")
            .field("data", &self.as_slice())
            .field("pinned", &self.is_pinned())
            .field("cleanups", &self.cleanable.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::SharedCleanablePtr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn new_is_empty_and_unpinned() {
        let p = PinnableSlice::new();
        assert!(p.is_empty());
        assert!(!p.is_pinned());
        assert!(!p.has_cleanups());
    }

    #[test]
    fn pin_slice_views_without_copying() {
        let backing = b"external".to_vec();
        let (fired, cleanup) = counter();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), cleanup);

        assert!(p.is_pinned());
        assert_eq!(p.as_bytes().as_ptr(), backing.as_ptr());
        assert_eq!(p.as_slice(), "external");
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        p.reset();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!p.is_pinned());
        assert!(p.is_empty());
    }

    #[test]
    fn drop_releases_pinned_reference() {
        let backing = b"abc".to_vec();
        let (fired, cleanup) = counter();
        {
            let mut p = PinnableSlice::new();
            p.pin_slice(Slice::from(&backing), cleanup);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let backing = b"abc".to_vec();
        let (fired, cleanup) = counter();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), cleanup);
        p.reset();
        p.reset();
        drop(p);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "pin_slice on a pinned slice")]
    fn double_pin_panics() {
        let backing = b"abc".to_vec();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), || {});
        p.pin_slice(Slice::from(&backing), || {});
    }

    #[test]
    #[should_panic(expected = "pin_self on a pinned slice")]
    fn pin_self_while_pinned_panics() {
        let backing = b"abc".to_vec();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), || {});
        p.pin_self(Slice::from("x"));
    }

    #[test]
    fn pin_after_reset_is_allowed() {
        let first = b"first".to_vec();
        let second = b"second".to_vec();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&first), || {});
        p.reset();
        p.pin_slice(Slice::from(&second), || {});
        assert_eq!(p.as_slice(), "second");
    }

    #[test]
    fn pin_self_copies_into_owned_buffer() {
        let mut p = PinnableSlice::new();
        {
            let temp = b"temporary".to_vec();
            p.pin_self(Slice::from(&temp));
        }
        assert!(!p.is_pinned());
        assert!(!p.has_cleanups());
        assert_eq!(p.as_slice(), "temporary");
    }

    #[test]
    fn repin_self_after_in_place_edit() {
        let mut p = PinnableSlice::new();
        p.buffer_mut().extend_from_slice(b"built in place");
        assert!(p.is_empty());
        p.repin_self();
        assert_eq!(p.as_slice(), "built in place");
    }

    #[test]
    fn pinned_trimming_moves_the_view() {
        let backing = b"0123456789".to_vec();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), || {});
        p.remove_prefix(3);
        p.remove_suffix(2);
        assert_eq!(p.as_slice(), "34567");
        assert_eq!(p.as_bytes().as_ptr(), backing[3..].as_ptr());
        assert_eq!(backing, b"0123456789");
    }

    #[test]
    fn owned_trimming_shrinks_the_buffer() {
        let mut p = PinnableSlice::new();
        p.pin_self(Slice::from("0123456789"));
        p.remove_prefix(3);
        p.remove_suffix(2);
        assert_eq!(p.as_slice(), "34567");
        assert_eq!(p.buffer_mut().as_slice(), b"34567");
    }

    #[test]
    #[should_panic(expected = "remove_suffix")]
    fn trimming_past_end_panics() {
        let mut p = PinnableSlice::new();
        p.pin_self(Slice::from("ab"));
        p.remove_suffix(3);
    }

    #[test]
    fn pin_slice_from_takes_over_source_chain() {
        let backing = b"delegated".to_vec();
        let (fired_a, a) = counter();
        let (fired_b, b) = counter();
        let mut source = Cleanable::new();
        source.register_cleanup(a);
        source.register_cleanup(b);

        let mut p = PinnableSlice::new();
        p.pin_slice_from(Slice::from(&backing), &mut source);
        assert!(!source.has_cleanups());
        drop(source);
        assert_eq!(fired_a.load(Ordering::SeqCst), 0);

        drop(p);
        assert_eq!(fired_a.load(Ordering::SeqCst), 1);
        assert_eq!(fired_b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pin_slice_from_empty_source_still_pins() {
        let backing = b"x".to_vec();
        let mut source = Cleanable::new();
        let mut p = PinnableSlice::new();
        p.pin_slice_from(Slice::from(&backing), &mut source);
        assert!(p.is_pinned());
        assert!(!p.has_cleanups());
    }

    #[test]
    fn shared_buffer_pinned_twice_releases_once() {
        let backing = b"shared block".to_vec();
        let (fired, cleanup) = counter();
        let mut shared = SharedCleanablePtr::allocated();
        assert!(shared.register_cleanup(cleanup));

        let mut a = PinnableSlice::new();
        let mut b = PinnableSlice::new();
        a.pin_slice(Slice::from(&backing), || {});
        b.pin_slice(Slice::from(&backing), || {});
        shared.register_copy_with(&mut a);
        shared.register_copy_with(&mut b);
        shared.reset();

        drop(b);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        drop(a);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn moved_slice_keeps_its_obligation() {
        let backing = b"moved".to_vec();
        let (fired, cleanup) = counter();
        let mut p = PinnableSlice::new();
        p.pin_slice(Slice::from(&backing), cleanup);

        let moved = p;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(moved.as_slice(), "moved");
        drop(moved);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn equality_compares_viewed_bytes() {
        let backing = b"same".to_vec();
        let mut pinned = PinnableSlice::new();
        pinned.pin_slice(Slice::from(&backing), || {});
        let mut owned = PinnableSlice::new();
        owned.pin_self(Slice::from("same"));
        assert_eq!(pinned, owned);
    }
}
