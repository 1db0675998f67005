//! Borrowed byte views.
//!
//! A [`Slice`] is a `(pointer, length)` view into storage it does not own.
//! The borrow checker ties it to the owner's scope, so a slice can never
//! outlive the bytes it points at. Comparisons are byte-wise
//! (`memcmp` semantics, shorter-is-less on a shared prefix).
//!
//! Trimming ([`Slice::remove_prefix`], [`Slice::remove_suffix`]) only moves
//! the view; nothing is ever copied.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use crate::error::SliceError;
use crate::hex;

/// A non-owning view over a run of bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slice<'a> {
    data: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Create a slice over `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The empty slice.
    pub const fn empty() -> Slice<'static> {
        Slice { data: &[] }
    }

    /// Concatenate `parts` into `buf` and return a slice over it.
    ///
    /// The parts are appended after any bytes already in `buf`, reserving
    /// the total length up front. The returned slice covers the whole
    /// buffer.
    pub fn from_parts(parts: &[Slice<'_>], buf: &'a mut Vec<u8>) -> Self {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        buf.reserve(total);
        for part in parts {
            buf.extend_from_slice(part.data);
        }
        Self { data: buf.as_slice() }
    }

    /// The referenced bytes, with the slice's full lifetime.
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Length of the view in bytes.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty.
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Point this slice at the empty array.
    pub fn clear(&mut self) {
        self.data = &[];
    }

    /// Drop the first `n` bytes from the view.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.len()`.
    pub fn remove_prefix(&mut self, n: usize) {
        assert!(
            n <= self.data.len(),
            "remove_prefix({n}) on slice of length {}",
            self.data.len()
        );
        self.data = &self.data[n..];
    }

    /// Drop the last `n` bytes from the view.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.len()`.
    pub fn remove_suffix(&mut self, n: usize) {
        assert!(
            n <= self.data.len(),
            "remove_suffix({n}) on slice of length {}",
            self.data.len()
        );
        self.data = &self.data[..self.data.len() - n];
    }

    /// Three-way byte-wise comparison.
    pub fn compare(&self, other: &Slice<'_>) -> Ordering {
        self.data.cmp(other.data)
    }

    /// Whether this slice begins with `prefix`.
    pub fn starts_with(&self, prefix: &Slice<'_>) -> bool {
        self.data.starts_with(prefix.data)
    }

    /// Whether this slice ends with `suffix`.
    pub fn ends_with(&self, suffix: &Slice<'_>) -> bool {
        self.data.ends_with(suffix.data)
    }

    /// Index of the first byte at which the two slices differ, or the
    /// shorter length if one is a prefix of the other.
    pub fn difference_offset(&self, other: &Slice<'_>) -> usize {
        self.data
            .iter()
            .zip(other.data)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Copy the referenced bytes into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Lowercase hex rendering, two characters per byte.
    pub fn to_hex_string(&self) -> String {
        hex::encode(self.data)
    }

    /// The bytes as UTF-8, replacing invalid sequences.
    pub fn to_str_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.data)
    }

    /// The bytes as UTF-8, if they are valid.
    pub fn as_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.data).ok()
    }

    /// Interpret the bytes as hex text and decode them.
    ///
    /// This is the inverse of [`Slice::to_hex_string`]; upper-case digits
    /// are accepted too.
    pub fn decode_hex(&self) -> Result<Vec<u8>, SliceError> {
        hex::decode(self.data)
    }
}

impl Index<usize> for Slice<'_> {
    type Output = u8;

    fn index(&self, n: usize) -> &u8 {
        &self.data[n]
    }
}

impl AsRef<[u8]> for Slice<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Slice<'a> {
    fn from(data: &'a [u8; N]) -> Self {
        Self { data }
    }
}

impl<'a> From<&'a str> for Slice<'a> {
    fn from(s: &'a str) -> Self {
        Self { data: s.as_bytes() }
    }
}

impl<'a> From<&'a String> for Slice<'a> {
    fn from(s: &'a String) -> Self {
        Self { data: s.as_bytes() }
    }
}

impl<'a> From<&'a Vec<u8>> for Slice<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        Self { data: v.as_slice() }
    }
}

impl PartialEq<[u8]> for Slice<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.data == other
    }
}

impl PartialEq<&[u8]> for Slice<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.data == *other
    }
}

impl PartialEq<&str> for Slice<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.data == other.as_bytes()
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice(\"")?;
        for &b in self.data {
            write!(f, "{}", std::ascii::escape_default(b))?;
        }
        write!(f, "\")")
    }
}
