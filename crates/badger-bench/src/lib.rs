//! Workload generators for the Badger benchmarks.
//!
//! All generators are seeded, so a given seed always yields the same
//! workload:
//!
//! - [`request_sizes`]: allocation sizes skewed towards small requests
//! - [`key_values`]: memtable-style key/value pairs
//! - [`random_bytes`]: one buffer of arbitrary bytes

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `n` allocation sizes in `1..=max`.
///
/// Three quarters of the requests are at most 64 bytes, the rest are
/// spread uniformly up to `max`, roughly the mix a memtable sees.
pub fn request_sizes(seed: u64, n: usize, max: usize) -> Vec<usize> {
    assert!(max > 0, "max must be non-zero");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let roll = rng.next_u32();
            let cap = if roll % 4 == 0 { max } else { max.min(64) };
            1 + (rng.next_u64() as usize) % cap
        })
        .collect()
}

/// Generate `n` key/value pairs with zero-padded sequential keys and
/// random values of 16 to 128 bytes.
pub fn key_values(seed: u64, n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let key = format!("key{i:08}").into_bytes();
            let len = 16 + (rng.next_u32() as usize) % 113;
            let mut value = vec![0u8; len];
            rng.fill_bytes(&mut value);
            (key, value)
        })
        .collect()
}

/// Generate `len` random bytes.
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = vec![0u8; len];
    rng.fill_bytes(&mut out);
    out
}
