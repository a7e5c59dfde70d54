//! Deterministic payload fixtures.
//!
//! - [`payload`]: one byte string derived from a seed.
//! - [`payloads`]: a batch of variable-length payloads.
//! - [`CountingEquals`]: an equality predicate that counts its calls.

use std::sync::atomic::{AtomicUsize, Ordering};

/// SplitMix64 step. Small, fast, and stable across platforms.
fn mix(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// `len` bytes derived from `seed`. Equal seeds give equal bytes.
pub fn payload(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = mix(state);
            state as u8
        })
        .collect()
}

/// `count` payloads with lengths in `1..=max_len`.
pub fn payloads(count: usize, max_len: usize) -> Vec<Vec<u8>> {
    let max_len = max_len.max(1) as u64;
    (0..count as u64)
        .map(|i| {
            let len = (mix(i ^ 0xA5A5) % max_len) as usize + 1;
            payload(i, len)
        })
        .collect()
}

/// Byte equality that records how many times it was asked.
#[derive(Debug, Default)]
pub struct CountingEquals {
    calls: AtomicUsize,
}

impl CountingEquals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `a` and `b`, counting the call.
    pub fn eq(&self, a: &[u8], b: &[u8]) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        a == b
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_deterministic() {
        assert_eq!(payload(7, 32), payload(7, 32));
        assert_ne!(payload(7, 32), payload(8, 32));
        assert_eq!(payload(1, 0), Vec::<u8>::new());
    }

    #[test]
    fn payloads_respect_length_bounds() {
        let batch = payloads(64, 10);
        assert_eq!(batch.len(), 64);
        assert!(batch.iter().all(|p| (1..=10).contains(&p.len())));
    }

    #[test]
    fn counting_equals_counts() {
        let eq = CountingEquals::new();
        assert!(eq.eq(b"a", b"a"));
        assert!(!eq.eq(b"a", b"b"));
        assert_eq!(eq.calls(), 2);
    }
}
