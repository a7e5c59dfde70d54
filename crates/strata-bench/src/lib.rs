//! Benchmark fixtures for Strata arenas and containers.
//!
//! Pre-filled structures sized so a single criterion iteration stays in
//! the microsecond range:
//!
//! - [`filled_list`]: a list of [`REFERENCE_ENTRIES`] payloads
//! - [`filled_map`]: a map keyed `0..REFERENCE_ENTRIES` as `u32`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::Arena;
use strata_collections::{List, Map, ValueType};
use strata_test_utils::payloads;

/// Number of entries in the reference structures.
pub const REFERENCE_ENTRIES: u32 = 1_000;

/// Longest payload in the reference structures.
pub const REFERENCE_MAX_LEN: usize = 32;

/// Arena size comfortably holding either reference structure.
pub const REFERENCE_ARENA_BYTES: u32 = 128 * 1024;

/// A list of deterministic payloads in its own arena.
pub fn filled_list(count: u32) -> (Arena, List) {
    let mut arena = Arena::init(REFERENCE_ARENA_BYTES);
    let mut list = List::create(&arena);
    for item in payloads(count as usize, REFERENCE_MAX_LEN) {
        if list.add(&mut arena, &item).is_err() {
            break;
        }
    }
    (arena, list)
}

/// A map from `u32` keys to deterministic payloads in its own arena.
pub fn filled_map(count: u32) -> (Arena, Map) {
    let mut arena = Arena::init(REFERENCE_ARENA_BYTES);
    let mut map = Map::create(&arena);
    for (key, item) in (0..count).zip(payloads(count as usize, REFERENCE_MAX_LEN)) {
        let stored = map.put(
            &mut arena,
            &key.to_le_bytes(),
            ValueType::Int,
            &item,
            ValueType::Opaque,
        );
        if stored.is_err() {
            break;
        }
    }
    (arena, map)
}
