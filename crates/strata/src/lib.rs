//! Strata: fixed-capacity arenas and the containers built on them.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! // One arena, two independent structures carving records out of it.
//! let mut arena = Arena::init(1024);
//! let mut names = List::create(&arena);
//! let mut ages = Map::create(&arena);
//!
//! names.add(&mut arena, b"ada").unwrap();
//! ages.put_primitive(&mut arena, "ada", &36u8).unwrap();
//!
//! let age = ages.get_primitive(&arena, "ada").unwrap().unwrap();
//! assert_eq!(arena.get(age).unwrap(), &[36]);
//!
//! // A deque owns its own offset-addressed arena.
//! let mut queue = Deque::with_capacity(64).unwrap();
//! queue.push_tail(b"AB").unwrap();
//! queue.push_tail(b"CD").unwrap();
//! assert_eq!(queue.pop_head_vec().unwrap(), b"AB");
//! assert_eq!(queue.used(), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | `ArenaId`, `Span`, `ArenaError`, traits, logging |
//! | [`arena`] | `strata-arena` | `Arena`, `OffsetArena`, `ArenaConfig`, record codec |
//! | [`collections`] | `strata-collections` | `Stack`, `List`, `Map`, `Deque` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core IDs, spans, errors, and logging (`strata-core`).
///
/// Install the tagged log formatter with [`types::logging::init`].
pub use strata_core as types;

/// Bump and offset-addressed arenas (`strata-arena`).
pub use strata_arena as arena;

/// Arena-resident containers (`strata-collections`).
///
/// [`collections::List`] and [`collections::Map`] share a bump
/// [`arena::Arena`]; [`collections::Stack`] and [`collections::Deque`]
/// own or borrow an [`arena::OffsetArena`].
pub use strata_collections as collections;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Arenas
    pub use strata_arena::{Arena, ArenaConfig, OffsetArena};

    // Core types and traits
    pub use strata_core::{Acquire, ArenaError, ArenaId, Resolve, Span};

    // Containers
    pub use strata_collections::{
        Deque, DequeState, List, ListHandle, Map, Primitive, Stack, StackScope, TransferError,
        ValueType,
    };
}
