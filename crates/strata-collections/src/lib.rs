//! Containers whose storage lives entirely inside Strata arenas.
//!
//! None of these types allocate on their own. Each one keeps a few
//! words of bookkeeping and writes every record (node, entry, payload)
//! into an arena:
//!
//! - [`Stack`] and [`Deque`] own or borrow an
//!   [`OffsetArena`](strata_arena::OffsetArena) and persist their header
//!   at offset 0.
//! - [`List`] and [`Map`] bump-allocate from a shared
//!   [`Arena`](strata_arena::Arena) that the caller passes to every
//!   operation. They remember the arena's ID and refuse any other.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod deque;
pub mod list;
pub mod map;
pub mod stack;

pub use deque::{Deque, DequeState};
pub use list::{List, ListHandle, TransferError};
pub use map::{Map, Primitive, ValueType};
pub use stack::{Stack, StackScope};
