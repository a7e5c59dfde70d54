//! Fixed-capacity byte arenas for Strata containers.
//!
//! Two allocators share one ownership model: a single zeroed `Vec<u8>`
//! sized at creation, never grown, released as a whole.
//!
//! ```text
//! Arena        bump cursor, hands out Spans, shared by List/Map
//! OffsetArena  caller-addressed, backs Stack/Deque (header at offset 0)
//! ```
//!
//! Every arena carries a process-unique [`ArenaId`]. Spans record the ID
//! of the arena that minted them, so presenting a span (or a container)
//! to the wrong arena is an error rather than a dangling read.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bump;
pub mod codec;
pub mod config;
pub mod offset;

// Public re-exports for the primary API surface.
pub use bump::Arena;
pub use config::ArenaConfig;
pub use offset::OffsetArena;
pub use strata_core::{ArenaError, ArenaId, Span};
