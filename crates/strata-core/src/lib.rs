//! Core types and traits for Strata arenas and containers.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: arena
//! identities, [`Span`] references, the [`ArenaError`] taxonomy, the
//! [`Acquire`] trait, and the logging setup.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod logging;
pub mod span;
pub mod traits;

pub use error::ArenaError;
pub use id::ArenaId;
pub use span::Span;
pub use traits::{Acquire, Resolve};
