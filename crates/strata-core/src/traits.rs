//! Core abstraction traits for carving and reading arena bytes.

use crate::error::ArenaError;
use crate::span::Span;

/// Something that can take ownership of a copy of some bytes.
///
/// Implemented by the bump arena, the stack, and stack scopes. Consumers
/// that only need scratch storage (string stores, formatters) should
/// accept `&mut impl Acquire` rather than a concrete allocator.
pub trait Acquire {
    /// Copy `bytes` into storage and return the span they now occupy.
    fn acquire(&mut self, bytes: &[u8]) -> Result<Span, ArenaError>;
}

/// Read-only resolution of a [`Span`] back into bytes.
pub trait Resolve {
    /// Borrow the bytes covered by `span`.
    ///
    /// Fails with [`ArenaError::WrongArena`] if the span was minted by a
    /// different arena.
    fn resolve(&self, span: Span) -> Result<&[u8], ArenaError>;
}
