//! Arena-relative byte references.
//!
//! A [`Span`] replaces a raw pointer into an arena. It names the arena it
//! came from, so resolution is validated at the boundary rather than
//! trusted.

use std::fmt;

use crate::id::ArenaId;

/// A `(arena, offset, len)` reference to bytes inside an arena.
///
/// Spans are plain values: cheap to copy and never dangling in the
/// memory-safety sense. Resolving a span against any arena other than the
/// one that produced it fails with [`ArenaError::WrongArena`].
///
/// [`ArenaError::WrongArena`]: crate::ArenaError::WrongArena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    arena: ArenaId,
    offset: u32,
    len: u32,
}

impl Span {
    /// Create a span. Only arenas mint spans; callers receive them.
    pub fn new(arena: ArenaId, offset: u32, len: u32) -> Self {
        Self { arena, offset, len }
    }

    /// The arena this span points into.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Byte offset of the first byte.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte. Saturates instead of wrapping.
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// Whether the two spans share at least one byte of the same arena.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.arena == other.arena
            && !self.is_empty()
            && !other.is_empty()
            && self.offset < other.end()
            && other.offset < self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.arena, self.offset, self.end())
    }
}
