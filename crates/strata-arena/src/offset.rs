//! Fixed-capacity byte region addressed by caller-chosen offsets.
//!
//! Unlike the bump [`Arena`](crate::Arena), an [`OffsetArena`] keeps no
//! cursor. Every byte of the buffer is addressable from creation, and the
//! structure built on top (stack, deque) decides where each record goes.

use std::fmt;

use strata_core::traits::Resolve;
use strata_core::{ArenaError, ArenaId, Span};
use tracing::trace;

use crate::codec;
use crate::config::ArenaConfig;

/// A zero-initialised byte buffer with bounds-checked offset access.
pub struct OffsetArena {
    id: ArenaId,
    data: Vec<u8>,
}

impl OffsetArena {
    /// Create an offset arena with `capacity` zeroed bytes.
    pub fn init(capacity: u32) -> Self {
        Self {
            id: ArenaId::next(),
            data: vec![0; capacity as usize],
        }
    }

    /// Create an offset arena from a validated [`ArenaConfig`].
    pub fn with_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::init(config.capacity))
    }

    /// Copy `data` into the buffer starting at `offset`.
    ///
    /// Fails with [`ArenaError::OutOfRange`] if the write would run past
    /// the end of the buffer. Nothing is written on failure.
    pub fn put(&mut self, offset: u32, data: &[u8]) -> Result<Span, ArenaError> {
        let len = codec::len_u32(data.len());
        self.bytes_mut(offset, len)?.copy_from_slice(data);
        Ok(Span::new(self.id, offset, len))
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn get(&self, offset: u32, len: u32) -> Result<&[u8], ArenaError> {
        let range = self.check_range(offset, len)?;
        Ok(&self.data[range])
    }

    /// Mutably borrow `len` bytes starting at `offset`.
    pub fn get_mut(&mut self, offset: u32, len: u32) -> Result<&mut [u8], ArenaError> {
        self.bytes_mut(offset, len)
    }

    /// Set `len` bytes starting at `offset` to `byte`.
    pub fn fill(&mut self, offset: u32, len: u32, byte: u8) -> Result<(), ArenaError> {
        self.bytes_mut(offset, len)?.fill(byte);
        Ok(())
    }

    /// Read a little-endian `u32` at `offset`.
    pub fn read_u32(&self, offset: u32) -> Result<u32, ArenaError> {
        codec::read_u32(&self.data, offset)
    }

    /// Write a little-endian `u32` at `offset`.
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), ArenaError> {
        codec::write_u32(&mut self.data, offset, value)
    }

    /// This arena's identity.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> u32 {
        codec::len_u32(self.data.len())
    }

    /// Tear the arena down, releasing its buffer.
    pub fn deinit(self) {
        trace!(arena = %self.id, capacity = self.capacity(), "offset arena torn down");
    }

    fn bytes_mut(&mut self, offset: u32, len: u32) -> Result<&mut [u8], ArenaError> {
        let range = self.check_range(offset, len)?;
        Ok(&mut self.data[range])
    }

    fn check_range(&self, offset: u32, len: u32) -> Result<std::ops::Range<usize>, ArenaError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(offset as usize..end as usize),
            _ => Err(ArenaError::OutOfRange {
                offset,
                len,
                capacity: self.capacity(),
            }),
        }
    }
}

impl Resolve for OffsetArena {
    fn resolve(&self, span: Span) -> Result<&[u8], ArenaError> {
        if span.arena() != self.id {
            return Err(ArenaError::WrongArena {
                expected: span.arena(),
                found: self.id,
            });
        }
        self.get(span.offset(), span.len())
    }
}

impl fmt::Debug for OffsetArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetArena")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .finish()
    }
}
