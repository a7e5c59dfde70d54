//! Fixed-capacity bump-allocated byte arena.
//!
//! An [`Arena`] is a pre-allocated, zeroed `Vec<u8>` with a cursor that
//! advances on each allocation. Allocations are never freed individually;
//! the whole buffer is released when the arena is torn down. Because the
//! buffer is sized once and never reallocated, every [`Span`] it hands out
//! stays valid (and its address stable) for the arena's lifetime.

use std::fmt;

use strata_core::traits::{Acquire, Resolve};
use strata_core::{ArenaError, ArenaId, Span};
use tracing::{debug, trace};

use crate::codec;
use crate::config::ArenaConfig;

/// A bump allocator over one fixed-size byte buffer.
///
/// Many independent structures (lists, maps) may carve records out of
/// the same arena. Each of them remembers the arena's [`ArenaId`] and
/// rejects any other arena passed to its operations.
pub struct Arena {
    id: ArenaId,
    /// Backing storage. Allocated to full capacity at creation.
    data: Vec<u8>,
    /// Bump pointer: next free byte.
    used: u32,
}

impl Arena {
    /// Create an arena with `capacity` zeroed bytes.
    pub fn init(capacity: u32) -> Self {
        Self {
            id: ArenaId::next(),
            data: vec![0; capacity as usize],
            used: 0,
        }
    }

    /// Create an arena from a validated [`ArenaConfig`].
    pub fn with_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::init(config.capacity))
    }

    /// Bump-allocate `size` zeroed bytes.
    ///
    /// Returns the span of the reservation, or
    /// [`ArenaError::OutOfSpace`] if fewer than `size` bytes remain.
    pub fn allocate(&mut self, size: u32) -> Result<Span, ArenaError> {
        let end = match self.used.checked_add(size) {
            Some(end) if end <= self.capacity() => end,
            _ => {
                debug!(
                    arena = %self.id,
                    requested = size,
                    remaining = self.remaining(),
                    "allocation rejected"
                );
                return Err(ArenaError::OutOfSpace {
                    requested: size,
                    remaining: self.remaining(),
                });
            }
        };
        let span = Span::new(self.id, self.used, size);
        self.used = end;
        debug_assert!(self.used <= self.capacity());
        Ok(span)
    }

    /// Bump-allocate room for `data` and copy it in.
    pub fn put(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        let span = self.allocate(codec::len_u32(data.len()))?;
        self.data[range(span.offset(), span.len())].copy_from_slice(data);
        Ok(span)
    }

    /// Borrow the bytes of a span minted by this arena.
    pub fn get(&self, span: Span) -> Result<&[u8], ArenaError> {
        self.check_owner(span)?;
        self.bytes(span.offset(), span.len())
    }

    /// Mutably borrow the bytes of a span minted by this arena.
    pub fn get_mut(&mut self, span: Span) -> Result<&mut [u8], ArenaError> {
        self.check_owner(span)?;
        self.bytes_mut(span.offset(), span.len())
    }

    /// Borrow `len` bytes at `offset` within the allocated prefix.
    pub fn bytes(&self, offset: u32, len: u32) -> Result<&[u8], ArenaError> {
        self.check_range(offset, len)?;
        Ok(&self.data[range(offset, len)])
    }

    /// Mutably borrow `len` bytes at `offset` within the allocated prefix.
    pub fn bytes_mut(&mut self, offset: u32, len: u32) -> Result<&mut [u8], ArenaError> {
        self.check_range(offset, len)?;
        Ok(&mut self.data[range(offset, len)])
    }

    /// Read a little-endian `u32` within the allocated prefix.
    pub fn read_u32(&self, offset: u32) -> Result<u32, ArenaError> {
        codec::read_u32(&self.data[..self.used as usize], offset)
    }

    /// Write a little-endian `u32` within the allocated prefix.
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), ArenaError> {
        codec::write_u32(&mut self.data[..self.used as usize], offset, value)
    }

    /// This arena's identity.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> u32 {
        codec::len_u32(self.data.len())
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Bytes still available.
    pub fn remaining(&self) -> u32 {
        self.capacity() - self.used
    }

    /// Address of the first byte of the buffer.
    ///
    /// Exposed for address-stability checks; reading through it is the
    /// caller's business.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Tear the arena down, releasing its buffer in one block.
    ///
    /// Spans minted by this arena can never resolve again: the ID is
    /// not reused by any later arena.
    pub fn deinit(self) {
        trace!(arena = %self.id, used = self.used, "arena torn down");
    }

    fn check_owner(&self, span: Span) -> Result<(), ArenaError> {
        if span.arena() != self.id {
            return Err(ArenaError::WrongArena {
                expected: span.arena(),
                found: self.id,
            });
        }
        Ok(())
    }

    fn check_range(&self, offset: u32, len: u32) -> Result<(), ArenaError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.used => Ok(()),
            _ => Err(ArenaError::OutOfRange {
                offset,
                len,
                capacity: self.used,
            }),
        }
    }
}

fn range(offset: u32, len: u32) -> std::ops::Range<usize> {
    offset as usize..offset as usize + len as usize
}

impl Acquire for Arena {
    fn acquire(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        self.put(bytes)
    }
}

impl Resolve for Arena {
    fn resolve(&self, span: Span) -> Result<&[u8], ArenaError> {
        self.get(span)
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("used", &self.used)
            .finish()
    }
}
