//! LIFO byte stack over an offset-addressed arena.
//!
//! The stack's `{capacity, top}` header is persisted at offset 0 of its
//! arena and rewritten after every push and pop, so the arena bytes alone
//! describe the stack. Pushes land at `top`; pops only move `top` back.
//!
//! [`StackScope`] is the scratch-space entry point: it marks `top` on
//! creation and rewinds (zeroing the released bytes) when dropped, so
//! temporary acquisitions are released on every exit path, `?` included.

use std::borrow::BorrowMut;
use std::fmt;

use strata_arena::codec::{self, WORD};
use strata_arena::OffsetArena;
use strata_core::traits::{Acquire, Resolve};
use strata_core::{ArenaError, Span};
use tracing::{debug, trace};

/// Size of the persisted `{capacity, top}` header.
pub const HEADER: u32 = 2 * WORD;

/// A LIFO stack of raw bytes.
///
/// `A` is either an owned [`OffsetArena`] (see [`Stack::with_capacity`])
/// or a borrowed `&mut OffsetArena` supplied by the caller.
pub struct Stack<A: BorrowMut<OffsetArena>> {
    arena: A,
    capacity: u32,
    top: u32,
}

impl<A: BorrowMut<OffsetArena>> Stack<A> {
    /// Build a stack occupying the first `size` bytes of `arena`.
    ///
    /// `size` includes the header. Fails with
    /// [`ArenaError::TooLargeForArena`] if `size` exceeds the arena and
    /// [`ArenaError::InsufficientSpace`] if it cannot hold the header.
    pub fn init(mut arena: A, size: u32) -> Result<Self, ArenaError> {
        let arena_capacity = arena.borrow().capacity();
        if size > arena_capacity {
            return Err(ArenaError::TooLargeForArena {
                requested: size,
                capacity: arena_capacity,
            });
        }
        if size < HEADER {
            return Err(ArenaError::InsufficientSpace {
                requested: HEADER,
                available: size,
            });
        }
        arena.borrow_mut().fill(0, size, 0)?;
        let mut stack = Self {
            arena,
            capacity: size,
            top: HEADER,
        };
        stack.sync_header()?;
        Ok(stack)
    }

    /// Copy `data` onto the top of the stack.
    pub fn push(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        let len = codec::len_u32(data.len());
        if len > self.remaining() {
            debug!(
                arena = %self.arena.borrow().id(),
                requested = len,
                remaining = self.remaining(),
                "stack push rejected"
            );
            return Err(ArenaError::InsufficientSpace {
                requested: len,
                available: self.remaining(),
            });
        }
        let span = self.arena.borrow_mut().put(self.top, data)?;
        self.top += len;
        self.sync_header()?;
        Ok(span)
    }

    /// Release the top `size` bytes.
    ///
    /// The bytes are left in place. Callers must pop exactly the sizes
    /// they pushed, in reverse order.
    pub fn pop(&mut self, size: u32) -> Result<(), ArenaError> {
        if size > self.used() {
            debug!(
                arena = %self.arena.borrow().id(),
                requested = size,
                pushed = self.used(),
                "stack underflow"
            );
            return Err(ArenaError::StackUnderflow {
                requested: size,
                pushed: self.used(),
            });
        }
        self.top -= size;
        self.sync_header()
    }

    /// Release the top `size` bytes and zero them.
    pub fn pop_and_clear(&mut self, size: u32) -> Result<(), ArenaError> {
        self.pop(size)?;
        self.arena.borrow_mut().fill(self.top, size, 0)
    }

    /// Open a scratch scope that rewinds to the current top when dropped.
    pub fn scope(&mut self) -> StackScope<'_, A> {
        StackScope {
            mark: self.top,
            stack: self,
        }
    }

    /// Borrow the bytes of a span that is still on the stack.
    ///
    /// Spans above `top` (popped) or overlapping the header are reported
    /// as [`ArenaError::OutOfRange`].
    pub fn get(&self, span: Span) -> Result<&[u8], ArenaError> {
        if span.offset() < HEADER || span.end() > self.top {
            return Err(ArenaError::OutOfRange {
                offset: span.offset(),
                len: span.len(),
                capacity: self.top,
            });
        }
        self.arena.borrow().resolve(span)
    }

    /// Offset of the next free byte.
    pub fn top(&self) -> u32 {
        self.top
    }

    /// Total bytes reserved for the stack, header included.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bytes currently pushed.
    pub fn used(&self) -> u32 {
        self.top - HEADER
    }

    /// Bytes that can still be pushed.
    pub fn remaining(&self) -> u32 {
        self.capacity - self.top
    }

    /// Whether nothing is pushed.
    pub fn is_empty(&self) -> bool {
        self.top == HEADER
    }

    /// The arena holding the stack.
    pub fn arena(&self) -> &OffsetArena {
        self.arena.borrow()
    }

    /// Give the arena back, dropping the stack bookkeeping.
    pub fn into_inner(self) -> A {
        self.arena
    }

    /// Tear the stack down. An owned arena is released with it.
    pub fn deinit(self) {
        trace!(arena = %self.arena.borrow().id(), top = self.top, "stack torn down");
    }

    fn rewind(&mut self, mark: u32) -> Result<(), ArenaError> {
        if self.top > mark {
            self.pop_and_clear(self.top - mark)?;
        }
        Ok(())
    }

    fn sync_header(&mut self) -> Result<(), ArenaError> {
        let arena = self.arena.borrow_mut();
        arena.write_u32(0, self.capacity)?;
        arena.write_u32(WORD, self.top)
    }
}

impl Stack<OffsetArena> {
    /// Build a stack with `size` usable bytes in a freshly allocated arena.
    pub fn with_capacity(size: u32) -> Result<Self, ArenaError> {
        let total = size
            .checked_add(HEADER)
            .ok_or(ArenaError::TooLargeForArena {
                requested: size,
                capacity: u32::MAX - HEADER,
            })?;
        Self::init(OffsetArena::init(total), total)
    }
}

impl<A: BorrowMut<OffsetArena>> Acquire for Stack<A> {
    fn acquire(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        self.push(bytes)
    }
}

impl<A: BorrowMut<OffsetArena>> Resolve for Stack<A> {
    fn resolve(&self, span: Span) -> Result<&[u8], ArenaError> {
        self.get(span)
    }
}

impl<A: BorrowMut<OffsetArena>> fmt::Debug for Stack<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("arena", &self.arena.borrow().id())
            .field("capacity", &self.capacity)
            .field("top", &self.top)
            .finish()
    }
}

/// Scratch scope over a [`Stack`].
///
/// Everything pushed through the scope (or through nested scopes) is
/// popped and zeroed when the scope is dropped.
pub struct StackScope<'s, A: BorrowMut<OffsetArena>> {
    stack: &'s mut Stack<A>,
    mark: u32,
}

impl<A: BorrowMut<OffsetArena>> StackScope<'_, A> {
    /// Push `data` for the lifetime of this scope.
    pub fn push(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        self.stack.push(data)
    }

    /// Borrow bytes pushed in this scope or below it.
    pub fn get(&self, span: Span) -> Result<&[u8], ArenaError> {
        self.stack.get(span)
    }

    /// Open a nested scope.
    pub fn scope(&mut self) -> StackScope<'_, A> {
        self.stack.scope()
    }

    /// The top offset this scope rewinds to.
    pub fn mark(&self) -> u32 {
        self.mark
    }

    /// The underlying stack.
    pub fn stack(&self) -> &Stack<A> {
        self.stack
    }
}

impl<A: BorrowMut<OffsetArena>> Acquire for StackScope<'_, A> {
    fn acquire(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        self.push(bytes)
    }
}

impl<A: BorrowMut<OffsetArena>> Drop for StackScope<'_, A> {
    fn drop(&mut self) {
        let rewound = self.stack.rewind(self.mark);
        debug_assert!(rewound.is_ok(), "scope rewind failed: {rewound:?}");
    }
}
