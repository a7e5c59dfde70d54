//! Circular double-ended queue of variable-size entries.
//!
//! The deque owns (or borrows) an [`OffsetArena`]. A 24-byte header sits
//! at offset 0 and the entry region follows it:
//!
//! ```text
//! 0        24                                            24 + size
//! [header ][ back run ][   gap   ][ front run ][  slack  ]
//!            ^tail grows →        ← head grows^
//! ```
//!
//! Each entry is boundary-tagged, `[size: u32][data][size: u32]`, so it
//! can be found from either end. Live entries form at most two physically
//! contiguous runs. The front run holds the head; once the deque has
//! wrapped, the back run holds the tail and sits physically below the
//! front run. While wrapped, the only space either end can grow into is
//! the gap between the two runs. When a run is exhausted by popping, the
//! deque unwraps; when the last entry leaves, the cursors are reseeded at
//! the middle of the region.

use std::borrow::BorrowMut;
use std::fmt;

use strata_arena::codec::{self, WORD};
use strata_arena::OffsetArena;
use strata_core::{ArenaError, Span};
use tracing::{debug, trace};

/// Size of the persisted header.
pub const HEADER: u32 = 6 * WORD;

/// Per-entry overhead of the two boundary tags.
pub const ENTRY_OVERHEAD: u32 = 2 * WORD;

const CAPACITY_AT: u32 = 0;
const USED_AT: u32 = WORD;
const LEN_AT: u32 = 2 * WORD;
const HEAD_AT: u32 = 3 * WORD;
const TAIL_AT: u32 = 4 * WORD;
const STATE_AT: u32 = 5 * WORD;

/// Fill level of a deque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DequeState {
    /// No entries.
    Empty = 0,
    /// Some entries, some free bytes.
    Occupied = 1,
    /// Every byte of the region is in use.
    Full = 2,
}

/// A physically contiguous sequence of entries, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    start: u32,
    end: u32,
}

impl Run {
    fn empty_at(at: u32) -> Self {
        Self { start: at, end: at }
    }

    fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A double-ended queue of byte payloads in a fixed region.
pub struct Deque<A: BorrowMut<OffsetArena>> {
    arena: A,
    start: u32,
    end: u32,
    used: u32,
    len: u32,
    front: Run,
    back: Option<Run>,
}

impl<A: BorrowMut<OffsetArena>> Deque<A> {
    /// Build a deque with a `size`-byte region inside `arena`.
    ///
    /// The header takes the first [`HEADER`] bytes; fails with
    /// [`ArenaError::TooLargeForArena`] if header plus region exceed the
    /// arena.
    pub fn create(mut arena: A, size: u32) -> Result<Self, ArenaError> {
        let capacity = arena.borrow().capacity();
        let end = match size.checked_add(HEADER) {
            Some(end) if end <= capacity => end,
            _ => {
                return Err(ArenaError::TooLargeForArena {
                    requested: size.saturating_add(HEADER),
                    capacity,
                })
            }
        };
        arena.borrow_mut().fill(0, end, 0)?;
        let mut deque = Self {
            arena,
            start: HEADER,
            end,
            used: 0,
            len: 0,
            front: Run::empty_at(HEADER + size / 2),
            back: None,
        };
        deque.sync_header()?;
        Ok(deque)
    }

    /// Add an entry before the current head.
    pub fn push_head(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        let record = self.admit(data)?;
        let at = if self.len == 0 {
            let end = self.end.min(self.mid().max(self.start + record));
            self.front = Run::empty_at(end);
            end - record
        } else if let Some(back) = self.back {
            if self.front.start - back.end < record {
                return Err(self.no_gap(record, self.front.start - back.end));
            }
            self.front.start - record
        } else if self.front.start - self.start >= record {
            self.front.start - record
        } else if self.end - self.front.end >= record {
            self.back = Some(self.front);
            self.front = Run::empty_at(self.end);
            self.end - record
        } else {
            let widest = (self.front.start - self.start).max(self.end - self.front.end);
            return Err(self.no_gap(record, widest));
        };
        self.front.start = at;
        self.commit(at, data)
    }

    /// Add an entry after the current tail.
    pub fn push_tail(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        let record = self.admit(data)?;
        let at = if self.len == 0 {
            let at = self.start.max(self.mid().min(self.end - record));
            self.front = Run::empty_at(at);
            self.front.end = at + record;
            at
        } else if let Some(mut back) = self.back {
            if self.front.start - back.end < record {
                return Err(self.no_gap(record, self.front.start - back.end));
            }
            let at = back.end;
            back.end += record;
            self.back = Some(back);
            at
        } else if self.end - self.front.end >= record {
            let at = self.front.end;
            self.front.end += record;
            at
        } else if self.front.start - self.start >= record {
            self.back = Some(Run {
                start: self.start,
                end: self.start + record,
            });
            self.start
        } else {
            let widest = (self.front.start - self.start).max(self.end - self.front.end);
            return Err(self.no_gap(record, widest));
        };
        self.commit(at, data)
    }

    /// Remove the head entry, copying it into `buf`.
    ///
    /// Returns the number of bytes copied. If `buf` is too short the
    /// deque is left unchanged.
    pub fn pop_head(&mut self, buf: &mut [u8]) -> Result<usize, ArenaError> {
        if self.len == 0 {
            return Err(ArenaError::PopHeadEmpty);
        }
        let at = self.front.start;
        let size = self.arena.borrow().read_u32(at)?;
        let copied = self.copy_out(at + WORD, size, buf)?;
        self.front.start += size + ENTRY_OVERHEAD;
        if self.front.is_empty() {
            if let Some(back) = self.back.take() {
                self.front = back;
            }
        }
        self.release(size)?;
        Ok(copied)
    }

    /// Remove the tail entry, copying it into `buf`.
    ///
    /// Returns the number of bytes copied. If `buf` is too short the
    /// deque is left unchanged.
    pub fn pop_tail(&mut self, buf: &mut [u8]) -> Result<usize, ArenaError> {
        if self.len == 0 {
            return Err(ArenaError::PopTailEmpty);
        }
        let run = self.back.unwrap_or(self.front);
        let size = self.arena.borrow().read_u32(run.end - WORD)?;
        let at = run.end - ENTRY_OVERHEAD - size;
        let copied = self.copy_out(at + WORD, size, buf)?;
        if let Some(mut back) = self.back {
            back.end = at;
            self.back = (!back.is_empty()).then_some(back);
        } else {
            self.front.end = at;
        }
        self.release(size)?;
        Ok(copied)
    }

    /// Remove the head entry into a fresh `Vec`.
    pub fn pop_head_vec(&mut self) -> Result<Vec<u8>, ArenaError> {
        let mut buf = vec![0; self.peek_head()?.map_or(0, <[u8]>::len)];
        let copied = self.pop_head(&mut buf)?;
        buf.truncate(copied);
        Ok(buf)
    }

    /// Remove the tail entry into a fresh `Vec`.
    pub fn pop_tail_vec(&mut self) -> Result<Vec<u8>, ArenaError> {
        let mut buf = vec![0; self.peek_tail()?.map_or(0, <[u8]>::len)];
        let copied = self.pop_tail(&mut buf)?;
        buf.truncate(copied);
        Ok(buf)
    }

    /// Borrow the head entry without removing it.
    pub fn peek_head(&self) -> Result<Option<&[u8]>, ArenaError> {
        if self.len == 0 {
            return Ok(None);
        }
        let arena = self.arena.borrow();
        let size = arena.read_u32(self.front.start)?;
        arena.get(self.front.start + WORD, size).map(Some)
    }

    /// Borrow the tail entry without removing it.
    pub fn peek_tail(&self) -> Result<Option<&[u8]>, ArenaError> {
        if self.len == 0 {
            return Ok(None);
        }
        let arena = self.arena.borrow();
        let end = self.back.unwrap_or(self.front).end;
        let size = arena.read_u32(end - WORD)?;
        arena.get(end - WORD - size, size).map(Some)
    }

    /// Iterate entries from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            arena: self.arena.borrow(),
            run: self.front,
            then: self.back,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the deque holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload bytes stored, excluding boundary tags.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Region bytes in use, boundary tags included.
    pub fn occupied(&self) -> u32 {
        self.used + self.len * ENTRY_OVERHEAD
    }

    /// Region bytes not in use. Not necessarily contiguous.
    pub fn free(&self) -> u32 {
        self.capacity() - self.occupied()
    }

    /// Size of the entry region.
    pub fn capacity(&self) -> u32 {
        self.end - self.start
    }

    /// Current fill level.
    pub fn state(&self) -> DequeState {
        if self.len == 0 {
            DequeState::Empty
        } else if self.occupied() == self.capacity() {
            DequeState::Full
        } else {
            DequeState::Occupied
        }
    }

    /// Offset of the head entry.
    pub fn head(&self) -> u32 {
        self.front.start
    }

    /// Offset one past the tail entry.
    pub fn tail(&self) -> u32 {
        self.back.unwrap_or(self.front).end
    }

    /// Whether the live entries currently wrap around the region end.
    pub fn is_wrapped(&self) -> bool {
        self.back.is_some()
    }

    /// The arena holding the deque.
    pub fn arena(&self) -> &OffsetArena {
        self.arena.borrow()
    }

    /// Give the arena back, dropping the deque bookkeeping.
    pub fn into_inner(self) -> A {
        self.arena
    }

    /// Tear the deque down. An owned arena is released with it.
    pub fn deinit(self) {
        trace!(arena = %self.arena.borrow().id(), len = self.len, "deque torn down");
    }

    fn mid(&self) -> u32 {
        self.start + (self.end - self.start) / 2
    }

    /// Validate a payload and return its record size.
    fn admit(&self, data: &[u8]) -> Result<u32, ArenaError> {
        let len = codec::len_u32(data.len());
        if len == 0 {
            return Err(ArenaError::EmptyPayload);
        }
        if len > self.capacity() {
            return Err(ArenaError::DataTooLarge {
                requested: len,
                capacity: self.capacity(),
            });
        }
        let record = len.saturating_add(ENTRY_OVERHEAD);
        if self.occupied().saturating_add(record) > self.capacity() {
            return Err(self.no_gap(record, self.free()));
        }
        Ok(record)
    }

    fn no_gap(&self, requested: u32, available: u32) -> ArenaError {
        debug!(
            arena = %self.arena.borrow().id(),
            requested,
            available,
            len = self.len,
            "deque push rejected"
        );
        ArenaError::InsufficientSpace {
            requested,
            available,
        }
    }

    fn commit(&mut self, at: u32, data: &[u8]) -> Result<Span, ArenaError> {
        let size = codec::len_u32(data.len());
        let arena = self.arena.borrow_mut();
        arena.write_u32(at, size)?;
        let span = arena.put(at + WORD, data)?;
        arena.write_u32(at + WORD + size, size)?;
        self.used += size;
        self.len += 1;
        debug_assert!(self.occupied() <= self.capacity());
        debug_assert!(self.start <= self.front.start && self.front.end <= self.end);
        self.sync_header()?;
        Ok(span)
    }

    fn copy_out(&self, at: u32, size: u32, buf: &mut [u8]) -> Result<usize, ArenaError> {
        let needed = size as usize;
        if buf.len() < needed {
            return Err(ArenaError::BufferTooSmall {
                needed,
                provided: buf.len(),
            });
        }
        buf[..needed].copy_from_slice(self.arena.borrow().get(at, size)?);
        Ok(needed)
    }

    fn release(&mut self, size: u32) -> Result<(), ArenaError> {
        self.used -= size;
        self.len -= 1;
        if self.len == 0 {
            self.front = Run::empty_at(self.mid());
            self.back = None;
        }
        debug_assert_eq!(self.len == 0, self.used == 0);
        self.sync_header()
    }

    fn sync_header(&mut self) -> Result<(), ArenaError> {
        let fields = [
            (CAPACITY_AT, self.capacity()),
            (USED_AT, self.used),
            (LEN_AT, self.len),
            (HEAD_AT, self.head()),
            (TAIL_AT, self.tail()),
            (STATE_AT, self.state() as u32),
        ];
        let arena = self.arena.borrow_mut();
        for (at, value) in fields {
            arena.write_u32(at, value)?;
        }
        Ok(())
    }
}

impl Deque<OffsetArena> {
    /// Build a deque with a `size`-byte region in a freshly allocated arena.
    pub fn with_capacity(size: u32) -> Result<Self, ArenaError> {
        let total = size
            .checked_add(HEADER)
            .ok_or(ArenaError::TooLargeForArena {
                requested: size,
                capacity: u32::MAX - HEADER,
            })?;
        Self::create(OffsetArena::init(total), size)
    }
}

impl<A: BorrowMut<OffsetArena>> fmt::Debug for Deque<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deque")
            .field("arena", &self.arena.borrow().id())
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("used", &self.used)
            .field("head", &self.head())
            .field("tail", &self.tail())
            .field("wrapped", &self.is_wrapped())
            .finish()
    }
}

/// Head-to-tail iterator over deque entries.
pub struct Iter<'a> {
    arena: &'a OffsetArena,
    run: Run,
    then: Option<Run>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.run.is_empty() {
            self.run = self.then.take()?;
        }
        let arena = self.arena;
        let at = self.run.start;
        let entry = arena
            .read_u32(at)
            .and_then(|size| arena.get(at + WORD, size));
        debug_assert!(entry.is_ok(), "corrupt deque entry at {at}: {entry:?}");
        let entry = entry.ok()?;
        self.run.start += codec::len_u32(entry.len()) + ENTRY_OVERHEAD;
        Some(entry)
    }
}
