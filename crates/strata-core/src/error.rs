//! Error taxonomy for arenas and the containers built on them.
//!
//! Every fallible operation in the workspace returns
//! `Result<T, ArenaError>`. Lookups that can legitimately find nothing
//! (list `get`, map `get`, `index_of`) return `Ok(None)` instead of an
//! error variant.

use std::error::Error;
use std::fmt;

use crate::id::ArenaId;

/// Errors that can occur during arena and container operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The bump arena has too little space left for the request.
    OutOfSpace {
        /// Number of bytes requested.
        requested: u32,
        /// Bytes still free in the arena.
        remaining: u32,
    },
    /// The request can never fit, even in an empty arena of this size.
    TooLargeForArena {
        /// Number of bytes requested.
        requested: u32,
        /// Total capacity of the arena.
        capacity: u32,
    },
    /// A span or structure was used with an arena it does not belong to.
    ///
    /// This is how a dangling arena reference surfaces: spans and
    /// structures remember the [`ArenaId`] they were created in, and IDs
    /// are never reused.
    WrongArena {
        /// The arena the span or structure belongs to.
        expected: ArenaId,
        /// The arena it was resolved against.
        found: ArenaId,
    },
    /// An offset-addressed access fell outside the arena.
    OutOfRange {
        /// Requested start offset.
        offset: u32,
        /// Requested length in bytes.
        len: u32,
        /// Capacity (or allocated extent) of the arena.
        capacity: u32,
    },
    /// A deque entry is larger than the deque's whole region.
    DataTooLarge {
        /// Payload size in bytes.
        requested: u32,
        /// Deque region capacity in bytes.
        capacity: u32,
    },
    /// A stack or deque has no contiguous room for the request right now.
    InsufficientSpace {
        /// Bytes needed, including any record header.
        requested: u32,
        /// Bytes available where the record would have to go.
        available: u32,
    },
    /// A push was given a zero-length payload.
    EmptyPayload,
    /// `pop_head` on an empty deque.
    PopHeadEmpty,
    /// `pop_tail` on an empty deque.
    PopTailEmpty,
    /// A stack pop asked for more bytes than are currently pushed.
    StackUnderflow {
        /// Bytes the caller asked to pop.
        requested: u32,
        /// Bytes currently pushed above the header.
        pushed: u32,
    },
    /// A list handle refers to an entry that has since been removed.
    StaleHandle {
        /// The generation encoded in the handle.
        handle_generation: u32,
        /// The generation currently stored in the entry.
        current_generation: u32,
    },
    /// The caller's buffer is shorter than the entry being popped.
    BufferTooSmall {
        /// Entry size in bytes.
        needed: usize,
        /// Buffer size in bytes.
        provided: usize,
    },
    /// A primitive map key has the wrong number of bytes for its type.
    KeyWidthMismatch {
        /// Width required by the key type.
        expected: u32,
        /// Width of the supplied key.
        found: u32,
    },
    /// A primitive map value has the wrong number of bytes for its type.
    ValueWidthMismatch {
        /// Width required by the value type.
        expected: u32,
        /// Width of the supplied value.
        found: u32,
    },
    /// An opaque map key was looked up without an equality predicate.
    MissingEquality,
    /// Configuration rejected at construction.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfSpace {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "arena out of space: requested {requested} bytes, {remaining} bytes remaining"
                )
            }
            Self::TooLargeForArena {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "request of {requested} bytes exceeds arena capacity of {capacity} bytes"
                )
            }
            Self::WrongArena { expected, found } => {
                write!(f, "wrong arena: expected {expected}, found {found}")
            }
            Self::OutOfRange {
                offset,
                len,
                capacity,
            } => {
                write!(
                    f,
                    "range {offset}+{len} is out of bounds for {capacity} bytes"
                )
            }
            Self::DataTooLarge {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "entry of {requested} bytes exceeds deque capacity of {capacity} bytes"
                )
            }
            Self::InsufficientSpace {
                requested,
                available,
            } => {
                write!(
                    f,
                    "insufficient space: need {requested} bytes, {available} bytes available"
                )
            }
            Self::EmptyPayload => write!(f, "payload must not be empty"),
            Self::PopHeadEmpty => write!(f, "cannot pop head: deque is empty"),
            Self::PopTailEmpty => write!(f, "cannot pop tail: deque is empty"),
            Self::StackUnderflow { requested, pushed } => {
                write!(
                    f,
                    "cannot pop {requested} bytes: only {pushed} bytes are pushed"
                )
            }
            Self::StaleHandle {
                handle_generation,
                current_generation,
            } => {
                write!(
                    f,
                    "stale handle: generation {handle_generation}, entry is at generation {current_generation}"
                )
            }
            Self::BufferTooSmall { needed, provided } => {
                write!(
                    f,
                    "buffer too small: entry needs {needed} bytes, buffer holds {provided}"
                )
            }
            Self::KeyWidthMismatch { expected, found } => {
                write!(f, "key must be {expected} bytes wide, got {found}")
            }
            Self::ValueWidthMismatch { expected, found } => {
                write!(f, "value must be {expected} bytes wide, got {found}")
            }
            Self::MissingEquality => {
                write!(f, "opaque keys require an equality predicate")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
