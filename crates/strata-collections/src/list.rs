//! Singly linked list whose nodes live in a shared bump arena.
//!
//! Each node is one arena allocation laid out as
//!
//! ```text
//! [size: u32][next: u32][generation: u32][payload: size bytes]
//! ```
//!
//! with `next == NIL` marking the tail. The [`List`] value itself only
//! holds the arena ID, the node count, and the first/last node offsets,
//! so any number of lists (and maps) can share one [`Arena`].
//!
//! Removal unlinks a node without freeing it: the bump arena cannot
//! reclaim bytes. The node's generation is bumped instead, which turns
//! every outstanding [`ListHandle`] to it into a detectable
//! [`ArenaError::StaleHandle`].

use std::error::Error;
use std::fmt;

use strata_arena::codec::{self, WORD};
use strata_arena::Arena;
use strata_core::{ArenaError, ArenaId, Span};
use tracing::debug;

/// Node header size in bytes.
pub const NODE_HEADER: u32 = 3 * WORD;

const NIL: u32 = u32::MAX;
const SIZE_AT: u32 = 0;
const NEXT_AT: u32 = WORD;
const GENERATION_AT: u32 = 2 * WORD;

/// Reference to one list entry, valid until that entry is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListHandle {
    arena: ArenaId,
    node: u32,
    generation: u32,
}

impl ListHandle {
    /// Arena offset of the node header.
    pub fn node(&self) -> u32 {
        self.node
    }

    /// Generation the node had when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// An insertion-ordered list of byte payloads stored in an [`Arena`].
#[derive(Debug)]
pub struct List {
    arena: ArenaId,
    count: u32,
    first: Option<u32>,
    last: Option<u32>,
}

impl List {
    /// Create an empty list bound to `arena`.
    pub fn create(arena: &Arena) -> Self {
        Self {
            arena: arena.id(),
            count: 0,
            first: None,
            last: None,
        }
    }

    /// Append a copy of `data`.
    ///
    /// Fails with [`ArenaError::TooLargeForArena`] if the node could not
    /// fit even in an empty arena, and [`ArenaError::OutOfSpace`] if it
    /// does not fit in what is left.
    pub fn add(&mut self, arena: &mut Arena, data: &[u8]) -> Result<ListHandle, ArenaError> {
        self.check_arena(arena)?;
        let size = codec::len_u32(data.len());
        let need = node_size(size, arena.capacity())?;
        let node = arena.allocate(need)?.offset();

        arena.write_u32(node + SIZE_AT, size)?;
        arena.write_u32(node + NEXT_AT, NIL)?;
        arena.write_u32(node + GENERATION_AT, 0)?;
        arena.bytes_mut(node + NODE_HEADER, size)?.copy_from_slice(data);

        match self.last {
            Some(last) => arena.write_u32(last + NEXT_AT, node)?,
            None => self.first = Some(node),
        }
        self.last = Some(node);
        self.count += 1;
        Ok(ListHandle {
            arena: self.arena,
            node,
            generation: 0,
        })
    }

    /// Iterate payloads from first to last.
    pub fn iter<'a>(&self, arena: &'a Arena) -> Result<Iter<'a>, ArenaError> {
        self.check_arena(arena)?;
        Ok(Iter {
            arena,
            next: self.first,
            remaining: self.count,
        })
    }

    /// Span of the payload at `index`, or `None` past the end.
    pub fn get(&self, arena: &Arena, index: u32) -> Result<Option<Span>, ArenaError> {
        self.check_arena(arena)?;
        match self.locate(arena, index)? {
            Some((_, node)) => payload_span(arena, node).map(Some),
            None => Ok(None),
        }
    }

    /// Unlink the entry at `index` and return its payload span.
    ///
    /// The payload bytes stay readable through the arena until it is torn
    /// down; handles to the entry become stale. Returns `None` past the
    /// end.
    pub fn remove(&mut self, arena: &mut Arena, index: u32) -> Result<Option<Span>, ArenaError> {
        self.check_arena(arena)?;
        let Some((prev, node)) = self.locate(arena, index)? else {
            return Ok(None);
        };
        let next = arena.read_u32(node + NEXT_AT)?;
        match prev {
            Some(prev) => arena.write_u32(prev + NEXT_AT, next)?,
            None => self.first = link(next),
        }
        if self.last == Some(node) {
            self.last = prev;
        }
        arena.write_u32(node + NEXT_AT, NIL)?;
        let generation = arena.read_u32(node + GENERATION_AT)?;
        arena.write_u32(node + GENERATION_AT, generation.wrapping_add(1))?;
        self.count -= 1;
        debug_assert_eq!(self.first.is_none(), self.count == 0);
        payload_span(arena, node).map(Some)
    }

    /// Borrow the payload a handle refers to.
    pub fn resolve<'a>(&self, arena: &'a Arena, handle: ListHandle) -> Result<&'a [u8], ArenaError> {
        self.check_arena(arena)?;
        if handle.arena != self.arena {
            return Err(ArenaError::WrongArena {
                expected: self.arena,
                found: handle.arena,
            });
        }
        let current = arena.read_u32(handle.node + GENERATION_AT)?;
        if current != handle.generation {
            return Err(ArenaError::StaleHandle {
                handle_generation: handle.generation,
                current_generation: current,
            });
        }
        arena.get(payload_span(arena, handle.node)?)
    }

    /// Index of the first payload for which `equals(payload, data)` holds.
    pub fn index_of<F>(&self, arena: &Arena, data: &[u8], equals: F) -> Result<Option<u32>, ArenaError>
    where
        F: Fn(&[u8], &[u8]) -> bool,
    {
        let position = self.iter(arena)?.position(|payload| equals(payload, data));
        Ok(position.map(codec::len_u32))
    }

    /// Move every live entry into `new`, in order, and tear down `old`.
    ///
    /// Space in `new` is checked before anything is copied. On failure
    /// the list and the old arena are handed back untouched inside the
    /// [`TransferError`].
    pub fn transfer(self, old: Arena, new: &mut Arena) -> Result<List, TransferError> {
        match self.copy_into(&old, new) {
            Ok(moved) => {
                debug!(
                    from = %old.id(),
                    to = %new.id(),
                    entries = moved.count,
                    "list transferred"
                );
                old.deinit();
                Ok(moved)
            }
            Err(kind) => Err(TransferError {
                kind,
                list: self,
                arena: old,
            }),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Whether the list has no live entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// ID of the arena the list's nodes live in.
    pub fn arena_id(&self) -> ArenaId {
        self.arena
    }

    fn copy_into(&self, old: &Arena, new: &mut Arena) -> Result<List, ArenaError> {
        let mut need: u32 = 0;
        for payload in self.iter(old)? {
            need = need.saturating_add(node_size(codec::len_u32(payload.len()), u32::MAX)?);
        }
        if need > new.capacity() {
            return Err(ArenaError::TooLargeForArena {
                requested: need,
                capacity: new.capacity(),
            });
        }
        if need > new.remaining() {
            return Err(ArenaError::OutOfSpace {
                requested: need,
                remaining: new.remaining(),
            });
        }
        let mut moved = List::create(new);
        for payload in self.iter(old)? {
            moved.add(new, payload)?;
        }
        Ok(moved)
    }

    /// Walk to `index`, returning `(predecessor, node)`.
    fn locate(&self, arena: &Arena, index: u32) -> Result<Option<(Option<u32>, u32)>, ArenaError> {
        if index >= self.count {
            return Ok(None);
        }
        let mut prev = None;
        let mut node = self.first;
        for _ in 0..index {
            prev = node;
            node = match node {
                Some(at) => link(arena.read_u32(at + NEXT_AT)?),
                None => None,
            };
        }
        Ok(node.map(|node| (prev, node)))
    }

    fn check_arena(&self, arena: &Arena) -> Result<(), ArenaError> {
        if arena.id() != self.arena {
            return Err(ArenaError::WrongArena {
                expected: self.arena,
                found: arena.id(),
            });
        }
        Ok(())
    }
}

fn link(next: u32) -> Option<u32> {
    (next != NIL).then_some(next)
}

fn node_size(payload: u32, capacity: u32) -> Result<u32, ArenaError> {
    match payload.checked_add(NODE_HEADER) {
        Some(need) if need <= capacity => Ok(need),
        _ => Err(ArenaError::TooLargeForArena {
            requested: payload.saturating_add(NODE_HEADER),
            capacity,
        }),
    }
}

fn payload_span(arena: &Arena, node: u32) -> Result<Span, ArenaError> {
    let size = arena.read_u32(node + SIZE_AT)?;
    Ok(Span::new(arena.id(), node + NODE_HEADER, size))
}

/// Forward iterator over list payloads.
pub struct Iter<'a> {
    arena: &'a Arena,
    next: Option<u32>,
    remaining: u32,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let node = self.next?;
        let payload = payload_span(arena, node)
            .and_then(|span| arena.get(span))
            .ok();
        let next = arena.read_u32(node + NEXT_AT).ok();
        debug_assert!(payload.is_some() && next.is_some(), "corrupt list node at {node}");
        self.next = next.and_then(link);
        self.remaining = self.remaining.saturating_sub(1);
        payload
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// A failed [`List::transfer`], carrying back what was moved in.
#[derive(Debug)]
pub struct TransferError {
    /// Why the transfer failed.
    pub kind: ArenaError,
    /// The list, still bound to `arena`.
    pub list: List,
    /// The old arena, not torn down.
    pub arena: Arena,
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list transfer out of {} failed: {}", self.arena.id(), self.kind)
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &List, arena: &Arena) -> Vec<Vec<u8>> {
        list.iter(arena).unwrap().map(<[u8]>::to_vec).collect()
    }

    fn filled(arena: &mut Arena, items: &[&[u8]]) -> List {
        let mut list = List::create(arena);
        for item in items {
            list.add(arena, item).unwrap();
        }
        list
    }

    #[test]
    fn empty_list() {
        let arena = Arena::init(64);
        let list = List::create(&arena);
        assert!(list.is_empty());
        assert_eq!(list.get(&arena, 0).unwrap(), None);
        assert_eq!(list.iter(&arena).unwrap().next(), None);
    }

    #[test]
    fn add_then_get_in_order() {
        let mut arena = Arena::init(256);
        let list = filled(&mut arena, &[b"one", b"two", b"three"]);
        assert_eq!(list.len(), 3);
        let span = list.get(&arena, 1).unwrap().unwrap();
        assert_eq!(arena.get(span).unwrap(), b"two");
        assert_eq!(list.get(&arena, 3).unwrap(), None);
        assert_eq!(collect(&list, &arena), vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn node_occupies_header_plus_payload() {
        let mut arena = Arena::init(64);
        let mut list = List::create(&arena);
        list.add(&mut arena, b"abcd").unwrap();
        assert_eq!(arena.used(), NODE_HEADER + 4);
    }

    #[test]
    fn oversized_node_is_too_large_for_arena() {
        let mut arena = Arena::init(16);
        let mut list = List::create(&arena);
        assert_eq!(
            list.add(&mut arena, &[0; 5]).unwrap_err(),
            ArenaError::TooLargeForArena {
                requested: 17,
                capacity: 16
            }
        );
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn full_arena_is_out_of_space() {
        let mut arena = Arena::init(32);
        let mut list = List::create(&arena);
        list.add(&mut arena, &[1; 8]).unwrap();
        assert!(matches!(
            list.add(&mut arena, &[2; 8]),
            Err(ArenaError::OutOfSpace { .. })
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_middle_splices() {
        let mut arena = Arena::init(256);
        let mut list = filled(&mut arena, &[b"a", b"b", b"c"]);
        let span = list.remove(&mut arena, 1).unwrap().unwrap();
        assert_eq!(arena.get(span).unwrap(), b"b");
        assert_eq!(list.len(), 2);
        assert_eq!(collect(&list, &arena), vec![b"a".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn remove_head_updates_first() {
        let mut arena = Arena::init(256);
        let mut list = filled(&mut arena, &[b"a", b"b"]);
        list.remove(&mut arena, 0).unwrap();
        assert_eq!(collect(&list, &arena), vec![b"b".to_vec()]);
        list.remove(&mut arena, 0).unwrap();
        assert!(list.is_empty());
        list.add(&mut arena, b"z").unwrap();
        assert_eq!(collect(&list, &arena), vec![b"z".to_vec()]);
    }

    #[test]
    fn remove_tail_updates_last() {
        let mut arena = Arena::init(256);
        let mut list = filled(&mut arena, &[b"a", b"b", b"c"]);
        list.remove(&mut arena, 2).unwrap();
        list.add(&mut arena, b"d").unwrap();
        assert_eq!(
            collect(&list, &arena),
            vec![b"a".to_vec(), b"b".to_vec(), b"d".to_vec()]
        );
    }

    #[test]
    fn remove_past_end_is_none() {
        let mut arena = Arena::init(64);
        let mut list = filled(&mut arena, &[b"a"]);
        assert_eq!(list.remove(&mut arena, 1).unwrap(), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn handle_goes_stale_after_remove() {
        let mut arena = Arena::init(128);
        let mut list = List::create(&arena);
        let first = list.add(&mut arena, b"first").unwrap();
        let second = list.add(&mut arena, b"second").unwrap();
        assert_eq!(list.resolve(&arena, first).unwrap(), b"first");
        list.remove(&mut arena, 0).unwrap();
        assert_eq!(
            list.resolve(&arena, first),
            Err(ArenaError::StaleHandle {
                handle_generation: 0,
                current_generation: 1
            })
        );
        assert_eq!(list.resolve(&arena, second).unwrap(), b"second");
    }

    #[test]
    fn index_of_uses_predicate() {
        let mut arena = Arena::init(256);
        let list = filled(&mut arena, &[b"Apple", b"pear", b"APPLE"]);
        let exact = list.index_of(&arena, b"APPLE", |a, b| a == b).unwrap();
        assert_eq!(exact, Some(2));
        let folded = list
            .index_of(&arena, b"apple", |a, b| a.eq_ignore_ascii_case(b))
            .unwrap();
        assert_eq!(folded, Some(0));
        assert_eq!(list.index_of(&arena, b"plum", |a, b| a == b).unwrap(), None);
    }

    #[test]
    fn foreign_arena_is_rejected() {
        let mut home = Arena::init(64);
        let mut other = Arena::init(64);
        let mut list = List::create(&home);
        list.add(&mut home, b"x").unwrap();
        assert_eq!(
            list.add(&mut other, b"y").unwrap_err(),
            ArenaError::WrongArena {
                expected: home.id(),
                found: other.id()
            }
        );
        assert!(list.iter(&other).is_err());
    }

    #[test]
    fn transfer_preserves_order_and_bytes() {
        let mut old = Arena::init(256);
        let mut list = filled(&mut old, &[b"a", b"bb", b"ccc"]);
        list.remove(&mut old, 1).unwrap();
        let stale = list.get(&old, 0).unwrap().unwrap();

        let mut new = Arena::init(256);
        let moved = list.transfer(old, &mut new).unwrap();
        assert_eq!(moved.arena_id(), new.id());
        assert_eq!(collect(&moved, &new), vec![b"a".to_vec(), b"ccc".to_vec()]);
        assert_eq!(new.used(), 2 * NODE_HEADER + 4);
        assert!(matches!(
            new.get(stale),
            Err(ArenaError::WrongArena { .. })
        ));
    }

    #[test]
    fn failed_transfer_hands_everything_back() {
        let mut old = Arena::init(256);
        let list = filled(&mut old, &[b"0123456789", b"abcdefghij"]);
        let mut new = Arena::init(30);
        let err = list.transfer(old, &mut new).unwrap_err();
        assert!(matches!(err.kind, ArenaError::TooLargeForArena { .. }));
        assert_eq!(new.used(), 0);
        assert_eq!(
            collect(&err.list, &err.arena),
            vec![b"0123456789".to_vec(), b"abcdefghij".to_vec()]
        );
    }

    #[test]
    fn transfer_into_crowded_arena_is_out_of_space() {
        let mut old = Arena::init(64);
        let list = filled(&mut old, &[b"abcd"]);
        let mut new = Arena::init(32);
        new.allocate(20).unwrap();
        let err = list.transfer(old, &mut new).unwrap_err();
        assert!(matches!(err.kind, ArenaError::OutOfSpace { .. }));
        assert!(err.to_string().contains("transfer"));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Add(Vec<u8>),
            Remove(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                proptest::collection::vec(any::<u8>(), 0..12).prop_map(Op::Add),
                (0u32..8).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #[test]
            fn matches_vec_model(ops in proptest::collection::vec(op(), 0..48)) {
                let mut arena = Arena::init(4096);
                let mut list = List::create(&arena);
                let mut model: Vec<Vec<u8>> = Vec::new();
                for op in ops {
                    match op {
                        Op::Add(data) => {
                            list.add(&mut arena, &data).unwrap();
                            model.push(data);
                        }
                        Op::Remove(index) => {
                            let removed = list.remove(&mut arena, index).unwrap();
                            if (index as usize) < model.len() {
                                let expected = model.remove(index as usize);
                                prop_assert_eq!(arena.get(removed.unwrap()).unwrap(), &expected[..]);
                            } else {
                                prop_assert!(removed.is_none());
                            }
                        }
                    }
                    prop_assert_eq!(list.len() as usize, model.len());
                }
                prop_assert_eq!(collect(&list, &arena), model);
            }
        }
    }
}
