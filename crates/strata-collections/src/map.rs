//! Insertion-ordered associative map stored in a shared bump arena.
//!
//! Every `put` writes two entries, a KEY and its VALUE, each laid out as
//!
//! ```text
//! [role: u8][value_type: u8][reserved: u16][size: u32][next: u32][paired: u32][data]
//! ```
//!
//! KEY entries are chained through `next` in insertion order and name
//! their VALUE through `paired` (the VALUE points back the same way).
//! Lookup is a linear scan of the KEY chain, O(n) in the number of pairs.
//! There is no hashing, no overwrite, and no removal: a repeated key is
//! stored again and lookups keep returning the first one.

use smallvec::SmallVec;
use strata_arena::codec::{self, WORD};
use strata_arena::Arena;
use strata_core::{ArenaError, ArenaId, Span};
use tracing::debug;

/// Entry header size in bytes.
pub const ENTRY_HEADER: u32 = 4 * WORD;

const NIL: u32 = u32::MAX;
const SIZE_AT: u32 = WORD;
const NEXT_AT: u32 = 2 * WORD;
const PAIRED_AT: u32 = 3 * WORD;

const ROLE_KEY: u8 = 1;
const ROLE_VALUE: u8 = 2;

/// Type tag stored with every key and value.
///
/// Fixed-width integer types compare by value (little-endian bytes);
/// `String` compares bytewise; `Opaque` needs a caller-supplied equality
/// predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// One-byte integer.
    Byte = 0,
    /// Two-byte integer.
    Short = 1,
    /// Four-byte integer.
    Int = 2,
    /// Eight-byte integer.
    Long = 3,
    /// UTF-8 or other byte string.
    String = 4,
    /// Caller-defined bytes.
    Opaque = 5,
}

impl ValueType {
    /// Required width in bytes, for fixed-width types.
    pub fn width(self) -> Option<u32> {
        match self {
            Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Int => Some(4),
            Self::Long => Some(8),
            Self::String | Self::Opaque => None,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Byte),
            1 => Some(Self::Short),
            2 => Some(Self::Int),
            3 => Some(Self::Long),
            4 => Some(Self::String),
            5 => Some(Self::Opaque),
            _ => None,
        }
    }
}

/// Rust types with a canonical [`ValueType`] encoding.
pub trait Primitive {
    /// The tag stored alongside encoded values.
    const TYPE: ValueType;

    /// Little-endian byte encoding.
    fn encode(&self) -> SmallVec<[u8; 8]>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const TYPE: ValueType = ValueType::$tag;

                fn encode(&self) -> SmallVec<[u8; 8]> {
                    SmallVec::from_slice(&self.to_le_bytes())
                }
            }
        )*
    };
}

impl_primitive! {
    u8 => Byte,
    i8 => Byte,
    u16 => Short,
    i16 => Short,
    u32 => Int,
    i32 => Int,
    u64 => Long,
    i64 => Long,
}

impl Primitive for str {
    const TYPE: ValueType = ValueType::String;

    fn encode(&self) -> SmallVec<[u8; 8]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

/// Equality predicate for opaque keys: `(stored, candidate) -> equal`.
pub type Equals<'f> = &'f dyn Fn(&[u8], &[u8]) -> bool;

/// A linear-scan map of typed byte keys to typed byte values.
#[derive(Debug)]
pub struct Map {
    arena: ArenaId,
    first: Option<u32>,
    last: Option<u32>,
    len: u32,
}

impl Map {
    /// Create an empty map bound to `arena`.
    pub fn create(arena: &Arena) -> Self {
        Self {
            arena: arena.id(),
            first: None,
            last: None,
            len: 0,
        }
    }

    /// Store a key/value pair and return the span of the stored key.
    ///
    /// Space for both entries is checked up front, so a failed put
    /// leaves the arena and the map unchanged.
    pub fn put(
        &mut self,
        arena: &mut Arena,
        key: &[u8],
        key_type: ValueType,
        value: &[u8],
        value_type: ValueType,
    ) -> Result<Span, ArenaError> {
        self.check_arena(arena)?;
        let key_len = codec::len_u32(key.len());
        let value_len = codec::len_u32(value.len());
        if let Some(width) = key_type.width() {
            if key_len != width {
                return Err(ArenaError::KeyWidthMismatch {
                    expected: width,
                    found: key_len,
                });
            }
        }
        if let Some(width) = value_type.width() {
            if value_len != width {
                return Err(ArenaError::ValueWidthMismatch {
                    expected: width,
                    found: value_len,
                });
            }
        }

        let need = key_len
            .saturating_add(value_len)
            .saturating_add(2 * ENTRY_HEADER);
        if need > arena.capacity() {
            return Err(ArenaError::TooLargeForArena {
                requested: need,
                capacity: arena.capacity(),
            });
        }
        if need > arena.remaining() {
            debug!(
                arena = %self.arena,
                requested = need,
                remaining = arena.remaining(),
                "map put rejected"
            );
            return Err(ArenaError::OutOfSpace {
                requested: need,
                remaining: arena.remaining(),
            });
        }

        let key_at = arena.allocate(ENTRY_HEADER + key_len)?.offset();
        let value_at = arena.allocate(ENTRY_HEADER + value_len)?.offset();
        write_entry(arena, key_at, ROLE_KEY, key_type, key, value_at)?;
        write_entry(arena, value_at, ROLE_VALUE, value_type, value, key_at)?;

        match self.last {
            Some(last) => arena.write_u32(last + NEXT_AT, key_at)?,
            None => self.first = Some(key_at),
        }
        self.last = Some(key_at);
        self.len += 1;
        Ok(Span::new(arena.id(), key_at + ENTRY_HEADER, key_len))
    }

    /// Find the value stored under the first key equal to `key`.
    ///
    /// Only keys stored with the same `key_type` are considered. Opaque
    /// keys are compared with `equals`, which is required for them
    /// ([`ArenaError::MissingEquality`] otherwise) and ignored for other
    /// types.
    pub fn get(
        &self,
        arena: &Arena,
        key: &[u8],
        key_type: ValueType,
        equals: Option<Equals<'_>>,
    ) -> Result<Option<Span>, ArenaError> {
        self.check_arena(arena)?;
        let predicate = match (key_type, equals) {
            (ValueType::Opaque, Some(equals)) => Some(equals),
            (ValueType::Opaque, None) => return Err(ArenaError::MissingEquality),
            _ => None,
        };
        for entry in self.iter(arena)? {
            if entry.key_type != key_type {
                continue;
            }
            let equal = match predicate {
                Some(equals) => equals(entry.key, key),
                None => entry.key == key,
            };
            if equal {
                return Ok(Some(entry.value_span));
            }
        }
        Ok(None)
    }

    /// Store a pair of primitive values.
    pub fn put_primitive<K, V>(&mut self, arena: &mut Arena, key: &K, value: &V) -> Result<Span, ArenaError>
    where
        K: Primitive + ?Sized,
        V: Primitive + ?Sized,
    {
        self.put(arena, &key.encode(), K::TYPE, &value.encode(), V::TYPE)
    }

    /// Look up a primitive key.
    pub fn get_primitive<K>(&self, arena: &Arena, key: &K) -> Result<Option<Span>, ArenaError>
    where
        K: Primitive + ?Sized,
    {
        self.get(arena, &key.encode(), K::TYPE, None)
    }

    /// Iterate pairs in insertion order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> Result<Entries<'a>, ArenaError> {
        self.check_arena(arena)?;
        Ok(Entries {
            arena,
            next: self.first,
        })
    }

    /// Number of stored pairs, duplicates included.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// ID of the arena the map's entries live in.
    pub fn arena_id(&self) -> ArenaId {
        self.arena
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

fn write_entry(
    arena: &mut Arena,
    at: u32,
    role: u8,
    kind: ValueType,
    data: &[u8],
    paired: u32,
) -> Result<(), ArenaError> {
    let size = codec::len_u32(data.len());
    arena
        .bytes_mut(at, WORD)?
        .copy_from_slice(&[role, kind as u8, 0, 0]);
    arena.write_u32(at + SIZE_AT, size)?;
    arena.write_u32(at + NEXT_AT, NIL)?;
    arena.write_u32(at + PAIRED_AT, paired)?;
    arena
        .bytes_mut(at + ENTRY_HEADER, size)?
        .copy_from_slice(data);
    Ok(())
}

/// One key/value pair read back from the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Key bytes.
    pub key: &'a [u8],
    /// Key type tag.
    pub key_type: ValueType,
    /// Value bytes.
    pub value: &'a [u8],
    /// Value type tag.
    pub value_type: ValueType,
    /// Span of the value bytes.
    pub value_span: Span,
}

/// Iterator over map pairs in insertion order.
pub struct Entries<'a> {
    arena: &'a Arena,
    next: Option<u32>,
}

impl<'a> Entries<'a> {
    fn read(&self, at: u32) -> Result<(Entry<'a>, u32), ArenaError> {
        let (key_span, key_type, key_role) = read_header(self.arena, at)?;
        let value_at = self.arena.read_u32(at + PAIRED_AT)?;
        let (value_span, value_type, value_role) = read_header(self.arena, value_at)?;
        debug_assert_eq!((key_role, value_role), (ROLE_KEY, ROLE_VALUE));
        let next = self.arena.read_u32(at + NEXT_AT)?;
        let entry = Entry {
            key: self.arena.get(key_span)?,
            key_type,
            value: self.arena.get(value_span)?,
            value_type,
            value_span,
        };
        Ok((entry, next))
    }
}

fn read_header(arena: &Arena, at: u32) -> Result<(Span, ValueType, u8), ArenaError> {
    let tags = arena.bytes(at, WORD)?;
    let (role, tag) = (tags[0], tags[1]);
    let kind = ValueType::from_tag(tag).ok_or(ArenaError::OutOfRange {
        offset: at,
        len: ENTRY_HEADER,
        capacity: arena.used(),
    })?;
    let size = arena.read_u32(at + SIZE_AT)?;
    Ok((Span::new(arena.id(), at + ENTRY_HEADER, size), kind, role))
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next?;
        let read = self.read(at);
        debug_assert!(read.is_ok(), "corrupt map entry at {at}: {read:?}");
        let (entry, next) = read.ok()?;
        self.next = (next != NIL).then_some(next);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(arena: &'a Arena, span: Option<Span>) -> &'a [u8] {
        arena.get(span.unwrap()).unwrap()
    }

    #[test]
    fn empty_map_finds_nothing() {
        let arena = Arena::init(64);
        let map = Map::create(&arena);
        assert!(map.is_empty());
        assert_eq!(map.get(&arena, b"k", ValueType::String, None).unwrap(), None);
    }

    #[test]
    fn put_then_get() {
        let mut arena = Arena::init(256);
        let mut map = Map::create(&arena);
        let key = map
            .put(&mut arena, b"name", ValueType::String, b"strata", ValueType::String)
            .unwrap();
        assert_eq!(arena.get(key).unwrap(), b"name");
        let found = map.get(&arena, b"name", ValueType::String, None).unwrap();
        assert_eq!(value(&arena, found), b"strata");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn pair_occupies_two_entries() {
        let mut arena = Arena::init(256);
        let mut map = Map::create(&arena);
        map.put(&mut arena, b"ab", ValueType::String, b"cde", ValueType::String)
            .unwrap();
        assert_eq!(arena.used(), 2 * ENTRY_HEADER + 5);
    }

    #[test]
    fn duplicate_key_returns_first_value() {
        let mut arena = Arena::init(512);
        let mut map = Map::create(&arena);
        map.put_primitive(&mut arena, &7u32, "first").unwrap();
        map.put_primitive(&mut arena, &7u32, "second").unwrap();
        assert_eq!(map.len(), 2);
        let found = map.get_primitive(&arena, &7u32).unwrap();
        assert_eq!(value(&arena, found), b"first");
    }

    #[test]
    fn key_types_do_not_cross_match() {
        let mut arena = Arena::init(512);
        let mut map = Map::create(&arena);
        map.put_primitive(&mut arena, &1u32, &10u8).unwrap();
        map.put_primitive(&mut arena, &1i64, &20u8).unwrap();
        assert_eq!(map.get_primitive(&arena, &1u64).map(|s| value(&arena, s).to_vec()).unwrap(), [20]);
        assert_eq!(map.get_primitive(&arena, &1u16).unwrap(), None);
    }

    #[test]
    fn integer_keys_compare_by_value() {
        let mut arena = Arena::init(512);
        let mut map = Map::create(&arena);
        map.put_primitive(&mut arena, &-3i16, "neg").unwrap();
        map.put_primitive(&mut arena, &3i16, "pos").unwrap();
        assert_eq!(value(&arena, map.get_primitive(&arena, &3i16).unwrap()), b"pos");
        assert_eq!(value(&arena, map.get_primitive(&arena, &-3i16).unwrap()), b"neg");
    }

    #[test]
    fn wrong_key_width_is_rejected() {
        let mut arena = Arena::init(256);
        let mut map = Map::create(&arena);
        assert_eq!(
            map.put(&mut arena, b"abc", ValueType::Int, b"v", ValueType::Byte),
            Err(ArenaError::KeyWidthMismatch {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn wrong_value_width_is_rejected() {
        let mut arena = Arena::init(256);
        let mut map = Map::create(&arena);
        assert_eq!(
            map.put(&mut arena, b"k", ValueType::String, &[1, 2], ValueType::Long),
            Err(ArenaError::ValueWidthMismatch {
                expected: 8,
                found: 2
            })
        );
        assert_eq!(arena.used(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn opaque_keys_need_a_predicate() {
        let mut arena = Arena::init(256);
        let mut map = Map::create(&arena);
        map.put(&mut arena, b"Key", ValueType::Opaque, b"v", ValueType::Opaque)
            .unwrap();
        assert_eq!(
            map.get(&arena, b"key", ValueType::Opaque, None),
            Err(ArenaError::MissingEquality)
        );
        let folded = |a: &[u8], b: &[u8]| a.eq_ignore_ascii_case(b);
        let found = map
            .get(&arena, b"KEY", ValueType::Opaque, Some(&folded))
            .unwrap();
        assert_eq!(value(&arena, found), b"v");
    }

    #[test]
    fn put_is_all_or_nothing() {
        let mut arena = Arena::init(64);
        let mut map = Map::create(&arena);
        arena.allocate(20).unwrap();
        assert!(matches!(
            map.put(&mut arena, b"kk", ValueType::String, b"vvvvvvvvvvvvvvvv", ValueType::String),
            Err(ArenaError::OutOfSpace { .. })
        ));
        assert_eq!(arena.used(), 20);
        assert!(map.is_empty());
    }

    #[test]
    fn pair_larger_than_arena_is_too_large() {
        let mut arena = Arena::init(32);
        let mut map = Map::create(&arena);
        assert!(matches!(
            map.put(&mut arena, b"k", ValueType::String, b"v", ValueType::String),
            Err(ArenaError::TooLargeForArena {
                requested: 34,
                capacity: 32
            })
        ));
    }

    #[test]
    fn iter_yields_pairs_in_order() {
        let mut arena = Arena::init(512);
        let mut map = Map::create(&arena);
        map.put_primitive(&mut arena, "a", &1u8).unwrap();
        map.put_primitive(&mut arena, "b", &2u8).unwrap();
        let pairs: Vec<_> = map
            .iter(&arena)
            .unwrap()
            .map(|e| (e.key.to_vec(), e.value.to_vec(), e.value_type))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (b"a".to_vec(), vec![1], ValueType::Byte),
                (b"b".to_vec(), vec![2], ValueType::Byte),
            ]
        );
    }

    #[test]
    fn maps_and_lists_share_an_arena() {
        let mut arena = Arena::init(512);
        let mut first = Map::create(&arena);
        let mut second = Map::create(&arena);
        first.put_primitive(&mut arena, "k", "one").unwrap();
        second.put_primitive(&mut arena, "k", "two").unwrap();
        assert_eq!(value(&arena, first.get_primitive(&arena, "k").unwrap()), b"one");
        assert_eq!(value(&arena, second.get_primitive(&arena, "k").unwrap()), b"two");
    }

    #[test]
    fn foreign_arena_is_rejected() {
        let home = Arena::init(64);
        let mut other = Arena::init(64);
        let mut map = Map::create(&home);
        assert!(matches!(
            map.put_primitive(&mut other, &1u8, &1u8),
            Err(ArenaError::WrongArena { .. })
        ));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn get_finds_first_put(
                pairs in proptest::collection::vec((0u32..16, any::<u64>()), 1..32),
            ) {
                let mut arena = Arena::init(4096);
                let mut map = Map::create(&arena);
                for (key, val) in &pairs {
                    map.put_primitive(&mut arena, key, val).unwrap();
                }
                for (key, _) in &pairs {
                    let expected = pairs.iter().find(|(k, _)| k == key).map(|(_, v)| *v).unwrap();
                    let span = map.get_primitive(&arena, key).unwrap().unwrap();
                    prop_assert_eq!(arena.get(span).unwrap(), &expected.to_le_bytes()[..]);
                }
                prop_assert_eq!(map.get_primitive(&arena, &99u32).unwrap(), None);
            }
        }
    }
}
