//! Integration test: stack and deque over offset-addressed arenas.
//!
//! Covers the FIFO scenario at the deque boundary, fill-to-full and
//! wraparound under sustained churn, and the stack's scratch scopes used
//! through the `Acquire` trait.

use strata::prelude::*;
use strata_test_utils::{init_logging, payload, payloads};

/// A consumer that only needs somewhere to copy strings.
fn intern<S: Acquire>(store: &mut S, words: &[&str]) -> Result<Vec<Span>, ArenaError> {
    words.iter().map(|w| store.acquire(w.as_bytes())).collect()
}

#[test]
fn deque_fifo_scenario() {
    init_logging();
    let mut deque = Deque::with_capacity(64).unwrap();
    assert_eq!(deque.used(), 0);
    deque.push_tail(b"AB").unwrap();
    assert_eq!(deque.used(), 2);
    deque.push_tail(b"CD").unwrap();
    assert_eq!(deque.used(), 4);

    let mut buf = [0u8; 2];
    assert_eq!(deque.pop_head(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"AB");
    assert_eq!(deque.used(), 2);
}

#[test]
fn deque_fills_then_rejects() {
    let mut deque = Deque::with_capacity(96).unwrap();
    let entry = payload(1, 16);
    let mut pushed = 0;
    while deque.state() != DequeState::Full {
        if pushed % 2 == 0 {
            deque.push_tail(&entry).unwrap();
        } else {
            deque.push_head(&entry).unwrap();
        }
        pushed += 1;
    }
    assert_eq!(pushed, 4);
    assert_eq!(deque.free(), 0);
    assert!(matches!(
        deque.push_tail(b"x"),
        Err(ArenaError::InsufficientSpace { .. })
    ));
}

#[test]
fn deque_survives_sustained_churn() {
    let mut deque = Deque::with_capacity(256).unwrap();
    let mut expected = std::collections::VecDeque::new();
    for item in payloads(500, 20) {
        while deque.push_tail(&item).is_err() {
            let head = deque.pop_head_vec().unwrap();
            assert_eq!(Some(head), expected.pop_front());
        }
        expected.push_back(item);
    }
    let rest: Vec<Vec<u8>> = deque.iter().map(<[u8]>::to_vec).collect();
    assert_eq!(rest, Vec::from(expected));
}

#[test]
fn deque_borrows_caller_arena() {
    let mut arena = OffsetArena::init(128);
    let mut deque = Deque::create(&mut arena, 64).unwrap();
    let span = deque.push_head(b"kept").unwrap();
    drop(deque);
    assert_eq!(arena.resolve(span).unwrap(), b"kept");
}

#[test]
fn stack_scope_releases_scratch() {
    let mut stack = Stack::with_capacity(64).unwrap();
    let base = stack.push(b"persistent").unwrap();
    let top = stack.top();
    {
        let mut scope = stack.scope();
        let spans = intern(&mut scope, &["alpha", "beta"]).unwrap();
        assert_eq!(scope.get(spans[1]).unwrap(), b"beta");
    }
    assert_eq!(stack.top(), top);
    assert_eq!(stack.get(base).unwrap(), b"persistent");
}

#[test]
fn stack_scope_releases_on_failure() {
    let mut stack = Stack::with_capacity(12).unwrap();
    let result = {
        let mut scope = stack.scope();
        intern(&mut scope, &["fits", "does-not-fit"])
    };
    assert!(matches!(result, Err(ArenaError::InsufficientSpace { .. })));
    assert!(stack.is_empty());
}

#[test]
fn bump_arena_is_an_acquire_target_too() {
    let mut arena = Arena::init(32);
    let spans = intern(&mut arena, &["x", "yz"]).unwrap();
    assert_eq!(arena.get(spans[1]).unwrap(), b"yz");
    assert_eq!(arena.used(), 3);
}
