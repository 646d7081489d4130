//! Tests for position search

use std::sync::Arc;

use super::*;
use crate::ring::RingBuffer;

fn buffer_of(capacity: usize, items: &[Option<u32>]) -> RingBuffer<Option<u32>> {
    let buffer = RingBuffer::with_capacity(capacity);
    for item in items {
        buffer.put(Arc::new(*item));
    }
    buffer
}

fn find(buffer: &RingBuffer<Option<u32>>, target: u32) -> Option<u64> {
    buffer.inspect(|view| find_position(view, &target, |item| *item))
}

#[test]
fn test_empty_buffer() {
    let buffer = buffer_of(8, &[]);
    assert_eq!(find(&buffer, 1), None);
}

#[test]
fn test_finds_every_key() {
    let items: Vec<_> = (0..20).map(|i| Some(i * 10)).collect();
    let buffer = buffer_of(32, &items);

    for i in 0..20 {
        assert_eq!(find(&buffer, i * 10), Some(u64::from(i)));
    }
}

#[test]
fn test_missing_key() {
    let items: Vec<_> = (1..=10).map(|i| Some(i * 10)).collect();
    let buffer = buffer_of(32, &items);

    assert_eq!(find(&buffer, 5), None);
    assert_eq!(find(&buffer, 55), None);
    assert_eq!(find(&buffer, 500), None);
}

#[test]
fn test_tolerates_keyless_entries() {
    let buffer = buffer_of(
        16,
        &[None, Some(1), None, None, Some(4), None, Some(7), None],
    );

    assert_eq!(find(&buffer, 1), Some(1));
    assert_eq!(find(&buffer, 4), Some(4));
    assert_eq!(find(&buffer, 7), Some(6));
    assert_eq!(find(&buffer, 5), None);
    assert_eq!(find(&buffer, 0), None);
}

#[test]
fn test_keyless_run_around_midpoint() {
    let mut items = vec![Some(1)];
    items.extend(std::iter::repeat_n(None, 10));
    items.push(Some(2));
    let buffer = buffer_of(16, &items);

    assert_eq!(find(&buffer, 1), Some(0));
    assert_eq!(find(&buffer, 2), Some(11));
}

#[test]
fn test_all_keyless_terminates() {
    let buffer = buffer_of(8, &[None; 8]);
    assert_eq!(find(&buffer, 3), None);
}

#[test]
fn test_evicted_keys_not_found() {
    let items: Vec<_> = (0..10).map(Some).collect();
    let buffer = buffer_of(4, &items);

    assert_eq!(find(&buffer, 5), None);
    assert_eq!(find(&buffer, 6), Some(6));
    assert_eq!(find(&buffer, 9), Some(9));
}
