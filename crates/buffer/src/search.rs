//! Binary search over buffered positions
//!
//! Items are keyed by a value that grows with insertion order (envelope
//! identities are time-ordered). Not every item has to carry a key: when a
//! probe lands on a keyless slot the search scans outward for the nearest
//! keyed neighbour inside the current bounds and compares against that one.

use std::cmp::Ordering;

use crate::ring::RingView;

/// Find the position of the buffered item whose key equals `target`
///
/// `key` returns None for items that carry no key. Keys must be strictly
/// increasing with position among keyed items.
pub fn find_position<T, K, F>(view: &RingView<'_, T>, target: &K, key: F) -> Option<u64>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut lo = view.head();
    let mut hi = view.write_pos();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;

        // No keyed item left between the bounds
        let (probe, probe_key) = nearest_keyed(view, mid, lo, hi, &key)?;

        match probe_key.cmp(target) {
            Ordering::Equal => return Some(probe),
            Ordering::Less => lo = probe + 1,
            Ordering::Greater => hi = probe,
        }
    }

    None
}

/// Nearest keyed position to `mid` within `[lo, hi)`, preferring lower
/// positions on ties
fn nearest_keyed<T, K, F>(
    view: &RingView<'_, T>,
    mid: u64,
    lo: u64,
    hi: u64,
    key: &F,
) -> Option<(u64, K)>
where
    F: Fn(&T) -> Option<K>,
{
    let keyed = |pos: u64| view.get(pos).and_then(key).map(|k| (pos, k));

    let mut distance = 0u64;
    loop {
        let below = mid.checked_sub(distance).filter(|pos| *pos >= lo);
        let above = mid.checked_add(distance).filter(|pos| *pos < hi);

        if below.is_none() && above.is_none() {
            return None;
        }

        if let Some(found) = below.and_then(keyed) {
            return Some(found);
        }
        if distance > 0
            && let Some(found) = above.and_then(keyed)
        {
            return Some(found);
        }

        distance += 1;
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
