//! Tests for the envelope buffer

use std::time::Duration;

use super::*;
use crate::test_support::{error_unit, log_unit};

/// Callback that records delivered identities
fn recorder() -> (
    Arc<Mutex<Vec<Uuid>>>,
    impl Fn(Arc<EnvelopeUnit>) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |unit: Arc<EnvelopeUnit>| sink.lock().push(unit.id()))
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn put_logs(buffer: &EnvelopeBuffer, count: usize) -> Vec<Uuid> {
    (0..count).map(|_| buffer.put(log_unit()).id()).collect()
}

fn ids(units: &[Arc<EnvelopeUnit>]) -> Vec<Uuid> {
    units.iter().map(|unit| unit.id()).collect()
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_read_all_newest_first() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let mut put = put_logs(&buffer, 3);
    put.reverse();

    assert_eq!(ids(&buffer.read(&ReadFilter::all())), put);
}

#[test]
fn test_capacity_law() {
    let buffer = EnvelopeBuffer::with_capacity(3);
    let put = put_logs(&buffer, 5);

    let read = ids(&buffer.read(&ReadFilter::all()));
    assert_eq!(read, vec![put[4], put[3], put[2]]);
}

#[test]
fn test_read_by_envelope_id() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let put = put_logs(&buffer, 4);

    let read = buffer.read(&ReadFilter::all().with_envelope_id(put[1]));
    assert_eq!(ids(&read), vec![put[1]]);

    let missing = buffer.read(&ReadFilter::all().with_envelope_id(Uuid::now_v7()));
    assert!(missing.is_empty());
}

#[test]
fn test_read_paginates_after_filtering() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let put = put_logs(&buffer, 6);

    let page = buffer.read(&ReadFilter::all().with_offset(1).with_limit(2));
    assert_eq!(ids(&page), vec![put[4], put[3]]);
}

#[test]
fn test_read_time_window_keeps_recent() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    put_logs(&buffer, 3);

    let recent = buffer.read(&ReadFilter::all().with_time_window(Duration::from_secs(60)));
    assert_eq!(recent.len(), 3);
}

#[test]
fn test_get_by_id() {
    let buffer = EnvelopeBuffer::with_capacity(3);
    let put = put_logs(&buffer, 5);

    assert_eq!(buffer.get(put[4]).map(|unit| unit.id()), Some(put[4]));
    assert_eq!(buffer.get(put[2]).map(|unit| unit.id()), Some(put[2]));
    assert!(buffer.get(put[0]).is_none());
    assert!(buffer.get(Uuid::now_v7()).is_none());
}

// ============================================================================
// Filename index
// ============================================================================

#[test]
fn test_read_by_filename() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let a = buffer.put(error_unit(&["src/app.js"])).id();
    let b = buffer.put(error_unit(&["src/util.js", "src/app.js"])).id();
    buffer.put(error_unit(&["src/other.js"]));
    buffer.put(log_unit());

    let read = buffer.read(&ReadFilter::all().with_filename("src/app.js"));
    assert_eq!(ids(&read), vec![b, a]);

    let suffix = buffer.read(&ReadFilter::all().with_filename("util.js"));
    assert_eq!(ids(&suffix), vec![b]);

    assert!(buffer.read(&ReadFilter::all().with_filename("missing.js")).is_empty());
}

#[test]
fn test_filename_index_follows_eviction() {
    let buffer = EnvelopeBuffer::with_capacity(2);
    buffer.put(error_unit(&["a.js"]));
    buffer.put(error_unit(&["b.js"]));
    let third = buffer.put(error_unit(&["a.js"])).id();

    let read = buffer.read(&ReadFilter::all().with_filename("a.js"));
    assert_eq!(ids(&read), vec![third]);

    // Push the rest out
    buffer.put(log_unit());
    buffer.put(log_unit());

    assert!(buffer.read(&ReadFilter::all().with_filename("a.js")).is_empty());
    assert!(buffer.read(&ReadFilter::all().with_filename("b.js")).is_empty());
    assert_eq!(buffer.indexed_files(), 0);
}

#[test]
fn test_clear_and_reset_drop_index() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    buffer.put(error_unit(&["a.js"]));
    buffer.clear();
    assert_eq!(buffer.indexed_files(), 0);
    assert!(buffer.read(&ReadFilter::all()).is_empty());

    buffer.put(error_unit(&["a.js"]));
    buffer.reset();
    assert_eq!(buffer.indexed_files(), 0);
    assert!(buffer.read(&ReadFilter::all().with_filename("a.js")).is_empty());
}

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test]
async fn test_resume_by_id_law() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let put = put_logs(&buffer, 4);

    let (seen, callback) = recorder();
    buffer.subscribe(callback, Some(put[1]));
    settle().await;

    assert_eq!(*seen.lock(), vec![put[2], put[3]]);
}

#[tokio::test]
async fn test_resume_from_newest_waits_for_live() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let put = put_logs(&buffer, 3);

    let (seen, callback) = recorder();
    buffer.subscribe(callback, Some(put[2]));
    settle().await;
    assert!(seen.lock().is_empty());

    let live = buffer.put(log_unit()).id();
    settle().await;
    assert_eq!(*seen.lock(), vec![live]);
}

#[tokio::test]
async fn test_evicted_id_fallback_law() {
    let buffer = EnvelopeBuffer::with_capacity(2);
    let put = put_logs(&buffer, 4);

    let (with_id, callback) = recorder();
    buffer.subscribe(callback, Some(put[0]));
    let (without_id, callback) = recorder();
    buffer.subscribe(callback, None);
    settle().await;

    assert_eq!(*with_id.lock(), vec![put[2], put[3]]);
    assert_eq!(*with_id.lock(), *without_id.lock());
}

#[tokio::test]
async fn test_unknown_id_replays_everything() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let put = put_logs(&buffer, 3);

    let (seen, callback) = recorder();
    buffer.subscribe(callback, Some(Uuid::nil()));
    settle().await;

    assert_eq!(*seen.lock(), put);
}

#[tokio::test]
async fn test_clear_law() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let (seen, callback) = recorder();
    buffer.subscribe(callback, None);

    let before = put_logs(&buffer, 2);
    settle().await;
    buffer.clear();
    assert!(buffer.read(&ReadFilter::all()).is_empty());

    let after = buffer.put(log_unit()).id();
    settle().await;

    let mut expected = before;
    expected.push(after);
    assert_eq!(*seen.lock(), expected);
}

#[tokio::test]
async fn test_soft_reset_law() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let (seen, callback) = recorder();
    buffer.subscribe(callback, None);

    let before = put_logs(&buffer, 2);
    settle().await;
    buffer.reset();
    assert!(buffer.read(&ReadFilter::all()).is_empty());

    let after = put_logs(&buffer, 2);
    settle().await;

    let expected: Vec<Uuid> = before.into_iter().chain(after).collect();
    assert_eq!(*seen.lock(), expected);
}

#[tokio::test]
async fn test_unsubscribe() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let (seen, callback) = recorder();
    let id = buffer.subscribe(callback, None);
    assert_eq!(buffer.subscriber_count(), 1);

    assert!(buffer.unsubscribe(id));
    buffer.put(log_unit());
    settle().await;

    assert!(seen.lock().is_empty());
    assert_eq!(buffer.subscriber_count(), 0);
}

#[test]
fn test_stats() {
    let buffer = EnvelopeBuffer::with_capacity(2);
    put_logs(&buffer, 3);

    let stats = buffer.stats();
    assert_eq!(stats.capacity, 2);
    assert_eq!(stats.len, 2);
    assert_eq!(stats.total_put, 3);
    assert_eq!(buffer.len(), 2);
    assert!(!buffer.is_empty());
    assert_eq!(buffer.capacity(), 2);
}

// ============================================================================
// Identity order
// ============================================================================

#[tokio::test]
async fn test_units_stored_out_of_creation_order_stay_findable() {
    let buffer = EnvelopeBuffer::with_capacity(10);
    let older = log_unit();
    let newer = log_unit();
    assert!(older.id() < newer.id());

    let first = buffer.put(newer).id();
    let second = buffer.put(older).id();
    assert!(first < second);

    assert_eq!(buffer.get(first).map(|unit| unit.id()), Some(first));
    assert_eq!(buffer.get(second).map(|unit| unit.id()), Some(second));
    assert_eq!(ids(&buffer.read(&ReadFilter::all())), vec![second, first]);

    let (seen, callback) = recorder();
    buffer.subscribe(callback, Some(first));
    settle().await;
    assert_eq!(*seen.lock(), vec![second]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_keep_identity_order() {
    let buffer = Arc::new(EnvelopeBuffer::with_capacity(1_000));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut stored = Vec::new();
                for _ in 0..50 {
                    stored.push(buffer.put(log_unit()).id());
                    tokio::task::yield_now().await;
                }
                stored
            })
        })
        .collect();

    let mut stored = Vec::new();
    for task in tasks {
        stored.extend(task.await.unwrap());
    }
    assert_eq!(stored.len(), 400);

    let mut newest_first = ids(&buffer.read(&ReadFilter::all()));
    assert_eq!(newest_first.len(), 400);
    newest_first.reverse();
    assert!(newest_first.windows(2).all(|pair| pair[0] < pair[1]));

    for id in stored {
        assert_eq!(buffer.get(id).map(|unit| unit.id()), Some(id));
    }
}
