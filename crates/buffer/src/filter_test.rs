//! Tests for read filters

use super::*;

#[test]
fn test_all_matches_everything() {
    let filter = ReadFilter::all();
    assert!(filter.matches(Uuid::now_v7(), Utc::now(), None, None));
}

#[test]
fn test_builder() {
    let id = Uuid::now_v7();
    let filter = ReadFilter::all()
        .with_time_window(Duration::from_secs(30))
        .with_envelope_id(id)
        .with_filename("app.js")
        .with_limit(5)
        .with_offset(2);

    assert_eq!(filter.time_window, Some(Duration::from_secs(30)));
    assert_eq!(filter.envelope_id, Some(id));
    assert_eq!(filter.filename.as_deref(), Some("app.js"));
    assert_eq!(filter.limit, Some(5));
    assert_eq!(filter.offset, 2);
}

#[test]
fn test_time_window() {
    let now = Utc::now();
    let filter = ReadFilter::all().with_time_window(Duration::from_secs(60));
    let cutoff = filter.cutoff(now);

    let fresh = now - TimeDelta::seconds(10);
    let stale = now - TimeDelta::seconds(120);
    assert!(filter.matches(Uuid::now_v7(), fresh, cutoff, None));
    assert!(!filter.matches(Uuid::now_v7(), stale, cutoff, None));
}

#[test]
fn test_no_window_no_cutoff() {
    assert!(ReadFilter::all().cutoff(Utc::now()).is_none());
}

#[test]
fn test_envelope_id() {
    let id = Uuid::now_v7();
    let other = Uuid::now_v7();
    let filter = ReadFilter::all().with_envelope_id(id);

    assert!(filter.matches(id, Utc::now(), None, None));
    assert!(!filter.matches(other, Utc::now(), None, None));
}

#[test]
fn test_file_ids() {
    let id = Uuid::now_v7();
    let other = Uuid::now_v7();
    let ids: HashSet<Uuid> = [id].into_iter().collect();
    let filter = ReadFilter::all().with_filename("app.js");

    assert!(filter.matches(id, Utc::now(), None, Some(&ids)));
    assert!(!filter.matches(other, Utc::now(), None, Some(&ids)));
    assert!(!filter.matches(id, Utc::now(), None, Some(&HashSet::new())));
}

#[test]
fn test_paginate() {
    let items: Vec<u32> = (0..10).collect();

    assert_eq!(ReadFilter::all().paginate(items.clone()), items);
    assert_eq!(
        ReadFilter::all().with_limit(3).paginate(items.clone()),
        vec![0, 1, 2]
    );
    assert_eq!(
        ReadFilter::all()
            .with_offset(8)
            .with_limit(5)
            .paginate(items.clone()),
        vec![8, 9]
    );
    assert!(ReadFilter::all().with_offset(20).paginate(items).is_empty());
}
