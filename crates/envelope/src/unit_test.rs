//! Tests for stored envelope units

use serde_json::Value;

use super::*;
use crate::content_type::ENVELOPE_CONTENT_TYPE;

fn event_with_frames(files: &[&str]) -> Vec<u8> {
    let frames: Vec<String> = files
        .iter()
        .map(|f| format!(r#"{{"filename":"{f}","lineno":1}}"#))
        .collect();
    let payload = format!(
        r#"{{"exception":{{"values":[{{"type":"Error","stacktrace":{{"frames":[{}]}}}}]}}}}"#,
        frames.join(",")
    );
    format!(
        "{{\"sdk\":{{\"name\":\"sentry.javascript.node\",\"version\":\"8.0.0\"}}}}\n{{\"type\":\"event\",\"length\":{}}}\n{}\n",
        payload.len(),
        payload
    )
    .into_bytes()
}

#[test]
fn test_decode_attaches_identity_to_header() {
    let unit = EnvelopeUnit::new(event_with_frames(&["a.js"]), ENVELOPE_CONTENT_TYPE, None);

    let envelope = unit.envelope().unwrap();
    assert_eq!(envelope.header.envelope_id, Some(unit.id()));
}

#[test]
fn test_sender_supplied_identity_is_replaced() {
    let forged = Uuid::nil();
    let body = format!(
        "{{\"__spotlight_envelope_id\":\"{forged}\"}}\n{{\"type\":\"log\"}}\n{{}}\n"
    );
    let unit = EnvelopeUnit::new(body, ENVELOPE_CONTENT_TYPE, None);

    assert_eq!(unit.envelope().unwrap().header.envelope_id, Some(unit.id()));
    assert_ne!(unit.id(), forged);
}

#[test]
fn test_decode_is_memoized() {
    let unit = EnvelopeUnit::new(event_with_frames(&["a.js"]), ENVELOPE_CONTENT_TYPE, None);

    let first = unit.envelope().unwrap() as *const Envelope;
    let second = unit.envelope().unwrap() as *const Envelope;
    assert_eq!(first, second);
}

#[test]
fn test_assigned_identity_replaces_cached_header_id() {
    let mut unit = EnvelopeUnit::new(event_with_frames(&["a.js"]), ENVELOPE_CONTENT_TYPE, None);
    assert!(unit.envelope().is_some());

    let assigned = next_envelope_id();
    unit.assign_id(assigned);

    assert_eq!(unit.id(), assigned);
    assert_eq!(unit.envelope().unwrap().header.envelope_id, Some(assigned));
    assert_eq!(unit.stream_event().id, assigned.to_string());
}

#[test]
fn test_units_get_increasing_ids() {
    let a = EnvelopeUnit::new("{}", ENVELOPE_CONTENT_TYPE, None);
    let b = EnvelopeUnit::new("{}", ENVELOPE_CONTENT_TYPE, None);
    assert!(b.id() > a.id());
}

#[test]
fn test_non_envelope_content_is_raw() {
    let unit = EnvelopeUnit::new("{}\n", "application/json", None);

    assert!(!unit.is_envelope());
    assert!(unit.envelope().is_none());
    assert!(matches!(unit.decoded(), Decoded::Raw(b"{}\n")));
}

#[test]
fn test_malformed_envelope_is_raw() {
    let unit = EnvelopeUnit::new("garbage", ENVELOPE_CONTENT_TYPE, None);

    assert!(unit.is_envelope());
    assert!(unit.envelope().is_none());
    assert!(matches!(unit.decoded(), Decoded::Raw(b"garbage")));
}

#[test]
fn test_filenames_are_distinct() {
    let unit = EnvelopeUnit::new(
        event_with_frames(&["src/a.js", "src/b.js", "src/a.js"]),
        ENVELOPE_CONTENT_TYPE,
        None,
    );

    let files: Vec<_> = unit.filenames().into_iter().collect();
    assert_eq!(files, vec!["src/a.js", "src/b.js"]);
}

#[test]
fn test_filenames_empty_for_raw_unit() {
    let unit = EnvelopeUnit::new("garbage", ENVELOPE_CONTENT_TYPE, None);
    assert!(unit.filenames().is_empty());
}

#[test]
fn test_stream_event_for_envelope() {
    let unit = EnvelopeUnit::new(
        event_with_frames(&["a.js"]),
        ENVELOPE_CONTENT_TYPE,
        Some("sentry.javascript.node/8.0.0".into()),
    );

    let event = unit.stream_event();
    assert_eq!(event.name, ENVELOPE_CONTENT_TYPE);
    assert_eq!(event.id, unit.id().to_string());

    let data: Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(data["header"]["sdk"]["name"], "sentry.javascript.node");
    assert_eq!(data["header"]["__spotlight_envelope_id"], unit.id().to_string());
    assert_eq!(data["items"][0][0]["type"], "event");
    assert_eq!(
        data["items"][0][1]["exception"]["values"][0]["stacktrace"]["frames"][0]["filename"],
        "a.js"
    );
}

#[test]
fn test_stream_event_for_raw_body_is_base64() {
    let unit = EnvelopeUnit::new(&b"\x00\x01binary"[..], "application/octet-stream", None);

    let event = unit.stream_event();
    assert_eq!(event.name, "application/octet-stream;base64");
    assert_eq!(BASE64.decode(event.data).unwrap(), b"\x00\x01binary");
}
