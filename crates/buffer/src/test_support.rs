//! Envelope fixtures shared by the buffer tests

use spotlight_envelope::{ENVELOPE_CONTENT_TYPE, EnvelopeUnit};

/// Envelope body with one error event whose frames reference `files`
pub fn error_envelope(files: &[&str]) -> Vec<u8> {
    let frames: Vec<String> = files
        .iter()
        .map(|f| format!(r#"{{"filename":"{f}","lineno":1}}"#))
        .collect();
    let payload = format!(
        r#"{{"exception":{{"values":[{{"type":"Error","stacktrace":{{"frames":[{}]}}}}]}}}}"#,
        frames.join(",")
    );
    format!(
        "{{}}\n{{\"type\":\"event\",\"length\":{}}}\n{}\n",
        payload.len(),
        payload
    )
    .into_bytes()
}

/// Unit holding an error event referencing `files`
pub fn error_unit(files: &[&str]) -> EnvelopeUnit {
    EnvelopeUnit::new(error_envelope(files), ENVELOPE_CONTENT_TYPE, None)
}

/// Unit holding a single log item
pub fn log_unit() -> EnvelopeUnit {
    EnvelopeUnit::new(
        "{}\n{\"type\":\"log\"}\n{\"items\":[]}\n",
        ENVELOPE_CONTENT_TYPE,
        None,
    )
}
