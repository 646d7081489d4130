//! Content type handling for ingested bodies

/// Content type of a telemetry envelope
pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";

/// Content type assumed when the request declares none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Browser-side JavaScript SDKs
///
/// These send envelopes as `text/plain` so the browser skips the CORS
/// preflight.
const BROWSER_SDKS: &[&str] = &[
    "sentry.javascript.browser",
    "sentry.javascript.react",
    "sentry.javascript.vue",
    "sentry.javascript.angular",
    "sentry.javascript.svelte",
    "sentry.javascript.ember",
    "sentry.javascript.solid",
    "sentry.javascript.astro",
    "sentry.javascript.nextjs",
    "sentry.javascript.remix",
    "sentry.javascript.sveltekit",
    "sentry.javascript.gatsby",
];

/// Media type without parameters, lowercased
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check if a content type denotes a telemetry envelope
pub fn is_envelope_content_type(content_type: &str) -> bool {
    media_type(content_type) == ENVELOPE_CONTENT_TYPE
}

/// Check if a user agent (or `sentry_client` value) is a browser SDK
///
/// Matches `<sdk name>` optionally followed by `/<version>`.
pub fn is_browser_sdk(user_agent: &str) -> bool {
    BROWSER_SDKS.iter().any(|sdk| {
        user_agent
            .strip_prefix(sdk)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Decide the effective content type of an ingested body
///
/// A browser SDK talking cross-origin labels envelopes `text/plain`; those
/// are reinterpreted as envelopes. Everything else keeps its declared type.
pub fn resolve_content_type(
    declared: Option<&str>,
    user_agent: Option<&str>,
    has_origin: bool,
) -> String {
    let declared = declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    if has_origin && media_type(declared) == "text/plain" && user_agent.is_some_and(is_browser_sdk)
    {
        return ENVELOPE_CONTENT_TYPE.to_string();
    }

    declared.to_string()
}
