//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `POST /stream`, `POST /api/{project_id}/envelope/` - Ingest a body
//! - `GET /envelope/{id}` - Raw bytes of one buffered body
//! - `GET /envelopes` - Filtered listing of buffered envelopes
//! - `DELETE /clear` - Drop everything buffered
//! - `GET /health` - Liveness probe
//!
//! The live tail (`GET /stream`) lives in [`crate::stream`].

use std::borrow::Cow;
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE, ORIGIN, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spotlight_buffer::ReadFilter;
use spotlight_envelope::{Envelope, EnvelopeUnit, Uuid, decompress, resolve_content_type};
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Query parameters accepted on ingestion
#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    /// SDK identity, used when the request carries no `User-Agent`
    pub sentry_client: Option<String>,
}

/// POST /stream - Store a telemetry body
///
/// Always answers 200 with an empty body; a body that cannot be decoded is
/// stored as raw bytes so SDK delivery never breaks.
pub async fn ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let encoding = header_str(&headers, CONTENT_ENCODING);
    let raw = match decompress(&body, encoding) {
        Ok(Cow::Owned(decoded)) => Bytes::from(decoded),
        Ok(Cow::Borrowed(_)) => body.clone(),
        Err(e) => {
            warn!(error = %e, "failed to decompress body, storing it as received");
            body.clone()
        }
    };

    let user_agent = header_str(&headers, USER_AGENT)
        .map(str::to_owned)
        .or(params.sentry_client);
    let content_type = resolve_content_type(
        header_str(&headers, CONTENT_TYPE),
        user_agent.as_deref(),
        headers.contains_key(ORIGIN),
    );

    let unit = state
        .buffer
        .put(EnvelopeUnit::new(raw, content_type, user_agent));

    debug!(
        id = %unit.id(),
        content_type = unit.content_type(),
        bytes = unit.raw().len(),
        "ingested"
    );

    StatusCode::OK
}

/// POST /api/{project_id}/envelope/ - Same as `/stream`, for SDKs using a DSN
pub async fn ingest_for_project(
    state: State<AppState>,
    Path(_project_id): Path<String>,
    params: Query<IngestParams>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    ingest(state, params, headers, body).await
}

/// GET /envelope/{id} - Raw bytes of one buffered body
pub async fn envelope_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let uuid = Uuid::parse_str(id.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid envelope id '{id}': {e}")))?;

    let unit = state
        .buffer
        .get(uuid)
        .ok_or_else(|| ApiError::not_found("envelope", &id))?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, unit.content_type().to_string())],
        unit.raw().clone(),
    )
        .into_response())
}

/// Query parameters for `GET /envelopes`
#[derive(Debug, Default, Deserialize)]
pub struct EnvelopesQuery {
    /// Only envelopes received in the last N seconds
    pub time_window: Option<u64>,
    /// Only envelopes whose stack frames reference a file ending with this
    pub filename: Option<String>,
    /// Only the envelope with this identity
    pub envelope_id: Option<String>,
    /// Explicit "no predicates"; overrides the others
    #[serde(default)]
    pub all: bool,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl EnvelopesQuery {
    fn to_filter(&self) -> Result<ReadFilter> {
        let mut filter = ReadFilter::all().with_offset(self.offset);
        if let Some(limit) = self.limit {
            filter = filter.with_limit(limit);
        }

        if self.all {
            return Ok(filter);
        }

        if let Some(secs) = self.time_window {
            filter = filter.with_time_window(Duration::from_secs(secs));
        }
        if let Some(filename) = self.filename.as_deref().filter(|f| !f.is_empty()) {
            filter = filter.with_filename(filename);
        }
        if let Some(id) = &self.envelope_id {
            let id = Uuid::parse_str(id.trim())
                .map_err(|e| ApiError::BadRequest(format!("invalid envelope_id '{id}': {e}")))?;
            filter = filter.with_envelope_id(id);
        }

        Ok(filter)
    }
}

/// One entry of the `GET /envelopes` listing
#[derive(Debug, Serialize)]
pub struct EnvelopeSummary<'a> {
    pub id: Uuid,
    pub content_type: &'a str,
    pub received_at: DateTime<Utc>,
    /// Decoded envelope; null for raw or malformed bodies
    pub envelope: Option<&'a Envelope>,
}

impl<'a> From<&'a EnvelopeUnit> for EnvelopeSummary<'a> {
    fn from(unit: &'a EnvelopeUnit) -> Self {
        Self {
            id: unit.id(),
            content_type: unit.content_type(),
            received_at: unit.received_at(),
            envelope: unit.envelope(),
        }
    }
}

/// GET /envelopes - Buffered envelopes, newest first
pub async fn list_envelopes(
    State(state): State<AppState>,
    Query(query): Query<EnvelopesQuery>,
) -> Result<Response> {
    let filter = query.to_filter()?;
    let units = state.buffer.read(&filter);

    let summaries: Vec<EnvelopeSummary<'_>> =
        units.iter().map(|unit| EnvelopeSummary::from(unit.as_ref())).collect();

    Ok(Json(summaries).into_response())
}

/// DELETE /clear - Drop every buffered envelope
pub async fn clear(State(state): State<AppState>) -> StatusCode {
    state.buffer.clear();
    info!("buffer cleared");
    StatusCode::OK
}

/// GET /health - Liveness probe
pub async fn health_check() -> &'static str {
    "OK"
}

fn header_str(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
