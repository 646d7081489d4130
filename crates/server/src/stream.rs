//! Live tail over Server-Sent Events
//!
//! `GET /stream` subscribes to the envelope buffer and forwards every unit
//! as one event:
//!
//! ```text
//! event: application/x-sentry-envelope
//! id: 0192a7c4-...
//! data: {"header":{...},"items":[[{...},{...}]]}
//! ```
//!
//! A `Last-Event-ID` header resumes right after that envelope. The
//! subscription is dropped as soon as the client goes away.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use spotlight_buffer::{EnvelopeBuffer, SubscriptionId};
use spotlight_envelope::{EnvelopeUnit, Uuid};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Units queued for one client before new ones are dropped
const CLIENT_QUEUE_SIZE: usize = 1024;

/// Header carrying the id of the last event the client saw
const LAST_EVENT_ID: &str = "last-event-id";

/// Unsubscribes when the event stream is dropped
struct Subscription {
    buffer: Arc<EnvelopeBuffer>,
    id: SubscriptionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.buffer.unsubscribe(self.id);
        debug!(subscription = self.id, "event stream closed");
    }
}

/// GET /stream - Live tail
pub async fn event_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let last_id = headers
        .get(LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok());

    let (tx, rx) = mpsc::channel::<Arc<EnvelopeUnit>>(CLIENT_QUEUE_SIZE);
    let id = state.buffer.subscribe(
        move |unit| match tx.try_send(unit) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(unit)) => {
                warn!(id = %unit.id(), "event stream client too slow, dropping envelope");
            }
        },
        last_id,
    );
    debug!(subscription = id, ?last_id, "event stream opened");

    let subscription = Subscription {
        buffer: Arc::clone(&state.buffer),
        id,
    };

    let events = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let unit = rx.recv().await?;
        Some((Ok(to_event(&unit)), (rx, subscription)))
    })
    .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Render a unit as an SSE event
fn to_event(unit: &EnvelopeUnit) -> Event {
    let rendered = unit.stream_event();
    Event::default()
        .event(rendered.name)
        .id(rendered.id)
        .data(rendered.data)
}
