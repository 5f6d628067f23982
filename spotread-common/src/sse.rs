//! Server-Sent Events (SSE) utilities
//!
//! Bridges the [`EventBus`](crate::events::EventBus) to an axum SSE
//! response. Each domain event becomes one SSE message whose event name is
//! the enum variant name and whose data is the JSON payload.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

/// Keep-alive interval for all SpotRead SSE streams
const KEEP_ALIVE_SECS: u64 = 15;

/// Create an SSE response streaming every event published on the bus
///
/// Lagged subscribers (slower than the bus buffer) drop the missed events
/// and continue from the live edge; SSE clients are expected to resync via
/// the position endpoint after a gap.
pub fn event_stream(
    bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "New SSE client connected to {} events ({} total)",
        service_name,
        bus.subscriber_count() + 1
    );

    let rx = bus.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event(event.name())
                .json_data(&event)
                .map_err(|e| warn!("SSE serialization failed: {}", e))
                .ok()
                .map(Ok),
            Err(e) => {
                // BroadcastStream wraps RecvError (lag); log and continue
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}
