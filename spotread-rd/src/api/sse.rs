//! SSE endpoint
//!
//! GET /events streams every engine event to the client.

use crate::api::server::AppContext;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of playback events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    spotread_common::sse::event_stream(&ctx.state.events, "spotread-rd")
}
