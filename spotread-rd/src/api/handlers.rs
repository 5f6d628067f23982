//! HTTP request handlers
//!
//! Implements REST API endpoints for library access and playback control.

use crate::api::server::AppContext;
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use spotread_common::library;
use spotread_common::model::BookSummary;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    status: String,
    book_id: String,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStateResponse {
    state: String,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    state: String,
    book_id: Option<String>,
    chapter_index: usize,
    paragraph_index: usize,
    token_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    chapter_index: usize,
    paragraph_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct TempoRequest {
    wpm: Option<u32>,
    speed_factor: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TempoResponse {
    wpm: u32,
    speed_factor: f64,
}

/// Map an engine/library error to an HTTP response
fn error_response(e: Error) -> (StatusCode, Json<StatusResponse>) {
    let status = match &e {
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::Common(spotread_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Common(spotread_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("request failed: {}", e);
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

type HandlerResult<T> = std::result::Result<T, (StatusCode, Json<StatusResponse>)>;

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "reader_daemon".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Library Endpoints
// ============================================================================

/// GET /books - List books in the library
pub async fn list_books(State(ctx): State<AppContext>) -> HandlerResult<Json<BooksResponse>> {
    let books = library::scan_library(&ctx.library_root)
        .map_err(|e| error_response(Error::Common(e)))?;
    Ok(Json(BooksResponse { books }))
}

/// POST /books/:book_id/open - Open a book into the reader
pub async fn open_book(
    State(ctx): State<AppContext>,
    Path(book_id): Path<String>,
) -> HandlerResult<Json<OpenResponse>> {
    let document = library::load_book(&ctx.library_root, &book_id)
        .map_err(|e| error_response(Error::Common(e)))?;
    ctx.engine
        .open(document.book)
        .await
        .map_err(error_response)?;
    info!("Opened book {}", book_id);
    Ok(Json(OpenResponse {
        status: "ok".to_string(),
        book_id,
    }))
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// POST /playback/play - Start or resume playback
pub async fn play(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine.play().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/pause - Pause playback
pub async fn pause(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine.pause().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/next - Step to the next paragraph
pub async fn next_paragraph(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine.next_paragraph().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/previous - Step to the previous paragraph
pub async fn previous_paragraph(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine
        .previous_paragraph()
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/chapter/next - Jump to the next chapter
pub async fn next_chapter(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine.next_chapter().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/chapter/previous - Jump to the previous chapter
pub async fn previous_chapter(State(ctx): State<AppContext>) -> HandlerResult<StatusCode> {
    ctx.engine.previous_chapter().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playback/seek - Seek to a (chapter, paragraph) position
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> HandlerResult<StatusCode> {
    ctx.engine
        .seek(req.chapter_index, req.paragraph_index)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /playback/state - Current playback state
pub async fn get_playback_state(
    State(ctx): State<AppContext>,
) -> Json<PlaybackStateResponse> {
    Json(PlaybackStateResponse {
        state: ctx.state.get_playback_state().await.to_string(),
    })
}

/// GET /playback/position - Current reading position
pub async fn get_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    let state = ctx.state.get_playback_state().await;
    let position = ctx.state.get_position().await;
    let book = ctx.state.get_current_book().await;
    Json(PositionResponse {
        state: state.to_string(),
        book_id: book.map(|b| b.book_id),
        chapter_index: position.chapter_index,
        paragraph_index: position.paragraph_index,
        token_index: position.token_index,
    })
}

/// GET /playback/tempo - Current tempo parameters
pub async fn get_tempo(State(ctx): State<AppContext>) -> Json<TempoResponse> {
    let (wpm, speed_factor) = ctx.params.snapshot();
    Json(TempoResponse { wpm, speed_factor })
}

/// POST /playback/tempo - Update tempo parameters
pub async fn set_tempo(
    State(ctx): State<AppContext>,
    Json(req): Json<TempoRequest>,
) -> HandlerResult<Json<TempoResponse>> {
    let (wpm, speed_factor) = ctx
        .engine
        .set_tempo(req.wpm, req.speed_factor)
        .await
        .map_err(error_response)?;
    Ok(Json(TempoResponse { wpm, speed_factor }))
}
