//! HTTP API integration tests
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`, backed by
//! a temporary library folder.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use spotread_common::model::{Book, BookDocument, Chapter};
use spotread_common::params::PlaybackParams;
use spotread_rd::api::{create_router, AppContext};
use spotread_rd::spotlight::SpotlightEngine;
use spotread_rd::SharedState;
use tower::util::ServiceExt;

fn write_book(library: &std::path::Path) -> String {
    let book = Book::assemble(
        "Riverbank Tales".to_string(),
        "K. Grahame".to_string(),
        None,
        vec![
            Chapter::from_texts(
                "The River Bank".to_string(),
                vec!["The Mole had been working very hard.".to_string()],
            ),
            Chapter::from_texts(
                "The Open Road".to_string(),
                vec!["The Rat stood in the doorway.".to_string()],
            ),
        ],
    );
    let id = book.id.clone();
    let dir = library.join(&id);
    std::fs::create_dir_all(&dir).unwrap();
    let doc = BookDocument {
        book,
        imported_at: spotread_common::time::now(),
        source: "test.epub".to_string(),
    };
    std::fs::write(dir.join("book.json"), serde_json::to_vec(&doc).unwrap()).unwrap();
    id
}

fn test_context(library: &std::path::Path) -> AppContext {
    let state = Arc::new(SharedState::new());
    let params = Arc::new(PlaybackParams::new());
    let engine = Arc::new(SpotlightEngine::start(Arc::clone(&state), Arc::clone(&params)));
    AppContext {
        state,
        engine,
        params,
        library_root: library.to_path_buf(),
    }
}

async fn get_json(ctx: &AppContext, uri: &str) -> (StatusCode, Value) {
    let response = create_router(ctx.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post(ctx: &AppContext, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = create_router(ctx.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_module() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(dir.path());

    let (status, json) = get_json(&ctx, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["module"], "reader_daemon");
}

#[tokio::test]
async fn list_books_shows_library() {
    let dir = tempfile::tempdir().unwrap();
    let id = write_book(dir.path());
    let ctx = test_context(dir.path());

    let (status, json) = get_json(&ctx, "/books").await;
    assert_eq!(status, StatusCode::OK);
    let books = json["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], id.as_str());
    assert_eq!(books[0]["title"], "Riverbank Tales");
    assert_eq!(books[0]["chapter_count"], 2);
}

#[tokio::test]
async fn open_play_and_position_flow() {
    let dir = tempfile::tempdir().unwrap();
    let id = write_book(dir.path());
    let ctx = test_context(dir.path());

    let (status, json) = post(&ctx, &format!("/books/{}/open", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["book_id"], id.as_str());

    let (status, json) = get_json(&ctx, "/playback/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "paused");

    let (status, _) = post(&ctx, "/playback/play", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = post(&ctx, "/playback/pause", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = get_json(&ctx, "/playback/position").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "paused");
    assert_eq!(json["book_id"], id.as_str());
}

#[tokio::test]
async fn open_missing_book_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(dir.path());

    let (status, json) = post(&ctx, "/books/b-0000000000000000/open", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["status"].as_str().unwrap().starts_with("error:"));
}

#[tokio::test]
async fn play_without_book_is_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(dir.path());

    let (status, _) = post(&ctx, "/playback/play", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn seek_validates_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let id = write_book(dir.path());
    let ctx = test_context(dir.path());
    post(&ctx, &format!("/books/{}/open", id), None).await;

    let (status, _) = post(
        &ctx,
        "/playback/seek",
        Some(serde_json::json!({"chapter_index": 1, "paragraph_index": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = get_json(&ctx, "/playback/position").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chapter_index"], 1);

    let (status, _) = post(
        &ctx,
        "/playback/seek",
        Some(serde_json::json!({"chapter_index": 9, "paragraph_index": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tempo_roundtrip_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(dir.path());

    let (status, json) = post(
        &ctx,
        "/playback/tempo",
        Some(serde_json::json!({"wpm": 5000, "speed_factor": 0.1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["wpm"], 300);
    assert_eq!(json["speed_factor"], 0.5);

    let (status, json) = get_json(&ctx, "/playback/tempo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["wpm"], 300);
}
