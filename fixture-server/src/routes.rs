//! HTTP routes served to the browser tests

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::{FixtureError, FixtureResult};
use shared::{process_debug, ProcessId};

/// Body of `GET /text`
pub const TEXT_BODY: &str = "Lorem ipsum dolor sit amet.";

/// File served by `GET /image`, relative to the resources directory
pub const IMAGE_FILE: &str = "image.png";

/// Body of `GET /json`
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFixture {
    pub foo: &'static str,
    pub test: bool,
}

impl Default for JsonFixture {
    fn default() -> Self {
        Self { foo: "bar", test: true }
    }
}

/// Shared state for the route handlers
#[derive(Debug, Clone)]
pub struct FixtureState {
    pub resources_dir: PathBuf,
}

impl FixtureState {
    pub fn new(resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            resources_dir: resources_dir.into(),
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.resources_dir.join(IMAGE_FILE)
    }
}

/// Build the fixture router; unknown paths fall through to axum's 404
pub fn router(state: FixtureState) -> Router {
    Router::new()
        .route("/json", get(json_handler))
        .route("/text", get(text_handler))
        .route("/image", get(image_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn json_handler() -> Json<JsonFixture> {
    Json(JsonFixture::default())
}

async fn text_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], TEXT_BODY)
}

async fn image_handler(State(state): State<Arc<FixtureState>>) -> FixtureResult<impl IntoResponse> {
    let path = state.image_path();
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| FixtureError::ResourceRead { path, source })?;

    process_debug!(ProcessId::current(), "📄 Served {} ({} bytes)", IMAGE_FILE, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
        ],
        bytes,
    ))
}
