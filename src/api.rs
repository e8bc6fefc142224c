// src/api.rs
//
// Inbound HTTP surface: one pipeline route, a health probe, permissive
// CORS for the topic-collection UI. Fatal pipeline errors map to 500 with
// the caller-visible taxonomy message in a JSON `detail` field.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::pipeline::{Pipeline, SourceSelector};

pub const DOWNLOAD_FILENAME: &str = "news-summary.mp3";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/generate-news-audio", post(generate_news_audio))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub topics: Vec<String>,
    pub source_type: SourceSelector,
}

async fn generate_news_audio(
    State(state): State<AppState>,
    Json(req): Json<NewsRequest>,
) -> Response {
    match state.pipeline.run(&req.topics, req.source_type).await {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, artifact.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={DOWNLOAD_FILENAME}"),
                ),
            ],
            artifact.bytes,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
