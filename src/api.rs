// src/api.rs
//
// Thin HTTP glue over the ingestion pipeline. Success wraps the resource
// list in {"status": "success", "data": [...]}; an empty batch (feed
// unreadable or nothing resolvable) is reported as a 500 error envelope.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::extract::Resource;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/resources", get(resources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ResourcesResponse {
    status: &'static str,
    data: Vec<Resource>,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: &'static str,
}

async fn resources(State(state): State<AppState>) -> Response {
    let data = state.pipeline.ingest().await;
    if data.is_empty() {
        let body = ErrorResponse {
            status: "error",
            message: "no resources found",
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    Json(ResourcesResponse {
        status: "success",
        data,
    })
    .into_response()
}
