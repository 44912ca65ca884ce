//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/session",
            get(session_handler).post(start_handler).delete(cancel_handler),
        )
        .route("/session/pause", post(pause_handler))
        .route("/session/resume", post(resume_handler))
        .route("/session/scrub", post(scrub_handler))
        .route("/mindful-minutes", get(mindful_minutes_handler))
        .route("/presets", get(presets_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
