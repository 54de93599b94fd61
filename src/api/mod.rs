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
        .route("/autoplay/start", post(autoplay_start_handler))
        .route("/autoplay/stop", post(autoplay_stop_handler))
        .route("/autoplay/toggle", post(autoplay_toggle_handler))
        .route("/autoplay/pause", post(autoplay_pause_handler))
        .route("/autoplay/resume", post(autoplay_resume_handler))
        .route("/autoplay/reset", post(autoplay_reset_handler))
        .route("/autoplay/enable", post(autoplay_enable_handler))
        .route("/autoplay/disable", post(autoplay_disable_handler))
        .route("/carousel/next", post(carousel_next_handler))
        .route("/carousel/prev", post(carousel_prev_handler))
        .route("/toasts", get(toasts_handler).post(add_toast_handler))
        .route("/toasts/hide", post(hide_toast_handler))
        .route("/toasts/remove", post(remove_toast_handler))
        .route("/toasts/clear", post(clear_toasts_handler))
        .route("/toasts/pause", post(pause_toast_handler))
        .route("/toasts/resume", post(resume_toast_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
