//! HTTP endpoint handlers

use std::{sync::Arc, time::Duration};
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{info, warn};

use crate::state::{AppState, Direction, ToastStatus};
use super::responses::{
    AddToastRequest, CommandResponse, HealthResponse, StatusResponse, ToastResponse,
};

/// Record the action and report carousel and autoplay state after it
fn command_response(state: &AppState, action: &str) -> Json<CommandResponse> {
    state.record_action(action);
    Json(CommandResponse::new(
        action,
        state.carousel(),
        state.autoplay.status(),
    ))
}

/// Record the action and report toast queue state after it
fn toast_response(state: &AppState, action: &str, id: Option<u64>) -> Json<ToastResponse> {
    state.record_action(action);
    Json(ToastResponse::new(action, id, ToastStatus::capture(&state.toasts)))
}

/// Handle POST /autoplay/start - Clear the stopped flag and start playing
pub async fn autoplay_start_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.start();
    info!("Autoplay start requested");
    command_response(&state, "autoplay-start")
}

/// Handle POST /autoplay/stop - Stop playing until started again
pub async fn autoplay_stop_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.stop();
    info!("Autoplay stop requested");
    command_response(&state, "autoplay-stop")
}

/// Handle POST /autoplay/toggle - Start if stopped, stop otherwise
pub async fn autoplay_toggle_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.toggle();
    command_response(&state, "autoplay-toggle")
}

/// Handle POST /autoplay/pause - Suspend playback for an interaction
pub async fn autoplay_pause_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.pause();
    command_response(&state, "autoplay-pause")
}

/// Handle POST /autoplay/resume - End an interaction pause
pub async fn autoplay_resume_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.resume();
    command_response(&state, "autoplay-resume")
}

/// Handle POST /autoplay/reset - Restart the countdown from the full interval
pub async fn autoplay_reset_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.reset();
    command_response(&state, "autoplay-reset")
}

/// Handle POST /autoplay/enable - Open the external autoplay gate
pub async fn autoplay_enable_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.set_enabled(true);
    info!("Autoplay gate opened");
    command_response(&state, "autoplay-enable")
}

/// Handle POST /autoplay/disable - Close the external autoplay gate
pub async fn autoplay_disable_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.autoplay.set_enabled(false);
    info!("Autoplay gate closed");
    command_response(&state, "autoplay-disable")
}

/// Handle POST /carousel/next - Show the next slide
pub async fn carousel_next_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.navigate(Direction::Next);
    command_response(&state, "carousel-next")
}

/// Handle POST /carousel/prev - Show the previous slide
pub async fn carousel_prev_handler(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    state.navigate(Direction::Prev);
    command_response(&state, "carousel-prev")
}

/// Handle GET /toasts - Return the toast queue
pub async fn toasts_handler(State(state): State<Arc<AppState>>) -> Json<ToastStatus> {
    Json(ToastStatus::capture(&state.toasts))
}

/// Handle POST /toasts - Admit a new toast
pub async fn add_toast_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddToastRequest>,
) -> Result<Json<ToastResponse>, StatusCode> {
    if request.content.trim().is_empty() {
        warn!("Rejected toast with empty content");
        return Err(StatusCode::BAD_REQUEST);
    }

    let duration = request
        .duration_ms
        .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
        .unwrap_or(state.default_toast_duration);

    let id = state.toasts.add_toast(request.content, duration);
    info!("Toast {} admitted for {:?}", id.value(), duration);
    Ok(toast_response(&state, "toast-add", Some(id.value())))
}

/// Handle POST /toasts/hide - Fade out the active toast and wait for it
pub async fn hide_toast_handler(State(state): State<Arc<AppState>>) -> Json<ToastResponse> {
    state.toasts.hide_toast().await;
    toast_response(&state, "toast-hide", None)
}

/// Handle POST /toasts/remove - Drop the active toast at once
pub async fn remove_toast_handler(State(state): State<Arc<AppState>>) -> Json<ToastResponse> {
    state.toasts.remove_toast();
    toast_response(&state, "toast-remove", None)
}

/// Handle POST /toasts/clear - Drop the active toast and the whole queue
pub async fn clear_toasts_handler(State(state): State<Arc<AppState>>) -> Json<ToastResponse> {
    state.toasts.clear_toast_queue();
    info!("Toast queue cleared");
    toast_response(&state, "toast-clear", None)
}

/// Handle POST /toasts/pause - Hold the active toast's dismiss countdown
pub async fn pause_toast_handler(State(state): State<Arc<AppState>>) -> Json<ToastResponse> {
    state.toasts.pause_timer();
    toast_response(&state, "toast-pause", None)
}

/// Handle POST /toasts/resume - Continue the active toast's dismiss countdown
pub async fn resume_toast_handler(State(state): State<Arc<AppState>>) -> Json<ToastResponse> {
    state.toasts.resume_timer();
    toast_response(&state, "toast-resume", None)
}

/// Handle GET /status - Return current carousel, autoplay and toast status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        carousel: state.carousel(),
        autoplay: state.autoplay.status(),
        toasts: ToastStatus::capture(&state.toasts),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
