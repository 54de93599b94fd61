//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    scheduling::AutoplayStatus,
    state::{CarouselState, ToastStatus},
};

/// Response for autoplay and carousel commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub carousel: CarouselState,
    pub autoplay: AutoplayStatus,
}

impl CommandResponse {
    pub fn new(action: &str, carousel: CarouselState, autoplay: AutoplayStatus) -> Self {
        Self {
            action: action.to_string(),
            timestamp: Utc::now(),
            carousel,
            autoplay,
        }
    }
}

/// Response for toast queue commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastResponse {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    /// Identifier of the toast added by this request, if any
    pub id: Option<u64>,
    pub toasts: ToastStatus,
}

impl ToastResponse {
    pub fn new(action: &str, id: Option<u64>, toasts: ToastStatus) -> Self {
        Self {
            action: action.to_string(),
            timestamp: Utc::now(),
            id,
            toasts,
        }
    }
}

/// Body of POST /toasts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToastRequest {
    pub content: String,
    /// Display duration; negative values are treated as zero
    pub duration_ms: Option<i64>,
}

/// Full status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub carousel: CarouselState,
    pub autoplay: AutoplayStatus,
    pub toasts: ToastStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
