//! Serializable snapshots of the toast queue

use serde::{Deserialize, Serialize};

use crate::scheduling::{Toast, ToastQueue};

/// A toast as reported over the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastView {
    pub id: u64,
    pub content: String,
    pub duration_ms: u64,
}

impl From<&Toast<String>> for ToastView {
    fn from(toast: &Toast<String>) -> Self {
        Self {
            id: toast.id().value(),
            content: toast.content().clone(),
            duration_ms: u64::try_from(toast.duration().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Toast queue state for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastStatus {
    pub active: Option<ToastView>,
    pub pending: Vec<ToastView>,
    /// Time left on the active toast's dismiss countdown
    pub remaining_ms: u64,
    pub timer_paused: bool,
}

impl ToastStatus {
    /// Capture the current state of `queue`
    pub fn capture(queue: &ToastQueue<String>) -> Self {
        let active = queue.active_toast();
        Self {
            remaining_ms: if active.is_some() {
                u64::try_from(queue.remaining().as_millis()).unwrap_or(u64::MAX)
            } else {
                0
            },
            active: active.as_ref().map(ToastView::from),
            pending: queue.pending().iter().map(ToastView::from).collect(),
            timer_paused: queue.is_timer_paused(),
        }
    }
}
