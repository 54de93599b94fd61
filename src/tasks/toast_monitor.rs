//! Toast presentation background task

use std::{sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::{
    scheduling::{HideDone, HideHandle, Toast},
    state::AppState,
};

/// Hide capability for daemon toasts: the exit transition is a fixed fade
#[derive(Debug)]
pub struct FadeOut {
    fade: Duration,
    runtime: Handle,
}

impl FadeOut {
    /// Create a fade running on the current tokio runtime
    pub fn new(fade: Duration) -> Self {
        Self {
            fade,
            runtime: Handle::current(),
        }
    }
}

impl HideHandle for FadeOut {
    fn request_hide(&self, done: HideDone) {
        let fade = self.fade;
        debug!("Fading out toast over {:?}", fade);
        self.runtime.spawn(async move {
            tokio::time::sleep(fade).await;
            done.complete();
        });
    }
}

/// Background task that presents each toast as it becomes active and
/// attaches the fade-out hide handle to it
pub async fn toast_monitor_task(state: Arc<AppState>) {
    info!("Starting toast monitor task");

    let renderer: Arc<dyn HideHandle> = Arc::new(FadeOut::new(state.fade));
    let mut changes = state.toasts.subscribe();

    let current = changes.borrow_and_update().clone();
    present(&state, current, &renderer);

    while changes.changed().await.is_ok() {
        let current = changes.borrow_and_update().clone();
        present(&state, current, &renderer);
    }

    warn!("Toast queue closed, stopping toast monitor");
}

fn present(state: &AppState, toast: Option<Toast<String>>, renderer: &Arc<dyn HideHandle>) {
    match toast {
        Some(toast) => {
            info!("Toast {}: {}", toast.id().value(), toast.content());
            if !state.toasts.attach_hide_handle(toast.id(), renderer) {
                debug!("Toast {} left before it could be presented", toast.id().value());
            }
        }
        None => debug!("No toast showing"),
    }
}
