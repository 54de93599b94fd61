//! Wiring from autoplay completions to carousel advances

use std::sync::{Arc, Weak};
use tracing::info;

use crate::{scheduling::Subscription, state::AppState};

/// Register the completion listener that moves the carousel forward each
/// time the autoplay countdown elapses, then restarts the countdown.
pub fn wire_carousel_advance(state: &Arc<AppState>) -> Subscription {
    info!("Wiring carousel to autoplay completions");

    let weak: Weak<AppState> = Arc::downgrade(state);
    state.autoplay.add_completion_listener(move || {
        if let Some(state) = weak.upgrade() {
            state.advance_carousel();
        }
    })
}
