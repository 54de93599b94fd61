//! State management module
//!
//! This module contains the daemon's shared state: the carousel and toast
//! queue driven by the scheduling core, and their serializable snapshots.

pub mod app_state;
pub mod carousel_state;
pub mod status;

// Re-export main types
pub use app_state::AppState;
pub use carousel_state::{CarouselState, Direction};
pub use status::{ToastStatus, ToastView};
