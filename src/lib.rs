//! Cuedeck - pausable countdown scheduling for carousels and toasts
//!
//! The [`scheduling`] module is the core: a pausable single-shot countdown,
//! the autoplay state machine that drives a carousel, and a FIFO toast queue
//! with one active toast. The remaining modules wrap that core in a small
//! HTTP daemon.

pub mod config;
pub mod scheduling;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use scheduling::{AutoplayController, AutoplayOptions, CountdownTimer, ToastQueue};
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
