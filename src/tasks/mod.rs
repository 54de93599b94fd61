//! Background tasks module
//!
//! This module contains the wiring and tasks that run alongside the HTTP server.

pub mod carousel_advance;
pub mod toast_monitor;

// Re-export main functions
pub use carousel_advance::wire_carousel_advance;
pub use toast_monitor::{toast_monitor_task, FadeOut};
