//! Delay-scheduling core
//!
//! A pausable single-shot [`CountdownTimer`] and the two state machines built
//! on it: the carousel [`AutoplayController`] and the single-active
//! [`ToastQueue`]. All three run on an injectable [`Host`].

pub mod autoplay;
pub mod countdown;
pub mod host;
pub mod toast_queue;

pub use autoplay::{AutoplayController, AutoplayOptions, AutoplayStatus, Subscription};
pub use countdown::{Callback, CountdownTimer};
pub use host::{Host, ManualHost, Registration, Task, TokioHost};
pub use toast_queue::{HideDone, HideHandle, Toast, ToastId, ToastQueue};

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::error;

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Callbacks never run under these locks, so a poisoned guard still holds
/// consistent state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run a client callback so that a panic inside it is logged instead of
/// unwinding through the scheduler.
pub(crate) fn invoke_isolated(label: &str, callback: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        error!("{} panicked: {}", label, panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
