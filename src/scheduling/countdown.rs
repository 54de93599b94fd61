//! Pausable single-shot countdown

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::debug;

use super::host::{Host, Registration};

/// Callback run when a countdown elapses. Kept across pause/resume.
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Single-shot delayed callback with pause (capture remaining time) and
/// resume (reschedule with what is left).
///
/// At most one registration with the host is outstanding at any time. Every
/// reprogramming or cancellation bumps an epoch shared with the scheduled
/// task; a task whose epoch is stale when it runs does nothing, so a fire the
/// host had already dispatched cannot slip past a cancellation.
pub struct CountdownTimer {
    host: Arc<dyn Host>,
    pending: Option<Registration>,
    started_at: Duration,
    remaining: Duration,
    callback: Option<Callback>,
    paused: bool,
    epoch: Arc<AtomicU64>,
    armed_epoch: u64,
}

impl CountdownTimer {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            pending: None,
            started_at: Duration::ZERO,
            remaining: Duration::ZERO,
            callback: None,
            paused: false,
            epoch: Arc::new(AtomicU64::new(0)),
            armed_epoch: 0,
        }
    }

    /// Cancel any outstanding countdown and run `callback` after `duration`.
    pub fn start(&mut self, callback: Callback, duration: Duration) {
        self.cancel_pending();

        self.callback = Some(Arc::clone(&callback));
        self.started_at = self.host.now();
        self.remaining = duration;
        self.paused = false;

        let armed = self.epoch.load(Ordering::SeqCst);
        let epoch = Arc::clone(&self.epoch);
        self.armed_epoch = armed;
        self.pending = Some(self.host.schedule(
            duration,
            Box::new(move || {
                // Consume the epoch so a racing cancel and this fire cannot both win.
                if epoch
                    .compare_exchange(armed, armed + 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    callback();
                }
            }),
        ));

        debug!("Countdown armed for {:?}", duration);
    }

    /// Stop the countdown and return the time it still had to run.
    ///
    /// Calling again before `start`/`resume` returns the same value and
    /// touches nothing.
    pub fn pause(&mut self) -> Duration {
        if !self.paused {
            self.cancel_pending();
            let elapsed = self.host.now().saturating_sub(self.started_at);
            self.remaining = self.remaining.saturating_sub(elapsed);
            self.paused = true;
            debug!("Countdown paused with {:?} remaining", self.remaining);
        }
        self.remaining
    }

    /// Reschedule the retained callback with the remaining time, if paused.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        if let Some(callback) = self.callback.clone() {
            let remaining = self.remaining;
            self.start(callback, remaining);
        }
    }

    /// Cancel the countdown and forget any captured remaining time.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.paused = false;
        self.remaining = Duration::ZERO;
        self.started_at = self.host.now();
    }

    /// Time left before the callback fires. Frozen while paused, zero when idle.
    pub fn remaining(&self) -> Duration {
        if self.paused {
            return self.remaining;
        }
        let elapsed = self.host.now().saturating_sub(self.started_at);
        self.remaining.saturating_sub(elapsed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a registration is armed and has not fired yet.
    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some() && self.epoch.load(Ordering::SeqCst) == self.armed_epoch
    }

    fn cancel_pending(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(registration) = self.pending.take() {
            self.host.cancel(registration);
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("remaining", &self.remaining())
            .field("paused", &self.paused)
            .field("scheduled", &self.is_scheduled())
            .finish_non_exhaustive()
    }
}
