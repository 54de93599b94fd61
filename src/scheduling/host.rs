//! Delayed-callback facilities the countdown timer runs on
//!
//! The scheduling core never touches a clock or a runtime directly. It asks a
//! [`Host`] to run a task after some delay and to cancel it again. Production
//! code uses [`TokioHost`]; tests and embedders that want to drive time by hand
//! use [`ManualHost`].

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::debug;

use super::lock;

/// A one-shot unit of work handed to a host.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one outstanding registration with a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Registration(u64);

/// Environment capability: run a task once after a delay, or cancel it.
pub trait Host: Send + Sync + 'static {
    /// Monotonic time elapsed since the host's origin.
    fn now(&self) -> Duration;

    /// Run `task` once after `delay`. A zero delay runs on the next turn.
    fn schedule(&self, delay: Duration, task: Task) -> Registration;

    /// Cancel a registration. Unknown or already-fired registrations are ignored.
    fn cancel(&self, registration: Registration);
}

/// Host backed by the tokio timer wheel
///
/// Every registration is a spawned task sleeping for the delay. Time is read
/// from `tokio::time::Instant`, so a paused test clock drives it too.
pub struct TokioHost {
    runtime: Handle,
    origin: Instant,
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
}

impl TokioHost {
    /// Create a host on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Create a host that spawns its timers on `runtime`.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            origin: Instant::now(),
            next_id: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of registrations that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Host for TokioHost {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }

    fn schedule(&self, delay: Duration, task: Task) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.pending);
        // The deadline is fixed at registration, not when the task first polls.
        let deadline = Instant::now() + delay;

        // Hold the registry while spawning so a zero-delay task cannot
        // deregister itself before it has been registered.
        let mut pending = lock(&self.pending);
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            lock(&registry).remove(&id);
            task();
        });
        pending.insert(id, handle);

        debug!("Scheduled registration {} in {:?}", id, delay);
        Registration(id)
    }

    fn cancel(&self, registration: Registration) {
        if let Some(handle) = lock(&self.pending).remove(&registration.0) {
            handle.abort();
            debug!("Cancelled registration {}", registration.0);
        }
    }
}

impl fmt::Debug for TokioHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioHost")
            .field("now", &self.now())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Host with a virtual clock that only moves when told to
///
/// Tasks fire from inside [`ManualHost::advance`], in deadline order, with
/// ties broken by registration order. No internal lock is held while a task
/// runs, so tasks may schedule or cancel other tasks.
#[derive(Default)]
pub struct ManualHost {
    inner: Mutex<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), Task>,
    deadlines: HashMap<u64, Duration>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, firing every task that falls due.
    ///
    /// Each task observes `now()` equal to its own deadline. Tasks scheduled
    /// while advancing fire too if their deadline lies inside the window.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.inner).now + by;

        loop {
            let due = {
                let mut inner = lock(&self.inner);
                let next = inner
                    .queue
                    .first_key_value()
                    .map(|(&key, _)| key)
                    .filter(|&(deadline, _)| deadline <= target);

                next.and_then(|key| {
                    inner.deadlines.remove(&key.1);
                    inner.now = inner.now.max(key.0);
                    inner.queue.remove(&key)
                })
            };

            match due {
                Some(task) => task(),
                None => break,
            }
        }

        lock(&self.inner).now = target;
    }

    /// Shorthand for [`ManualHost::advance`] in milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Number of registrations that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner).queue.len()
    }
}

impl Host for ManualHost {
    fn now(&self) -> Duration {
        lock(&self.inner).now
    }

    fn schedule(&self, delay: Duration, task: Task) -> Registration {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;

        let deadline = inner.now + delay;
        inner.queue.insert((deadline, id), task);
        inner.deadlines.insert(id, deadline);
        Registration(id)
    }

    fn cancel(&self, registration: Registration) {
        let mut inner = lock(&self.inner);
        if let Some(deadline) = inner.deadlines.remove(&registration.0) {
            inner.queue.remove(&(deadline, registration.0));
        }
    }
}

impl fmt::Debug for ManualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ManualHost")
            .field("now", &inner.now)
            .field("pending", &inner.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<(&'static str, Duration)>>>, Arc<ManualHost>) {
        (Arc::new(Mutex::new(Vec::new())), Arc::new(ManualHost::new()))
    }

    #[test]
    fn manual_host_fires_in_deadline_order() {
        let (log, host) = recorder();

        for (label, ms) in [("late", 30), ("early", 10), ("tie-a", 20), ("tie-b", 20)] {
            let log = Arc::clone(&log);
            let clock = Arc::clone(&host);
            host.schedule(
                Duration::from_millis(ms),
                Box::new(move || log.lock().unwrap().push((label, clock.now()))),
            );
        }

        host.advance_ms(25);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("early", Duration::from_millis(10)),
                ("tie-a", Duration::from_millis(20)),
                ("tie-b", Duration::from_millis(20)),
            ]
        );
        assert_eq!(host.now(), Duration::from_millis(25));

        host.advance_ms(5);
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(host.pending_count(), 0);
    }

    #[test]
    fn manual_host_cancel_is_idempotent() {
        let (log, host) = recorder();
        let log_clone = Arc::clone(&log);
        let registration = host.schedule(
            Duration::from_millis(10),
            Box::new(move || log_clone.lock().unwrap().push(("fired", Duration::ZERO))),
        );

        host.cancel(registration);
        host.cancel(registration);
        host.advance_ms(100);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn manual_host_runs_tasks_scheduled_during_advance() {
        let (log, host) = recorder();
        let inner_log = Arc::clone(&log);
        let inner_host = Arc::clone(&host);

        host.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let log = Arc::clone(&inner_log);
                let clock = Arc::clone(&inner_host);
                inner_host.schedule(
                    Duration::from_millis(5),
                    Box::new(move || log.lock().unwrap().push(("nested", clock.now()))),
                );
            }),
        );

        host.advance_ms(20);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("nested", Duration::from_millis(15))]
        );
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let (log, host) = recorder();
        let log_clone = Arc::clone(&log);
        host.schedule(
            Duration::ZERO,
            Box::new(move || log_clone.lock().unwrap().push(("now", Duration::ZERO))),
        );

        assert!(log.lock().unwrap().is_empty());
        host.advance(Duration::ZERO);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_host_fires_and_cancels() {
        let host = TokioHost::new();
        let fired = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&fired);
        host.schedule(
            Duration::from_millis(100),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&fired);
        let cancelled = host.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                counter.fetch_add(10, Ordering::SeqCst);
            }),
        );
        host.cancel(cancelled);
        assert_eq!(host.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(host.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_host_deadline_counts_from_schedule() {
        let host = TokioHost::new();
        let fired = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&fired);
        host.schedule(
            Duration::from_millis(100),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        // The clock moves before the spawned task has been polled once.
        tokio::time::advance(Duration::from_millis(100)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(host.pending_count(), 0);
    }
}
