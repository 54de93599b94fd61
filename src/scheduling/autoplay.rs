//! Carousel autoplay state machine
//!
//! Playback is derived, never stored: the controller is playing when the
//! external `enabled` gate is open and it is neither stopped (user intent)
//! nor paused (transient interaction). Logical flags are always updated before
//! the countdown is reprogrammed, so status queries made right after a command
//! already reflect it.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    countdown::{Callback, CountdownTimer},
    host::Host,
    invoke_isolated, lock,
};

/// Side-effect hook fired on playing/not-playing transitions.
pub type Hook = Arc<dyn Fn() + Send + Sync + 'static>;

/// Construction parameters for an [`AutoplayController`].
#[derive(Clone)]
pub struct AutoplayOptions {
    pub enabled: bool,
    pub interval: Duration,
    pub on_start: Option<Hook>,
    pub on_stop: Option<Hook>,
}

impl AutoplayOptions {
    /// Enabled autoplay advancing every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval,
            on_start: None,
            on_stop: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn on_start(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    pub fn on_stop(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_stop = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for AutoplayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoplayOptions")
            .field("enabled", &self.enabled)
            .field("interval", &self.interval)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

/// Point-in-time view of the controller, for progress indicators and APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoplayStatus {
    pub is_playing: bool,
    pub is_stopped: bool,
    pub is_paused: bool,
    pub enabled: bool,
    pub interval_ms: u64,
    pub remaining_ms: u64,
}

/// Play/stop/pause/resume/reset state machine emitting "advance" signals
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct AutoplayController {
    inner: Arc<Mutex<AutoplayInner>>,
}

struct AutoplayInner {
    enabled: bool,
    stopped: bool,
    paused: bool,
    interval: Duration,
    timer: CountdownTimer,
    advance: Callback,
    listeners: Vec<(u64, Callback)>,
    next_listener_id: u64,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

impl AutoplayInner {
    fn is_playing(&self) -> bool {
        self.enabled && !self.stopped && !self.paused
    }

    fn program_fresh(&mut self) {
        let advance = Arc::clone(&self.advance);
        self.timer.start(advance, self.interval);
    }

    fn start(&mut self) -> Option<Hook> {
        let was_playing = self.is_playing();
        self.start_from(was_playing)
    }

    /// Shared body of `start()` and the enable edge. `was_playing` is the
    /// playing state before the command touched any flag. Returns the hook
    /// to fire.
    fn start_from(&mut self, was_playing: bool) -> Option<Hook> {
        self.stopped = false;
        if !self.paused && self.enabled {
            self.program_fresh();
        }

        if !was_playing && self.is_playing() {
            info!("Autoplay started ({:?} interval)", self.interval);
            self.on_start.clone()
        } else {
            None
        }
    }

    fn stop(&mut self) -> Option<Hook> {
        let was_playing = self.is_playing();
        self.timer.pause();
        self.stopped = true;

        if was_playing {
            info!("Autoplay stopped");
            self.on_stop.clone()
        } else {
            None
        }
    }

    fn status(&self) -> AutoplayStatus {
        AutoplayStatus {
            is_playing: self.is_playing(),
            is_stopped: self.stopped,
            is_paused: self.paused,
            enabled: self.enabled,
            interval_ms: millis(self.interval),
            remaining_ms: millis(self.timer.remaining()),
        }
    }
}

impl AutoplayController {
    /// Create a controller. With `enabled` set it starts playing at once and
    /// fires `on_start`.
    pub fn new(host: Arc<dyn Host>, options: AutoplayOptions) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Mutex<AutoplayInner>>| {
            Mutex::new(AutoplayInner {
                enabled: false,
                stopped: false,
                paused: false,
                interval: options.interval,
                timer: CountdownTimer::new(host),
                advance: advance_callback(weak.clone()),
                listeners: Vec::new(),
                next_listener_id: 0,
                on_start: options.on_start,
                on_stop: options.on_stop,
            })
        });

        let controller = Self { inner };
        if options.enabled {
            controller.set_enabled(true);
        }
        controller
    }

    fn lock(&self) -> MutexGuard<'_, AutoplayInner> {
        lock(&self.inner)
    }

    /// Clear the stopped flag and, unless paused or gated off, restart the
    /// countdown from the full interval.
    pub fn start(&self) {
        let hook = self.lock().start();
        fire_hook("on_start", hook);
    }

    /// Stop playback, keeping the countdown's remaining time frozen.
    pub fn stop(&self) {
        let hook = self.lock().stop();
        fire_hook("on_stop", hook);
    }

    pub fn toggle(&self) {
        let mut inner = self.lock();
        let (label, hook) = if inner.stopped {
            ("on_start", inner.start())
        } else {
            ("on_stop", inner.stop())
        };
        drop(inner);
        fire_hook(label, hook);
    }

    /// Restart the countdown from the full interval, discarding progress.
    ///
    /// While paused or stopped the fresh countdown is frozen immediately, so
    /// the remaining time reads as the whole interval.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.timer.clear();
        inner.program_fresh();
        if inner.paused || inner.stopped {
            inner.timer.pause();
        }
        debug!("Autoplay countdown reset");
    }

    /// Suspend playback for an interaction. No-op unless playing.
    pub fn pause(&self) {
        let mut inner = self.lock();
        if !inner.is_playing() {
            return;
        }
        inner.timer.pause();
        inner.paused = true;
        debug!("Autoplay paused");
    }

    /// End an interaction pause. No-op while stopped.
    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.stopped {
            return;
        }

        inner.paused = false;
        if inner.enabled {
            if inner.timer.remaining() > Duration::ZERO {
                inner.timer.resume();
            } else {
                inner.program_fresh();
            }
        }
        debug!("Autoplay resumed");
    }

    /// Feed the external gate. Opening it starts playback unless stopped or
    /// paused; closing it only gates the advance signal and leaves the
    /// stopped flag alone.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.lock();
        let was_playing = inner.is_playing();
        let opened = enabled && !inner.enabled;
        inner.enabled = enabled;

        let hook = if opened && !inner.stopped && !inner.paused {
            inner.start_from(was_playing)
        } else {
            None
        };
        drop(inner);
        fire_hook("on_start", hook);
    }

    pub fn get_remaining_time(&self) -> Duration {
        self.lock().timer.remaining()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().is_playing()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn status(&self) -> AutoplayStatus {
        self.lock().status()
    }

    /// Register an observer notified each time a countdown elapses while
    /// playing. The returned subscription removes exactly this observer.
    pub fn add_completion_listener(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));

        Subscription {
            controller: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl fmt::Debug for AutoplayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("AutoplayController")
            .field("status", &inner.status())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Handle returned by [`AutoplayController::add_completion_listener`].
#[derive(Debug, Clone)]
pub struct Subscription {
    controller: Weak<Mutex<AutoplayInner>>,
    id: u64,
}

impl Subscription {
    /// Remove the observer. Later calls do nothing.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.controller.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// The countdown's elapse handler. Checks the playing state at fire time and
/// notifies a snapshot of the listeners with no lock held.
fn advance_callback(controller: Weak<Mutex<AutoplayInner>>) -> Callback {
    Arc::new(move || {
        let Some(inner) = controller.upgrade() else {
            return;
        };

        let listeners: Vec<Callback> = {
            let guard = lock(&inner);
            if !guard.is_playing() {
                debug!("Stale autoplay advance suppressed");
                return;
            }
            guard.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        debug!("Autoplay advance, notifying {} listeners", listeners.len());
        for listener in listeners {
            invoke_isolated("Completion listener", || listener());
        }
    })
}

fn fire_hook(label: &str, hook: Option<Hook>) {
    if let Some(hook) = hook {
        invoke_isolated(label, || hook());
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::ManualHost;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_millis(3000);

    struct Fixture {
        host: Arc<ManualHost>,
        autoplay: AutoplayController,
        advances: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new(enabled: bool) -> Self {
            let host = Arc::new(ManualHost::new());
            let starts = Arc::new(AtomicUsize::new(0));
            let stops = Arc::new(AtomicUsize::new(0));

            let on_start = Arc::clone(&starts);
            let on_stop = Arc::clone(&stops);
            let options = AutoplayOptions::new(INTERVAL)
                .enabled(enabled)
                .on_start(move || {
                    on_start.fetch_add(1, Ordering::SeqCst);
                })
                .on_stop(move || {
                    on_stop.fetch_add(1, Ordering::SeqCst);
                });
            let autoplay = AutoplayController::new(host.clone(), options);

            let advances = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&advances);
            autoplay.add_completion_listener(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

            Self {
                host,
                autoplay,
                advances,
                starts,
                stops,
            }
        }

        fn advances(&self) -> usize {
            self.advances.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn enabled_controller_plays_immediately() {
        let f = Fixture::new(true);
        assert!(f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);
        assert_eq!(f.autoplay.get_remaining_time(), INTERVAL);
    }

    #[test]
    fn disabled_controller_is_idle() {
        let f = Fixture::new(false);
        assert!(!f.autoplay.is_playing());
        assert!(!f.autoplay.is_stopped());
        assert!(!f.autoplay.is_paused());
        assert_eq!(f.starts.load(Ordering::SeqCst), 0);

        f.host.advance_ms(10_000);
        assert_eq!(f.advances(), 0);
    }

    #[test]
    fn reset_restarts_after_advance() {
        let f = Fixture::new(true);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);

        f.autoplay.reset();
        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 2);
    }

    #[test]
    fn reset_discards_partial_progress() {
        let f = Fixture::new(true);

        f.host.advance_ms(2000);
        f.autoplay.reset();
        f.host.advance_ms(2999);
        assert_eq!(f.advances(), 0);
        f.host.advance_ms(1);
        assert_eq!(f.advances(), 1);
    }

    #[test]
    fn reset_while_paused_reports_full_interval() {
        let f = Fixture::new(true);

        f.host.advance_ms(1000);
        f.autoplay.pause();
        f.autoplay.reset();
        f.host.advance_ms(500);
        assert_eq!(f.autoplay.get_remaining_time(), INTERVAL);

        f.autoplay.resume();
        f.host.advance_ms(2999);
        assert_eq!(f.advances(), 0);
        f.host.advance_ms(1);
        assert_eq!(f.advances(), 1);
    }

    #[test]
    fn pause_then_resume_fires_at_remaining_time() {
        let f = Fixture::new(true);

        f.host.advance_ms(1200);
        f.autoplay.pause();
        assert!(f.autoplay.is_paused());
        assert!(!f.autoplay.is_playing());
        assert_eq!(f.autoplay.get_remaining_time(), Duration::from_millis(1800));

        f.host.advance_ms(10_000);
        assert_eq!(f.advances(), 0);

        f.autoplay.resume();
        assert!(f.autoplay.is_playing());
        assert_eq!(f.autoplay.get_remaining_time(), Duration::from_millis(1800));
        f.host.advance_ms(1799);
        assert_eq!(f.advances(), 0);
        f.host.advance_ms(1);
        assert_eq!(f.advances(), 1);
    }

    #[test]
    fn resume_after_elapsed_countdown_starts_fresh() {
        let f = Fixture::new(true);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);
        f.autoplay.resume();
        assert_eq!(f.autoplay.get_remaining_time(), INTERVAL);
        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 2);
    }

    #[test]
    fn resume_while_playing_keeps_countdown() {
        let f = Fixture::new(true);

        f.host.advance_ms(1000);
        f.autoplay.resume();
        assert_eq!(f.autoplay.get_remaining_time(), Duration::from_millis(2000));
    }

    #[test]
    fn stop_suppresses_advance_and_fires_hook_once() {
        let f = Fixture::new(true);

        f.host.advance_ms(1000);
        f.autoplay.stop();
        f.autoplay.stop();
        assert!(f.autoplay.is_stopped());
        assert_eq!(f.stops.load(Ordering::SeqCst), 1);

        f.host.advance_ms(10_000);
        assert_eq!(f.advances(), 0);
        assert_eq!(f.autoplay.get_remaining_time(), Duration::from_millis(2000));
    }

    #[test]
    fn start_hooks_fire_only_on_transitions() {
        let f = Fixture::new(true);

        f.autoplay.start();
        f.autoplay.start();
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);

        f.autoplay.stop();
        f.autoplay.start();
        assert_eq!(f.starts.load(Ordering::SeqCst), 2);
        assert_eq!(f.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_after_stop_runs_full_interval() {
        let f = Fixture::new(true);

        f.host.advance_ms(2500);
        f.autoplay.stop();
        f.autoplay.start();
        f.host.advance_ms(2999);
        assert_eq!(f.advances(), 0);
        f.host.advance_ms(1);
        assert_eq!(f.advances(), 1);
    }

    #[test]
    fn toggle_alternates_between_stop_and_start() {
        let f = Fixture::new(true);

        f.autoplay.toggle();
        assert!(f.autoplay.is_stopped());
        assert!(!f.autoplay.is_playing());

        f.autoplay.toggle();
        assert!(!f.autoplay.is_stopped());
        assert!(f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 2);
        assert_eq!(f.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pause_is_noop_unless_playing() {
        let f = Fixture::new(true);

        f.autoplay.stop();
        f.autoplay.pause();
        assert!(!f.autoplay.is_paused());
    }

    #[test]
    fn resume_is_noop_while_stopped() {
        let f = Fixture::new(true);

        f.autoplay.pause();
        f.autoplay.stop();
        f.autoplay.resume();
        assert!(f.autoplay.is_paused());
        assert!(!f.autoplay.is_playing());

        f.host.advance_ms(10_000);
        assert_eq!(f.advances(), 0);
    }

    #[test]
    fn start_while_paused_waits_for_resume() {
        let f = Fixture::new(true);

        f.autoplay.pause();
        f.autoplay.start();
        assert!(!f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);

        f.host.advance_ms(10_000);
        assert_eq!(f.advances(), 0);
    }

    #[test]
    fn enable_edge_is_asymmetric() {
        let f = Fixture::new(false);

        f.autoplay.set_enabled(true);
        assert!(f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);

        f.autoplay.set_enabled(false);
        assert!(!f.autoplay.is_stopped());
        assert!(!f.autoplay.is_playing());
        assert_eq!(f.stops.load(Ordering::SeqCst), 0);

        // Gated off: the countdown still elapses but nothing is notified.
        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 0);

        f.autoplay.set_enabled(true);
        assert!(f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn opening_gate_fires_on_start_exactly_once() {
        let f = Fixture::new(false);

        f.autoplay.set_enabled(true);
        f.autoplay.set_enabled(true);
        assert!(f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);
        assert_eq!(f.autoplay.get_remaining_time(), INTERVAL);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);
    }

    #[test]
    fn enable_edge_respects_stop() {
        let f = Fixture::new(true);

        f.autoplay.stop();
        f.autoplay.set_enabled(false);
        f.autoplay.set_enabled(true);
        assert!(f.autoplay.is_stopped());
        assert!(!f.autoplay.is_playing());
        assert_eq!(f.starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_ghost_fires_after_any_stopping_sequence() {
        let sequences: [&[&str]; 4] = [
            &["stop"],
            &["pause"],
            &["stop", "start", "stop"],
            &["pause", "resume", "pause"],
        ];

        for sequence in sequences {
            let f = Fixture::new(true);
            for step in sequence {
                f.host.advance_ms(700);
                match *step {
                    "start" => f.autoplay.start(),
                    "stop" => f.autoplay.stop(),
                    "pause" => f.autoplay.pause(),
                    "resume" => f.autoplay.resume(),
                    other => unreachable!("unknown step {other}"),
                }
            }
            assert!(!f.autoplay.is_playing());
            f.host.advance_ms(30_000);
            assert_eq!(f.advances(), 0, "sequence {sequence:?} advanced");
        }
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let f = Fixture::new(true);
        let extra = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&extra);
        let subscription = f.autoplay.add_completion_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(f.autoplay.listener_count(), 2);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert_eq!(f.autoplay.listener_count(), 1);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);
        assert_eq!(extra.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_may_mutate_registry_during_notification() {
        let f = Fixture::new(true);
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let late = Arc::new(AtomicUsize::new(0));

        let controller = f.autoplay.clone();
        let own = Arc::clone(&slot);
        let late_counter = Arc::clone(&late);
        let subscription = f.autoplay.add_completion_listener(move || {
            if let Some(me) = own.lock().unwrap().take() {
                me.unsubscribe();
            }
            let counter = Arc::clone(&late_counter);
            controller.add_completion_listener(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            controller.reset();
        });
        *slot.lock().unwrap() = Some(subscription);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);
        assert_eq!(f.autoplay.listener_count(), 2);

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 2);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let f = Fixture::new(true);
        f.autoplay.add_completion_listener(|| panic!("listener failure"));
        let after = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&after);
        f.autoplay.add_completion_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        f.host.advance_ms(3000);
        assert_eq!(f.advances(), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_interval_is_valid() {
        let host = Arc::new(ManualHost::new());
        let autoplay = AutoplayController::new(host.clone(), AutoplayOptions::new(Duration::ZERO));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        autoplay.add_completion_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        host.advance(Duration::ZERO);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_snapshot_reflects_flags() {
        let f = Fixture::new(true);
        f.host.advance_ms(500);
        f.autoplay.pause();

        let status = f.autoplay.status();
        assert_eq!(
            status,
            AutoplayStatus {
                is_playing: false,
                is_stopped: false,
                is_paused: true,
                enabled: true,
                interval_ms: 3000,
                remaining_ms: 2500,
            }
        );
    }

    #[test]
    fn dropping_controller_cancels_countdown() {
        let f = Fixture::new(true);
        let Fixture { host, autoplay, advances, .. } = f;
        drop(autoplay);
        assert_eq!(host.pending_count(), 0);
        host.advance_ms(5000);
        assert_eq!(advances.load(Ordering::SeqCst), 0);
    }
}
