//! Single-active toast queue with timed auto-dismiss
//!
//! Requests are admitted in FIFO order. Only one toast is active at a time;
//! whenever the active slot empties, the head of the pending queue is promoted
//! and its dismiss countdown armed. Dismissal goes through the renderer's
//! [`HideHandle`] when one is attached so an exit transition can finish first.

use std::{
    collections::VecDeque,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use super::{
    countdown::{Callback, CountdownTimer},
    host::Host,
    invoke_isolated, lock,
};

/// Unique identifier for a queued toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(u64);

impl ToastId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// One admitted toast request.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast<C> {
    id: ToastId,
    content: C,
    duration: Duration,
}

impl<C> Toast<C> {
    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    /// How long the toast stays visible once active (excluding pauses).
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Capability of a rendered toast to hide itself gracefully.
pub trait HideHandle: Send + Sync {
    /// Begin the exit sequence and call [`HideDone::complete`] once it ends.
    fn request_hide(&self, done: HideDone);
}

/// Completion token for a hide request
///
/// Dropping the token counts as completion, so a renderer that loses it
/// cannot leave a toast on screen.
pub struct HideDone {
    finish: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl HideDone {
    fn new(finish: impl FnOnce() + Send + 'static) -> Self {
        Self {
            finish: Some(Box::new(finish)),
        }
    }

    pub fn complete(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(finish) = self.finish.take() {
            invoke_isolated("Hide completion", finish);
        }
    }
}

impl Drop for HideDone {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for HideDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HideDone")
            .field("pending", &self.finish.is_some())
            .finish()
    }
}

/// FIFO admission queue with one active toast
///
/// Cloning yields another handle to the same queue.
pub struct ToastQueue<C> {
    inner: Arc<Mutex<QueueInner<C>>>,
}

struct QueueInner<C> {
    active: Option<Toast<C>>,
    pending: VecDeque<Toast<C>>,
    timer: CountdownTimer,
    hide_handle: Option<Weak<dyn HideHandle>>,
    /// Exit sequence in flight for the active toast, with everyone awaiting it.
    hiding: Option<(ToastId, Vec<oneshot::Sender<()>>)>,
    next_id: u64,
    changes: watch::Sender<Option<Toast<C>>>,
    this: Weak<Mutex<QueueInner<C>>>,
}

impl<C> QueueInner<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Fill an empty active slot from the head of the pending queue.
    fn promote(&mut self) {
        if self.active.is_some() {
            return;
        }
        let Some(next) = self.pending.pop_front() else {
            return;
        };

        let id = next.id;
        let duration = next.duration;
        self.active = Some(next);
        self.hide_handle = None;

        let dismiss = dismiss_callback(self.this.clone(), id);
        self.timer.start(dismiss, duration);
        self.changes.send_replace(self.active.clone());
        info!(
            "Toast {} active for {:?} ({} pending)",
            id.0,
            duration,
            self.pending.len()
        );
    }

    fn remove_active(&mut self) {
        self.timer.clear();
        self.hide_handle = None;
        if let Some((_, waiters)) = self.hiding.take() {
            for waiter in waiters {
                let _ = waiter.send(());
            }
        }
        if let Some(removed) = self.active.take() {
            debug!("Toast {} removed", removed.id.0);
            self.changes.send_replace(None);
        }
        self.promote();
    }

    fn remove_if_active(&mut self, id: ToastId) {
        if self.active.as_ref().is_some_and(|t| t.id == id) {
            self.remove_active();
        }
    }
}

impl<C> ToastQueue<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(host: Arc<dyn Host>) -> Self {
        let (changes, _) = watch::channel(None);
        let inner = Arc::new_cyclic(|this: &Weak<Mutex<QueueInner<C>>>| {
            Mutex::new(QueueInner {
                active: None,
                pending: VecDeque::new(),
                timer: CountdownTimer::new(host),
                hide_handle: None,
                hiding: None,
                next_id: 0,
                changes,
                this: this.clone(),
            })
        });
        Self { inner }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<C>> {
        lock(&self.inner)
    }

    /// Admit a toast: active at once if the slot is free, queued otherwise.
    pub fn add_toast(&self, content: C, duration: Duration) -> ToastId {
        let mut inner = self.lock();
        let id = ToastId(inner.next_id);
        inner.next_id += 1;

        inner.pending.push_back(Toast {
            id,
            content,
            duration,
        });
        if inner.active.is_some() {
            debug!("Toast {} queued at position {}", id.0, inner.pending.len());
        }
        inner.promote();
        id
    }

    /// Drop the active toast at once and promote the next one.
    pub fn remove_toast(&self) {
        self.lock().remove_active();
    }

    /// Drop the active toast and everything waiting behind it.
    pub fn clear_toast_queue(&self) {
        let mut inner = self.lock();
        let dropped = inner.pending.len();
        inner.pending.clear();
        inner.remove_active();
        if dropped > 0 {
            info!("Toast queue cleared, {} pending dropped", dropped);
        }
    }

    /// Ask the active toast to hide itself.
    ///
    /// The request is issued immediately; the returned future resolves once
    /// the exit sequence has finished and the toast has been removed. Without
    /// a live hide handle the toast is removed on the spot.
    pub fn hide_toast(&self) -> impl Future<Output = ()> + Send + 'static {
        let completion = self.begin_hide(None);
        async move {
            if let Some(completion) = completion {
                let _ = completion.await;
            }
        }
    }

    /// Register the hide capability of the renderer showing toast `id`.
    ///
    /// Only a weak reference is kept. Returns `false` if `id` is not active.
    pub fn attach_hide_handle(&self, id: ToastId, handle: &Arc<dyn HideHandle>) -> bool {
        let mut inner = self.lock();
        if inner.active.as_ref().map(Toast::id) != Some(id) {
            return false;
        }
        inner.hide_handle = Some(Arc::downgrade(handle));
        true
    }

    /// Suspend the active toast's dismiss countdown, returning what is left.
    pub fn pause_timer(&self) -> Duration {
        self.lock().timer.pause()
    }

    pub fn resume_timer(&self) {
        self.lock().timer.resume();
    }

    pub fn active_toast(&self) -> Option<Toast<C>> {
        self.lock().active.clone()
    }

    /// Toasts waiting for admission, head first.
    pub fn pending(&self) -> Vec<Toast<C>> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Time left on the active toast's dismiss countdown.
    pub fn remaining(&self) -> Duration {
        self.lock().timer.remaining()
    }

    pub fn is_timer_paused(&self) -> bool {
        self.lock().timer.is_paused()
    }

    /// Watch the active slot. The receiver sees every promotion and removal.
    pub fn subscribe(&self) -> watch::Receiver<Option<Toast<C>>> {
        self.lock().changes.subscribe()
    }

    /// Shared by `hide_toast` and the dismiss countdown. With `expected` set,
    /// only hides if that toast is still the active one.
    ///
    /// A toast is asked to hide at most once. Later requests while its exit
    /// sequence runs wait on that same sequence.
    fn begin_hide(&self, expected: Option<ToastId>) -> Option<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        let (id, handle) = {
            let mut inner = self.lock();
            let id = inner.active.as_ref()?.id;
            if expected.is_some_and(|expected| expected != id) {
                return None;
            }

            if let Some((hiding, waiters)) = inner.hiding.as_mut() {
                if *hiding == id {
                    waiters.push(tx);
                    return Some(rx);
                }
            }

            match inner.hide_handle.as_ref().and_then(Weak::upgrade) {
                Some(handle) => {
                    // The exit sequence owns the toast now; no second dismiss.
                    inner.timer.clear();
                    inner.hiding = Some((id, vec![tx]));
                    (id, handle)
                }
                None => {
                    inner.remove_active();
                    return None;
                }
            }
        };

        debug!("Requesting graceful hide of toast {}", id.0);
        let queue = Arc::downgrade(&self.inner);
        handle.request_hide(HideDone::new(move || {
            if let Some(inner) = queue.upgrade() {
                lock(&inner).remove_if_active(id);
            }
        }));
        Some(rx)
    }
}

impl<C> Clone for ToastQueue<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for ToastQueue<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ToastQueue")
            .field("active", &inner.active)
            .field("pending", &inner.pending)
            .field("timer", &inner.timer)
            .finish_non_exhaustive()
    }
}

/// Dismiss countdown elapse: hide toast `id` through the same path as
/// `hide_toast`, if it is still the active one.
fn dismiss_callback<C>(queue: Weak<Mutex<QueueInner<C>>>, id: ToastId) -> Callback
where
    C: Clone + Send + Sync + 'static,
{
    Arc::new(move || {
        if let Some(inner) = queue.upgrade() {
            debug!("Toast {} dismiss countdown elapsed", id.0);
            // Completion is tracked by the queue itself; nobody awaits it here.
            let _ = ToastQueue { inner }.begin_hide(Some(id));
        }
    })
}
