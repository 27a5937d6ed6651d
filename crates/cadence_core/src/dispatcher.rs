//! Cross-Thread Warning Dispatch
//!
//! Moves clipping/oversaturation warnings from the audio thread to the UI
//! thread without ever blocking the audio thread.
//!
//! # Architecture
//!
//! ```text
//!   Audio thread                        UI / consumer thread
//!   ────────────                        ────────────────────
//!   trigger() ──▶ [pending: AtomicBool] ──▶ take_pending() ──▶ listeners
//!                 Idle ──▶ Pending           Pending ──▶ Idle
//! ```
//!
//! Each warning kind has a single-slot coalescing flag. Any number of
//! triggers before the consumer drains collapse into one notification. The
//! flag is cleared *before* listeners run, so a trigger that races with
//! delivery opens a fresh window that the next drain picks up.
//!
//! The listener registry is consumer-side only and is never touched by
//! the audio thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::{MonitorError, MonitorResult};
use crate::message::{MonitorEvent, WarningKind};

/// Single-slot coalescing Idle/Pending state machine for one warning kind
#[derive(Debug)]
pub struct WarningDispatcher {
    kind: WarningKind,
    pending: AtomicBool,
}

impl WarningDispatcher {
    pub fn new(kind: WarningKind) -> Self {
        Self {
            kind,
            pending: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> WarningKind {
        self.kind
    }

    /// Request a notification. Returns `true` if this call moved the
    /// dispatcher from Idle to Pending, `false` if one was already pending.
    ///
    /// # Real-time Safety
    /// Lock-free, allocation-free, never blocks.
    #[inline]
    pub fn trigger(&self) -> bool {
        // Skip the write when already pending to keep the cache line shared
        if self.pending.load(Ordering::Relaxed) {
            return false;
        }
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consume the pending notification, moving back to Idle.
    /// Returns `true` if a notification is owed to listeners.
    #[inline]
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Receives coalesced warnings on the consumer thread
///
/// Both methods default to no-ops so listeners only implement what they
/// care about.
pub trait WarningListener: Send + Sync {
    fn on_clipping_warning(&self) {}

    fn on_oversaturation_warning(&self) {}
}

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registration-ordered, non-owning listener list
///
/// Listeners are held as `Weak` references: dropping the last `Arc` of a
/// listener is enough to stop deliveries to it.
pub struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Weak<dyn WarningListener>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener. Not for the audio thread (allocates and locks).
    pub fn add<L: WarningListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn WarningListener> = weak;
        self.listeners.lock().push((id, weak));
        id
    }

    /// Unregister a listener. Returns `false` if the id was unknown.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners that are still alive
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Invoke every live listener for `kind`, in registration order.
    ///
    /// The lock is released before any callback runs, so listeners may
    /// register or unregister from inside a callback. A panicking listener
    /// is logged and skipped; the rest are still notified.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn notify(&self, kind: WarningKind) -> usize {
        let live: Vec<Arc<dyn WarningListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|(_, weak)| weak.strong_count() > 0);
            listeners.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };

        let mut delivered = 0;
        for listener in live {
            let result = catch_unwind(AssertUnwindSafe(|| match kind {
                WarningKind::Clipping => listener.on_clipping_warning(),
                WarningKind::Oversaturation => listener.on_oversaturation_warning(),
            }));

            match result {
                Ok(()) => delivered += 1,
                Err(_) => error!("Warning listener panicked while handling {:?}", kind),
            }
        }

        debug!("Dispatched {:?} warning to {} listeners", kind, delivered);
        delivered
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener that forwards warnings into a channel
///
/// Useful for event loops that already select over channels.
pub struct ChannelListener {
    sender: Sender<MonitorEvent>,
}

impl ChannelListener {
    pub fn new(sender: Sender<MonitorEvent>) -> Self {
        Self { sender }
    }

    /// Listener plus the receiving end of a fresh unbounded channel
    pub fn channel() -> (Arc<Self>, Receiver<MonitorEvent>) {
        let (sender, receiver) = unbounded();
        (Arc::new(Self::new(sender)), receiver)
    }

    fn forward(&self, kind: WarningKind) {
        // Receiver gone means nobody is interested any more
        let _ = self.sender.try_send(MonitorEvent::Warning(kind));
    }
}

impl WarningListener for ChannelListener {
    fn on_clipping_warning(&self) {
        self.forward(WarningKind::Clipping);
    }

    fn on_oversaturation_warning(&self) {
        self.forward(WarningKind::Oversaturation);
    }
}

/// Background thread that drains pending warnings at a fixed cadence
///
/// Stops (after one final drain) when `stop()` is called or the handle is
/// dropped.
pub struct DispatchThread {
    shutdown_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DispatchThread {
    pub fn spawn<F>(interval: Duration, mut drain: F) -> MonitorResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown_flag);

        let handle = thread::Builder::new()
            .name("cadence-dispatch".into())
            .spawn(move || {
                info!("Dispatch thread started ({:?} interval)", interval);
                while !shutdown_clone.load(Ordering::Acquire) {
                    drain();
                    thread::sleep(interval);
                }
                drain();
                info!("Dispatch thread stopped");
            })
            .map_err(|e| MonitorError::ThreadSpawnError(e.to_string()))?;

        Ok(Self {
            shutdown_flag,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal shutdown and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shutdown_flag.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Dispatch thread panicked");
            }
        }
    }
}

impl Drop for DispatchThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
