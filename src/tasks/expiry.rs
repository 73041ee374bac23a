//! TTL Expiry Tasks
//!
//! Each `set_ttl` call arms one deferred deletion that sleeps for the TTL and
//! then removes the key under the cache's write lock. When the caller runs
//! inside a Tokio runtime the timer is a task on that runtime; otherwise it
//! gets a dedicated thread.
//!
//! Timers are independent. Arming a second TTL on a key does not cancel the
//! first, and a firing timer removes whatever value the key holds at that
//! moment, even if it was overwritten after the timer was armed.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::cache::Entries;

// == Timer Handle ==
/// A single armed timer, on whichever executor it was started.
#[derive(Debug)]
pub(crate) enum TimerHandle {
    Task(JoinHandle<()>),
    Thread {
        handle: thread::JoinHandle<()>,
        cancelled: Arc<AtomicBool>,
    },
}

impl TimerHandle {
    fn is_finished(&self) -> bool {
        match self {
            TimerHandle::Task(handle) => handle.is_finished(),
            TimerHandle::Thread { handle, .. } => handle.is_finished(),
        }
    }

    /// A sleeping thread cannot be interrupted; it wakes, sees the flag, and
    /// leaves the key alone.
    fn abort(self) {
        match self {
            TimerHandle::Task(handle) => handle.abort(),
            TimerHandle::Thread { cancelled, .. } => cancelled.store(true, Ordering::Release),
        }
    }
}

/// Removes `key` if the cache is still alive.
fn expire(entries: &Weak<RwLock<Entries>>, key: &str, fired: &AtomicU64) {
    let Some(entries) = entries.upgrade() else {
        return;
    };

    let removed = {
        let mut guard = entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key).is_some()
    };
    fired.fetch_add(1, Ordering::Relaxed);

    debug!(key = %key, removed, "TTL expired");
}

/// Starts a timer that removes `key` from `entries` once `ttl` has elapsed.
///
/// The timer holds only a weak reference: if the cache is gone by the time
/// it fires, it does nothing. Fails only when no runtime is available and
/// the OS refuses a new thread.
pub(crate) fn spawn_expiry(
    entries: Weak<RwLock<Entries>>,
    key: String,
    ttl: Duration,
    fired: Arc<AtomicU64>,
) -> io::Result<TimerHandle> {
    if let Ok(runtime) = Handle::try_current() {
        let handle = runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            expire(&entries, &key, &fired);
        });
        return Ok(TimerHandle::Task(handle));
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let handle = thread::Builder::new()
        .name("kvcache-ttl".to_string())
        .spawn(move || {
            thread::sleep(ttl);
            if !flag.load(Ordering::Acquire) {
                expire(&entries, &key, &fired);
            }
        })?;

    Ok(TimerHandle::Thread { handle, cancelled })
}

// == Expiry Tracker ==
/// Keeps handles to armed timers so they can be counted and aborted.
#[derive(Debug, Default)]
pub struct ExpiryTracker {
    handles: Mutex<Vec<TimerHandle>>,
    armed: AtomicU64,
    fired: Arc<AtomicU64>,
}

impl ExpiryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a deferred deletion of `key` and starts tracking it.
    pub(crate) fn arm(&self, entries: Weak<RwLock<Entries>>, key: String, ttl: Duration) {
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Arming TTL");

        let handle = match spawn_expiry(entries, key, ttl, Arc::clone(&self.fired)) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start TTL timer: {}", e);
                return;
            }
        };
        self.armed.fetch_add(1, Ordering::Relaxed);

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Aborts every pending timer. Returns how many were still pending.
    pub fn abort_all(&self) -> usize {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = handles.iter().filter(|h| !h.is_finished()).count();
        for handle in handles.drain(..) {
            handle.abort();
        }
        pending
    }

    pub fn armed(&self) -> u64 {
        self.armed.load(Ordering::Relaxed)
    }

    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Value;

    fn entries_with(key: &str) -> Arc<RwLock<Entries>> {
        let mut map = Entries::new();
        map.insert(key.to_string(), Value::Int(1));
        Arc::new(RwLock::new(map))
    }

    #[tokio::test]
    async fn test_expiry_removes_key() {
        let entries = entries_with("k");
        let fired = Arc::new(AtomicU64::new(0));

        let handle = spawn_expiry(
            Arc::downgrade(&entries),
            "k".to_string(),
            Duration::from_millis(20),
            fired.clone(),
        )
        .unwrap();
        let TimerHandle::Task(task) = handle else {
            panic!("expected a runtime task inside #[tokio::test]");
        };
        task.await.unwrap();

        assert!(entries.read().unwrap().get("k").is_none());
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_expiry_after_cache_dropped_is_noop() {
        let entries = entries_with("k");
        let fired = Arc::new(AtomicU64::new(0));

        let handle = spawn_expiry(
            Arc::downgrade(&entries),
            "k".to_string(),
            Duration::from_millis(10),
            fired.clone(),
        )
        .unwrap();
        drop(entries);
        let TimerHandle::Task(task) = handle else {
            panic!("expected a runtime task inside #[tokio::test]");
        };
        task.await.unwrap();

        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_expiry_without_runtime_uses_thread() {
        let entries = entries_with("k");
        let fired = Arc::new(AtomicU64::new(0));

        let handle = spawn_expiry(
            Arc::downgrade(&entries),
            "k".to_string(),
            Duration::from_millis(20),
            fired.clone(),
        )
        .unwrap();
        let TimerHandle::Thread { handle, .. } = handle else {
            panic!("expected a thread outside a runtime");
        };
        handle.join().unwrap();

        assert!(!entries.read().unwrap().contains_key("k"));
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_tracker_counts_and_aborts() {
        let entries = entries_with("k");
        let tracker = ExpiryTracker::new();

        tracker.arm(Arc::downgrade(&entries), "k".to_string(), Duration::from_secs(60));
        tracker.arm(Arc::downgrade(&entries), "k".to_string(), Duration::from_secs(60));
        assert_eq!(tracker.armed(), 2);
        assert_eq!(tracker.pending(), 2);

        assert_eq!(tracker.abort_all(), 2);
        assert_eq!(tracker.pending(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(entries.read().unwrap().contains_key("k"));
        assert_eq!(tracker.fired(), 0);
    }

    #[test]
    fn test_tracker_aborts_thread_timers() {
        let entries = entries_with("k");
        let tracker = ExpiryTracker::new();

        tracker.arm(Arc::downgrade(&entries), "k".to_string(), Duration::from_millis(30));
        assert_eq!(tracker.pending(), 1);
        assert_eq!(tracker.abort_all(), 1);

        thread::sleep(Duration::from_millis(150));
        assert!(entries.read().unwrap().contains_key("k"));
        assert_eq!(tracker.fired(), 0);
    }

    #[tokio::test]
    async fn test_tracker_prunes_finished_handles() {
        let entries = entries_with("k");
        let tracker = ExpiryTracker::new();

        tracker.arm(Arc::downgrade(&entries), "k".to_string(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.fired(), 1);
        assert!(!entries.read().unwrap().contains_key("k"));
    }
}
