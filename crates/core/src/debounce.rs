//! Keyed debounce timers
//!
//! Each key owns at most one pending timer. Scheduling again for the same key
//! aborts the previous timer and starts a new one. The whole registry is torn
//! down with [`Debouncer::cancel_all`] (also on drop) so no callback can outlive
//! the session that scheduled it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timer registry keyed by `K`
///
/// Must be used from within a Tokio runtime.
pub struct Debouncer<K> {
    delay: Duration,
    timers: HashMap<K, JoinHandle<()>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Copy + Debug,
{
    /// Create registry with the given quiet period
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the timer for `key`; `action` runs once it expires
    pub fn schedule<F>(&mut self, key: K, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.timers.remove(&key) {
            previous.abort();
        }

        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        self.timers.insert(key, handle);
    }

    /// Cancel timer for `key`, returns whether one was still pending
    pub fn cancel(&mut self, key: K) -> bool {
        match self.timers.remove(&key) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// Cancel and remove every timer, returns how many were still pending
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for (key, handle) in self.timers.drain() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling pending timer {:?}", key);
                cancelled += 1;
            }
            handle.abort();
        }
        cancelled
    }

    /// Whether `key` has a timer that has not completed yet
    pub fn is_pending(&self, key: K) -> bool {
        self.timers
            .get(&key)
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Number of timers that have not completed yet
    pub fn pending_count(&self) -> usize {
        self.timers.values().filter(|h| !h.is_finished()).count()
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
