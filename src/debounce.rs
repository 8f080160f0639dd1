//! Keyed debouncing on the tokio timer.
//!
//! Scheduling a key replaces whatever was pending for that key, so an item
//! only fires after its interval has passed without being rescheduled.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct Debouncer<K> {
    interval: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// (Re)starts the quiet period for `key`.
    pub fn schedule(&mut self, key: K) {
        self.pending.insert(key, Instant::now() + self.interval);
    }

    /// Drops the pending item for `key`. Returns whether one existed.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waits for the earliest pending item and removes it.
    ///
    /// Cancel safe: dropping the future leaves every item pending. With
    /// nothing pending the future never completes.
    pub async fn next(&mut self) -> K {
        let earliest = self.pending
            .iter()
            .min_by_key(|(_, deadline)| **deadline)
            .map(|(key, deadline)| (key.clone(), *deadline));
        let Some((key, deadline)) = earliest else {
            return std::future::pending().await;
        };
        sleep_until(deadline).await;
        self.pending.remove(&key);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_millis(250));
        let start = Instant::now();
        debouncer.schedule("regen");

        assert_eq!(debouncer.next().await, "regen");
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert!(start.elapsed() < Duration::from_millis(260));
        assert!(debouncer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_resets_timer() {
        let mut debouncer = Debouncer::new(Duration::from_millis(250));
        let start = Instant::now();
        debouncer.schedule("regen");
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule("regen");

        assert_eq!(debouncer.next().await, "regen");
        assert!(start.elapsed() >= Duration::from_millis(450));
        assert!(start.elapsed() < Duration::from_millis(460));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_independent_keys() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule("a");
        tokio::time::sleep(Duration::from_millis(10)).await;
        debouncer.schedule("b");
        assert!(debouncer.cancel(&"a"));
        assert!(!debouncer.cancel(&"a"));
        assert!(debouncer.is_pending(&"b"));

        assert_eq!(debouncer.next().await, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_keeps_item() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule(1u8);
        let timed_out = tokio::time::timeout(Duration::from_millis(50), debouncer.next()).await;
        assert!(timed_out.is_err());
        assert!(debouncer.is_pending(&1));
        assert_eq!(debouncer.next().await, 1);
    }
}
