//! Retry-limited tracking of resources that keep failing to load.
//!
//! Each key that fails a fetch gets an entry counting attempts and the time
//! of the last one. Once the attempt count reaches the configured limit the
//! resource is *unavailable* and callers should stop requesting it; after a
//! cooldown the tracker answers "not absent" for exactly one more attempt
//! without clearing the counter. Only a successful fetch removes the entry.
//!
//! # State machine
//!
//! ```text
//! (no entry) --failure--> counting --failure x limit--> unavailable
//! counting/unavailable --success--> (no entry)
//! unavailable --cooldown elapsed--> still unavailable, but is_absent()
//!                                   reports false until the next failure
//! ```
//!
//! # Thread safety
//!
//! Fetch workers race against each other and against the render thread.
//! The registry is a `DashMap`; per-key transitions use compare-and-set on
//! the attempt counter, so the became-unavailable event fires exactly once
//! per crossing no matter how many workers report failures concurrently.

use crate::config::RetrySettings;
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond clock, injectable for tests.
pub type MillisClock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock milliseconds since the Unix epoch.
fn system_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Receives availability transitions for tracked resources.
///
/// Both callbacks fire at most once per crossing: `resource_unavailable`
/// when the attempt count first reaches the limit, `resource_available`
/// when a success removes an existing entry.
pub trait AbsentListener<K>: Send + Sync {
    fn resource_unavailable(&self, key: &K);
    fn resource_available(&self, key: &K);
}

/// Per-resource failure record.
///
/// `attempts` only moves forward under CAS while below the limit; at or
/// past the limit further failures refresh `last_attempt_ms` only.
struct AbsentEntry {
    attempts: AtomicU32,
    last_attempt_ms: AtomicI64,
}

impl AbsentEntry {
    fn new(now_ms: i64) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            last_attempt_ms: AtomicI64::new(now_ms),
        }
    }
}

/// Retry limiter over a set of resource keys.
///
/// # Example
///
/// ```
/// use geopyramid::absent::AbsentTracker;
/// use geopyramid::config::RetrySettings;
/// use std::time::Duration;
///
/// let retry = RetrySettings::default()
///     .with_attempt_limit(3)
///     .with_try_again_interval(Duration::from_secs(60));
/// let tracker: AbsentTracker<String> = AbsentTracker::new(retry);
///
/// let key = "level0/4/7".to_string();
/// for _ in 0..3 {
///     tracker.record_failure(&key);
/// }
/// assert!(tracker.is_unavailable(&key));
/// assert!(tracker.is_absent(&key));
///
/// tracker.mark_available(&key);
/// assert!(!tracker.is_absent(&key));
/// ```
pub struct AbsentTracker<K: Eq + Hash + Clone> {
    attempt_limit: u32,
    try_again_interval_ms: i64,
    entries: DashMap<K, Arc<AbsentEntry>>,
    listener: Option<Arc<dyn AbsentListener<K>>>,
    clock: MillisClock,
}

impl<K: Eq + Hash + Clone + fmt::Display> AbsentTracker<K> {
    /// Create a tracker with the given retry settings and the system clock.
    ///
    /// An attempt limit of zero is raised to one; a limit below one would
    /// make every resource unavailable before its first attempt.
    pub fn new(retry: RetrySettings) -> Self {
        Self {
            attempt_limit: retry.attempt_limit.max(1),
            try_again_interval_ms: retry.try_again_interval.as_millis() as i64,
            entries: DashMap::new(),
            listener: None,
            clock: Arc::new(system_millis),
        }
    }

    /// Attach a transition listener.
    pub fn with_listener(mut self, listener: Arc<dyn AbsentListener<K>>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the clock. Intended for tests.
    pub fn with_clock(mut self, clock: MillisClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn attempt_limit(&self) -> u32 {
        self.attempt_limit
    }

    /// Record one failed fetch attempt for a key.
    ///
    /// Creates the entry on first failure. While below the limit the count
    /// is incremented with CAS; the thread whose increment reaches the
    /// limit fires the became-unavailable transition. Entries already at
    /// the limit only have their timestamp refreshed.
    pub fn record_failure(&self, key: &K) {
        let now = (self.clock)();
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AbsentEntry::new(now)))
            .value()
            .clone();

        loop {
            let attempts = entry.attempts.load(Ordering::Acquire);
            if attempts >= self.attempt_limit {
                entry.last_attempt_ms.store(now, Ordering::Release);
                return;
            }
            if entry
                .attempts
                .compare_exchange(attempts, attempts + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                entry.last_attempt_ms.store(now, Ordering::Release);
                if attempts + 1 == self.attempt_limit {
                    tracing::info!(
                        key = %key,
                        attempts = attempts + 1,
                        "Resource marked unavailable after repeated failures"
                    );
                    if let Some(listener) = &self.listener {
                        listener.resource_unavailable(key);
                    }
                }
                return;
            }
        }
    }

    /// Record a successful fetch: remove the key's entry entirely.
    ///
    /// Absence of an entry means "assumed available", so this is a logical
    /// un-marking, not a counter reset. Fires the became-available
    /// transition if an entry existed.
    pub fn mark_available(&self, key: &K) {
        if self.entries.remove(key).is_some() {
            tracing::debug!(key = %key, "Resource available again, failure record cleared");
            if let Some(listener) = &self.listener {
                listener.resource_available(key);
            }
        }
    }

    /// Whether the key has accumulated enough failures to be unavailable.
    pub fn is_unavailable(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|e| e.attempts.load(Ordering::Acquire) >= self.attempt_limit)
            .unwrap_or(false)
    }

    /// Whether the cooldown since the last attempt has elapsed.
    ///
    /// Keys with no failure record are always eligible.
    pub fn is_time_to_try_again(&self, key: &K) -> bool {
        match self.entries.get(key) {
            None => true,
            Some(e) => {
                let last = e.last_attempt_ms.load(Ordering::Acquire);
                (self.clock)() - last >= self.try_again_interval_ms
            }
        }
    }

    /// Whether callers should skip this resource right now.
    ///
    /// True only while the key is unavailable *and* inside the cooldown.
    /// An elapsed cooldown answers false (eligible for one more attempt)
    /// without touching the counter; if that attempt fails too, the key is
    /// immediately absent again.
    pub fn is_absent(&self, key: &K) -> bool {
        match self.entries.get(key) {
            None => false,
            Some(e) => {
                let attempts = e.attempts.load(Ordering::Acquire);
                if attempts < self.attempt_limit {
                    return false;
                }
                let last = e.last_attempt_ms.load(Ordering::Acquire);
                (self.clock)() - last < self.try_again_interval_ms
            }
        }
    }

    /// Number of keys with a failure record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all failure records.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + Clone> fmt::Debug for AbsentTracker<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsentTracker")
            .field("attempt_limit", &self.attempt_limit)
            .field("try_again_interval_ms", &self.try_again_interval_ms)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Clock driven by an atomic, so tests control elapsed time exactly.
    fn test_clock() -> (MillisClock, Arc<AtomicI64>) {
        let now = Arc::new(AtomicI64::new(0));
        let handle = Arc::clone(&now);
        let clock: MillisClock = Arc::new(move || handle.load(Ordering::SeqCst));
        (clock, now)
    }

    fn tracker(limit: u32, interval_ms: u64) -> (AbsentTracker<String>, Arc<AtomicI64>) {
        let (clock, now) = test_clock();
        let retry = RetrySettings::default()
            .with_attempt_limit(limit)
            .with_try_again_interval(Duration::from_millis(interval_ms));
        (AbsentTracker::new(retry).with_clock(clock), now)
    }

    #[derive(Default)]
    struct CountingListener {
        unavailable: AtomicUsize,
        available: AtomicUsize,
    }

    impl AbsentListener<String> for CountingListener {
        fn resource_unavailable(&self, _key: &String) {
            self.unavailable.fetch_add(1, Ordering::SeqCst);
        }

        fn resource_available(&self, _key: &String) {
            self.available.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_no_entry_is_not_absent() {
        let (t, _) = tracker(7, 60_000);
        let key = "k".to_string();
        assert!(!t.is_absent(&key));
        assert!(!t.is_unavailable(&key));
        assert!(t.is_time_to_try_again(&key));
        assert!(t.is_empty());
    }

    #[test]
    fn test_unavailable_after_exactly_limit_failures() {
        let (t, _) = tracker(7, 60_000);
        let key = "k".to_string();
        for _ in 0..6 {
            t.record_failure(&key);
            assert!(!t.is_unavailable(&key));
            assert!(!t.is_absent(&key));
        }
        t.record_failure(&key);
        assert!(t.is_unavailable(&key));
        assert!(t.is_absent(&key));
    }

    #[test]
    fn test_attempt_limit_one_trips_immediately() {
        let (t, _) = tracker(1, 60_000);
        let key = "k".to_string();
        t.record_failure(&key);
        assert!(t.is_unavailable(&key));
        assert!(t.is_absent(&key));
    }

    #[test]
    fn test_success_removes_entry() {
        let (t, _) = tracker(3, 60_000);
        let key = "k".to_string();
        for _ in 0..3 {
            t.record_failure(&key);
        }
        assert!(t.is_unavailable(&key));
        assert_eq!(t.len(), 1);

        t.mark_available(&key);
        assert!(!t.is_unavailable(&key));
        assert!(!t.is_absent(&key));
        assert!(t.is_empty());
    }

    #[test]
    fn test_unavailable_event_fires_exactly_once() {
        let (clock, _) = test_clock();
        let listener = Arc::new(CountingListener::default());
        let retry = RetrySettings::default().with_attempt_limit(3);
        let t = AbsentTracker::new(retry)
            .with_clock(clock)
            .with_listener(Arc::clone(&listener) as Arc<dyn AbsentListener<String>>);

        let key = "k".to_string();
        for _ in 0..10 {
            t.record_failure(&key);
        }
        assert_eq!(listener.unavailable.load(Ordering::SeqCst), 1);
        assert_eq!(listener.available.load(Ordering::SeqCst), 0);

        t.mark_available(&key);
        assert_eq!(listener.available.load(Ordering::SeqCst), 1);

        // No entry left, so a second success fires nothing.
        t.mark_available(&key);
        assert_eq!(listener.available.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cooldown_suppresses_absent_without_reset() {
        let (t, now) = tracker(2, 1_000);
        let key = "k".to_string();
        t.record_failure(&key);
        t.record_failure(&key);
        assert!(t.is_absent(&key));
        assert!(!t.is_time_to_try_again(&key));

        // Cooldown elapses: eligible for one more attempt, counter intact.
        now.store(1_000, Ordering::SeqCst);
        assert!(t.is_time_to_try_again(&key));
        assert!(!t.is_absent(&key));
        assert!(t.is_unavailable(&key), "counter must not reset on elapsed time");

        // The retry fails: absent is re-asserted immediately.
        t.record_failure(&key);
        assert!(t.is_absent(&key));
    }

    #[test]
    fn test_failures_past_limit_refresh_timestamp_only() {
        let (clock, now) = test_clock();
        let listener = Arc::new(CountingListener::default());
        let retry = RetrySettings::default()
            .with_attempt_limit(2)
            .with_try_again_interval(Duration::from_millis(1_000));
        let t = AbsentTracker::new(retry)
            .with_clock(clock)
            .with_listener(Arc::clone(&listener) as Arc<dyn AbsentListener<String>>);

        let key = "k".to_string();
        t.record_failure(&key);
        t.record_failure(&key);
        now.store(500, Ordering::SeqCst);
        t.record_failure(&key);
        assert_eq!(listener.unavailable.load(Ordering::SeqCst), 1);

        // Timestamp moved to 500, so the cooldown now runs to 1500.
        now.store(1_400, Ordering::SeqCst);
        assert!(t.is_absent(&key));
        now.store(1_500, Ordering::SeqCst);
        assert!(!t.is_absent(&key));
    }

    #[test]
    fn test_zero_attempt_limit_treated_as_one() {
        let retry = RetrySettings::default().with_attempt_limit(0);
        let t: AbsentTracker<String> = AbsentTracker::new(retry);
        assert_eq!(t.attempt_limit(), 1);
    }

    #[test]
    fn test_clear() {
        let (t, _) = tracker(1, 60_000);
        t.record_failure(&"a".to_string());
        t.record_failure(&"b".to_string());
        assert_eq!(t.len(), 2);
        t.clear();
        assert!(t.is_empty());
        assert!(!t.is_absent(&"a".to_string()));
    }

    #[test]
    fn test_concurrent_failures_fire_single_event() {
        let listener = Arc::new(CountingListener::default());
        let retry = RetrySettings::default().with_attempt_limit(16);
        let t = Arc::new(
            AbsentTracker::new(retry)
                .with_listener(Arc::clone(&listener) as Arc<dyn AbsentListener<String>>),
        );

        let mut handles = vec![];
        for _ in 0..8 {
            let t = Arc::clone(&t);
            handles.push(std::thread::spawn(move || {
                let key = "contended".to_string();
                for _ in 0..100 {
                    t.record_failure(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let key = "contended".to_string();
        assert!(t.is_unavailable(&key));
        assert_eq!(
            listener.unavailable.load(Ordering::SeqCst),
            1,
            "transition must fire exactly once across 800 concurrent failures"
        );
    }
}
