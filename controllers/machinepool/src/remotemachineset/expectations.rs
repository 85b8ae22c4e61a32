//! In-memory expectations of pending lease creations.
//!
//! A lease created in one reconcile is not guaranteed to show up in the next
//! list. Until it does, the pool's expectation stays unsatisfied and the
//! allocator will not issue another create for that pool. Entries expire
//! after a TTL so a create whose watch event was lost never blocks a pool
//! forever. Nothing here is persisted: after a restart the lease list is the
//! only source of truth.
//!
//! One tracker is built per process and shared by reference with every
//! actuator. Entries are keyed by `namespace/name` of the pool and each
//! per-key operation is atomic; operations on different keys do not contend
//! on a shared lock.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long an unobserved expectation blocks its key.
pub const EXPECTATIONS_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Pending creations for one key
#[derive(Debug, Clone)]
pub struct ExpectationEntry {
    add: i64,
    created: Instant,
}

impl ExpectationEntry {
    fn fulfilled(&self) -> bool {
        self.add <= 0
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() >= ttl
    }
}

/// Process-wide record of creations a pool is waiting to observe
#[derive(Debug)]
pub struct ExpectationTracker {
    entries: DashMap<String, ExpectationEntry>,
    ttl: Duration,
}

impl Default for ExpectationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpectationTracker {
    /// Tracker with the default five minute TTL
    pub fn new() -> Self {
        Self::with_ttl(EXPECTATIONS_TIMEOUT)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record that `adds` creations are expected for `key`, replacing any
    /// previous expectation.
    pub fn expect_creations(&self, key: &str, adds: i64) {
        debug!("Setting expectations for {} (add: {})", key, adds);
        self.entries.insert(
            key.to_string(),
            ExpectationEntry {
                add: adds,
                created: Instant::now(),
            },
        );
    }

    /// A creation for `key` was observed.
    pub fn creation_observed(&self, key: &str) {
        self.lower_expectations(key, 1);
    }

    /// Drop every expectation for `key`.
    pub fn delete_expectations(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            debug!("Deleted expectations for {}", key);
        }
    }

    /// True when `key` has nothing outstanding: no entry, every expected
    /// event observed, or the entry outlived the TTL.
    pub fn satisfied_expectations(&self, key: &str) -> bool {
        if self.entries.remove_if(key, |_, e| e.expired(self.ttl)).is_some() {
            debug!("Expectations for {} expired", key);
            return true;
        }
        match self.entries.get(key) {
            Some(entry) => {
                let fulfilled = entry.fulfilled();
                if !fulfilled {
                    debug!("Expectations for {} not yet met (add: {})", key, entry.add);
                }
                fulfilled
            }
            None => true,
        }
    }

    /// Outstanding creations for `key`, if any are recorded
    pub fn get_expectations(&self, key: &str) -> Option<i64> {
        self.entries.get(key).map(|e| e.add)
    }

    fn lower_expectations(&self, key: &str, add: i64) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.add -= add;
            debug!("Lowered expectations for {} (add: {})", key, entry.add);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_key_is_satisfied() {
        let tracker = ExpectationTracker::new();
        assert!(tracker.satisfied_expectations("ns/pool"));
        assert_eq!(tracker.get_expectations("ns/pool"), None);
    }

    #[test]
    fn test_expect_creation_then_observe() {
        let tracker = ExpectationTracker::new();
        tracker.expect_creations("ns/pool", 1);
        assert!(!tracker.satisfied_expectations("ns/pool"));

        tracker.creation_observed("ns/pool");
        assert!(tracker.satisfied_expectations("ns/pool"));
        assert_eq!(tracker.get_expectations("ns/pool"), Some(0));
    }

    #[test]
    fn test_reregistration_overwrites_count() {
        let tracker = ExpectationTracker::new();
        tracker.expect_creations("ns/pool", 3);
        tracker.expect_creations("ns/pool", 1);
        assert_eq!(tracker.get_expectations("ns/pool"), Some(1));

        tracker.creation_observed("ns/pool");
        assert!(tracker.satisfied_expectations("ns/pool"));
    }

    #[test]
    fn test_delete_clears_expectation() {
        let tracker = ExpectationTracker::new();
        tracker.expect_creations("ns/pool", 1);
        tracker.delete_expectations("ns/pool");
        assert!(tracker.satisfied_expectations("ns/pool"));
        assert_eq!(tracker.get_expectations("ns/pool"), None);
    }

    #[test]
    fn test_expired_expectation_is_satisfied_and_pruned() {
        let tracker = ExpectationTracker::with_ttl(Duration::ZERO);
        tracker.expect_creations("ns/pool", 1);
        assert!(tracker.satisfied_expectations("ns/pool"));
        assert_eq!(tracker.get_expectations("ns/pool"), None);
    }

    #[test]
    fn test_observing_unknown_key_is_noop() {
        let tracker = ExpectationTracker::new();
        tracker.creation_observed("ns/other");
        assert_eq!(tracker.get_expectations("ns/other"), None);
    }

    #[test]
    fn test_concurrent_keys_do_not_interfere() {
        let tracker = Arc::new(ExpectationTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    let key = format!("ns/pool-{}", i);
                    for _ in 0..100 {
                        tracker.expect_creations(&key, 1);
                        tracker.creation_observed(&key);
                    }
                    if i % 2 == 0 {
                        tracker.expect_creations(&key, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            let key = format!("ns/pool-{}", i);
            assert_eq!(tracker.satisfied_expectations(&key), i % 2 != 0, "key {}", key);
        }
    }
}
