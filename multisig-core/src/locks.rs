//! Per-identity mutual exclusion
//!
//! Approvals for one transaction (or one wallet, depending on
//! [`LockGranularity`](crate::config::LockGranularity)) run one at a time:
//! the read-check-insert-recount sequence must never interleave with another
//! approval of the same transaction.
//!
//! Entries are created on first use and evicted once the last holder or
//! waiter lets go, so the table only holds keys with live contention.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockTable = DashMap<Uuid, Arc<Mutex<()>>>;

/// Table of async mutexes keyed by identity
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<LockTable>,
}

impl KeyedLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: Uuid) -> KeyGuard {
        // The shard guard from `entry` is released before awaiting
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let guard = mutex.lock_owned().await;

        KeyGuard {
            key,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently held or awaited
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is held or awaited
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one key; released on drop
#[derive(Debug)]
pub struct KeyGuard {
    key: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl KeyGuard {
    /// Key held by this guard
    pub fn key(&self) -> Uuid {
        self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself still references the mutex: nobody is waiting
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_guard_evicts_idle_key() {
        let locks = KeyedLocks::new();
        let key = Uuid::now_v7();

        let guard = locks.lock(key).await;
        assert_eq!(guard.key(), key);
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Uuid::now_v7();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(key).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _first = locks.lock(Uuid::now_v7()).await;
        let _second = locks.lock(Uuid::now_v7()).await;
        assert_eq!(locks.len(), 2);
    }
}
