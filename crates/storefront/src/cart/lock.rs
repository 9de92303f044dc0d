//! Per-owner serialization of cart read-modify-write cycles.
//!
//! Two concurrent requests from the same session would otherwise both load
//! the snapshot, merge, and save, and the later save would drop the earlier
//! line. Holding the owner's lock across the whole cycle makes them queue.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle time after which an owner's lock is forgotten.
const DEFAULT_IDLE: Duration = Duration::from_secs(15 * 60);

/// One async mutex per cart owner (session ID), created on demand.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl CartLocks {
    /// Create a lock table whose entries expire after `idle` without use.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder().time_to_idle(idle).build(),
        }
    }

    /// Wait for exclusive access to `owner`'s cart.
    pub async fn acquire(&self, owner: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(owner.to_owned(), async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for CartLocks {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_same_owner_is_serialized() {
        let locks = CartLocks::default();
        let guard = locks.acquire("session-a").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("session-a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_owners_do_not_block() {
        let locks = CartLocks::default();
        let _a = locks.acquire("session-a").await;

        let result =
            tokio::time::timeout(Duration::from_secs(1), locks.acquire("session-b")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let locks = CartLocks::default();
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let locks = locks.clone();
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let _guard = locks.acquire("shared").await;
                    let seen = counter.load(Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    counter.store(seen + 1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }
}
