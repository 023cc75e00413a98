//! Per-key async mutual exclusion
//!
//! Mutations on one tab (or one `(user, restaurant)` open slot) are
//! serialized; different keys never contend. An entry lives only while
//! someone holds or waits on it: releasing the last guard removes it.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Attempts before giving up with `TabBusy`
const LOCK_ATTEMPTS: u32 = 2;

pub struct LockRegistry<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
    timeout: Duration,
}

/// Held lock for one key, released on drop
pub struct KeyGuard<'a, K: Eq + Hash> {
    registry: &'a LockRegistry<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        // Release before forgetting so our own Arc is not counted
        self.guard.take();
        self.registry.forget(&self.key);
    }
}

impl<K: Eq + Hash> LockRegistry<K> {
    /// Drop the entry for `key` when nobody holds or waits on it
    fn forget(&self, key: &K) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> LockRegistry<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the lock for `key`, waiting at most `timeout` per attempt
    pub async fn acquire(&self, key: &K) -> Result<KeyGuard<'_, K>, AppError> {
        for attempt in 1..=LOCK_ATTEMPTS {
            let mutex = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();

            match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
                Ok(guard) => {
                    return Ok(KeyGuard {
                        registry: self,
                        key: key.clone(),
                        guard: Some(guard),
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        key = ?key,
                        attempt,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Lock acquisition timed out"
                    );
                }
            }
        }

        Err(
            AppError::conflict(ErrorCode::TabBusy, ErrorCode::TabBusy.message())
                .with_detail("key", format!("{:?}", key)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorKind;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let registry = LockRegistry::new(Duration::from_millis(20));
        let _held = registry.acquire(&1i64).await.unwrap();

        let err = registry.acquire(&1i64).await.err().unwrap();
        assert_eq!(err.code, ErrorCode::TabBusy);
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let registry = LockRegistry::new(Duration::from_millis(20));
        let _a = registry.acquire(&1i64).await.unwrap();
        assert!(registry.acquire(&2i64).await.is_ok());
    }

    #[tokio::test]
    async fn test_waiter_gets_lock_after_release() {
        let registry = Arc::new(LockRegistry::new(Duration::from_secs(1)));
        let held = registry.acquire(&(1i64, 2i64)).await.unwrap();

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.acquire(&(1i64, 2i64)).await.is_ok() })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_release_removes_idle_entry() {
        let registry = LockRegistry::new(Duration::from_millis(20));
        let held = registry.acquire(&7i64).await.unwrap();
        assert_eq!(registry.len(), 1);

        drop(held);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_someone_waits() {
        let registry = Arc::new(LockRegistry::new(Duration::from_secs(1)));
        let held = registry.acquire(&7i64).await.unwrap();

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire(&7i64).await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                registry.len()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        // The waiter still saw its entry while holding the lock
        assert_eq!(waiter.await.unwrap(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_waiter_leaves_no_entry() {
        let registry = LockRegistry::new(Duration::from_millis(10));
        let held = registry.acquire(&3i64).await.unwrap();
        assert!(registry.acquire(&3i64).await.is_err());

        drop(held);
        assert!(registry.is_empty());
    }
}
