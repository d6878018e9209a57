//! In-memory [`CallbackStore`] backed by `Arc<Mutex<HashMap>>`.
//!
//! Suitable for tests and local development. State does not survive a
//! restart and is not shared between processes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{CallbackStore, StoreError};
use crate::routing::{RoutingKey, RoutingState};

struct Entry {
    state: RoutingState,
    deadline: Instant,
}

/// Thread-safe in-memory routing state.
///
/// Deadlines use the tokio clock, so paused-time tests can expire entries
/// with `tokio::time::advance`.
#[derive(Clone, Default)]
pub struct MemoryCallbackStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    reads: Arc<AtomicUsize>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryCallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry without `await`. Expired entries are purged first.
    pub fn insert(&self, key: &RoutingKey, state: RoutingState, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| entry.deadline > now);
        entries.insert(
            key.to_string(),
            Entry {
                state,
                deadline: now + ttl,
            },
        );
    }

    /// Whether a live entry exists, without counting as a read.
    pub fn contains(&self, key: &RoutingKey) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(&key.to_string())
            .is_some_and(|entry| entry.deadline > Instant::now())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Number of `get` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `delete` fail, leaving the entry in place.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl CallbackStore for MemoryCallbackStore {
    type Error = StoreError;

    async fn get(&self, key: &RoutingKey) -> Result<Option<RoutingState>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        let key = key.to_string();
        match entries.get(&key) {
            Some(entry) if entry.deadline > Instant::now() => Ok(Some(entry.state.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &RoutingKey,
        state: RoutingState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.insert(key, state, ttl);
        Ok(())
    }

    async fn delete(&self, key: &RoutingKey) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Kv(format!("delete of {key} rejected")));
        }
        self.entries.lock().unwrap().remove(&key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RoutingToken;

    const TTL: Duration = Duration::from_secs(900);

    fn key() -> RoutingKey {
        RoutingKey::component(2, RoutingToken::generate())
    }

    #[tokio::test]
    async fn put_then_get_returns_state() {
        let store = MemoryCallbackStore::new();
        let key = key();
        let state = RoutingState::new("dismiss").once();
        store.put(&key, state.clone(), TTL).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(state));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn get_unknown_key_returns_none() {
        let store = MemoryCallbackStore::new();
        assert_eq!(store.get(&key()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn component_type_is_part_of_the_key() {
        let store = MemoryCallbackStore::new();
        let token = RoutingToken::generate();
        store
            .put(&RoutingKey::component(2, token.clone()), RoutingState::new("a"), TTL)
            .await
            .unwrap();
        assert_eq!(
            store.get(&RoutingKey::component(3, token.clone())).await.unwrap(),
            None
        );
        assert_eq!(store.get(&RoutingKey::modal(token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn repeated_gets_return_the_same_state() {
        let store = MemoryCallbackStore::new();
        let key = key();
        store.insert(&key, RoutingState::new("edit"), TTL);
        let first = store.get(&key).await.unwrap();
        let second = store.get(&key).await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = MemoryCallbackStore::new();
        let key = key();
        store.insert(&key, RoutingState::new("edit"), TTL);
        store.delete(&key).await.unwrap();
        assert!(!store.contains(&key));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failing_delete_keeps_entry() {
        let store = MemoryCallbackStore::new();
        let key = key();
        store.insert(&key, RoutingState::new("edit"), TTL);
        store.fail_deletes(true);
        assert!(store.delete(&key).await.is_err());
        assert!(store.contains(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCallbackStore::new();
        let key = key();
        store
            .put(&key, RoutingState::new("edit"), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get(&key).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn put_purges_unread_expired_entries() {
        let store = MemoryCallbackStore::new();
        for _ in 0..100 {
            store
                .put(&key(), RoutingState::new("dismiss").once(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        let live = key();
        store
            .put(&live, RoutingState::new("edit"), Duration::from_secs(7200))
            .await
            .unwrap();
        assert_eq!(store.len(), 101);

        tokio::time::advance(Duration::from_secs(3600)).await;
        store
            .put(&key(), RoutingState::new("dismiss"), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.contains(&live));
    }
}
