//! Routing state persistence.
//!
//! [`CallbackStore`] is the seam between the dispatcher and wherever routing
//! state lives. [`NatsCallbackStore`] is the production backend;
//! [`MemoryCallbackStore`] keeps everything in process.

mod memory;
mod nats;

pub use memory::MemoryCallbackStore;
pub use nats::{NatsCallbackStore, open_bucket};

use std::future::Future;
use std::time::Duration;

use crate::routing::{RoutingKey, RoutingState};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("KV error: {0}")]
    Kv(String),
    #[error("routing state is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Get, put and delete routing state by key.
///
/// A `get` miss means the token expired or was never managed. `delete` is
/// best-effort from the dispatcher's point of view: its failure is logged and
/// never changes the reply.
pub trait CallbackStore: Send + Sync + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `Ok(None)` for missing and expired entries.
    fn get(
        &self,
        key: &RoutingKey,
    ) -> impl Future<Output = Result<Option<RoutingState>, Self::Error>> + Send;

    /// Stores `state` under `key`; the entry reads as absent once `ttl` has passed.
    fn put(
        &self,
        key: &RoutingKey,
        state: RoutingState,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn delete(&self, key: &RoutingKey) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
