use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_nats::jetstream::{self, kv};
use tracing::{debug, info, warn};

use super::{CallbackStore, StoreError};
use crate::routing::{RoutingKey, RoutingState};

/// Opens the routing state bucket, creating it if missing.
///
/// `max_age` is the bucket-wide expiry; entries written with a shorter TTL
/// are also filtered on read through their `expiresAt` field. An existing
/// bucket keeps its own `max_age`, which is checked against `max_age` here.
pub async fn open_bucket(
    js: &jetstream::Context,
    bucket: &str,
    max_age: Duration,
) -> Result<kv::Store, StoreError> {
    let config = kv::Config {
        bucket: bucket.to_string(),
        history: 1,
        max_age,
        ..Default::default()
    };
    let store = match js.create_key_value(config).await {
        Ok(store) => store,
        Err(create_error) => match js.get_key_value(bucket).await {
            Ok(store) => {
                debug!(bucket, error = %create_error, "Bucket not created, opened existing one");
                store
            }
            Err(open_error) => {
                return Err(StoreError::Kv(format!(
                    "cannot create bucket {bucket} ({create_error}) or open it ({open_error})"
                )));
            }
        },
    };

    match store.status().await {
        Ok(status) => {
            if let Some(problem) = retention_problem(status.max_age(), max_age) {
                warn!(
                    bucket,
                    bucket_max_age_secs = status.max_age().as_secs(),
                    state_ttl_secs = max_age.as_secs(),
                    "{problem}"
                );
            }
        }
        Err(e) => warn!(bucket, error = %e, "Could not read bucket status"),
    }

    info!(bucket, max_age_secs = max_age.as_secs(), "Routing state bucket ready");
    Ok(store)
}

/// Why a bucket's `max_age` does not fit the routing state TTL, if it doesn't.
///
/// A zero `max_age` means the bucket never expires entries.
fn retention_problem(bucket_max_age: Duration, ttl: Duration) -> Option<&'static str> {
    if bucket_max_age.is_zero() {
        Some("Bucket has no max_age; expired routing state is filtered but never removed")
    } else if bucket_max_age < ttl {
        Some("Bucket max_age is shorter than the routing state TTL; state will vanish early")
    } else if bucket_max_age > ttl {
        Some("Bucket max_age is longer than the routing state TTL; expired state lingers")
    } else {
        None
    }
}

/// [`CallbackStore`] backed by a NATS JetStream KV bucket.
#[derive(Clone)]
pub struct NatsCallbackStore {
    store: kv::Store,
}

impl NatsCallbackStore {
    pub fn new(store: kv::Store) -> Self {
        Self { store }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl CallbackStore for NatsCallbackStore {
    type Error = StoreError;

    async fn get(&self, key: &RoutingKey) -> Result<Option<RoutingState>, StoreError> {
        let Some(raw) = self
            .store
            .get(key.to_string())
            .await
            .map_err(|e| StoreError::Kv(e.to_string()))?
        else {
            return Ok(None);
        };

        let state: RoutingState = serde_json::from_slice(&raw)?;
        if state.expires_at.is_some_and(|at| at <= unix_now()) {
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn put(
        &self,
        key: &RoutingKey,
        mut state: RoutingState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        state.expires_at = Some(unix_now() + ttl.as_secs());
        let payload = serde_json::to_vec(&state)?;
        self.store
            .put(key.to_string(), payload.into())
            .await
            .map_err(|e| StoreError::Kv(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &RoutingKey) -> Result<(), StoreError> {
        self.store
            .delete(key.to_string())
            .await
            .map_err(|e| StoreError::Kv(e.to_string()))
    }
}
