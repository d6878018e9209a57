//! NATS KV callback store tests.
//!
//! Run against a local server on port 14222 and skip when none is reachable:
//!
//! ```sh
//! docker run --rm -p 14222:4222 nats:latest -js
//! ```

use std::time::Duration;

use async_nats::jetstream;
use discord_interactions::routing::{RoutingKey, RoutingState, RoutingToken};
use discord_interactions::store::{CallbackStore, NatsCallbackStore, open_bucket};
use serde_json::json;

const NATS_URL: &str = "nats://localhost:14222";
const TTL: Duration = Duration::from_secs(900);

async fn try_store() -> Option<(NatsCallbackStore, async_nats::jetstream::kv::Store)> {
    let client = async_nats::connect(NATS_URL).await.ok()?;
    let js = jetstream::new(client);
    let bucket = format!("test-interactions-{}", uuid::Uuid::new_v4().simple());
    let kv = open_bucket(&js, &bucket, TTL).await.ok()?;
    Some((NatsCallbackStore::new(kv.clone()), kv))
}

fn component_key() -> RoutingKey {
    RoutingKey::component(2, RoutingToken::generate())
}

#[tokio::test]
async fn put_then_get_roundtrips_state() {
    let Some((store, _)) = try_store().await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    let key = component_key();
    let state = RoutingState::new("edit")
        .once()
        .with_payload(&json!({ "flowId": 7 }))
        .unwrap();

    store.put(&key, state.clone(), TTL).await.unwrap();
    let read = store.get(&key).await.unwrap().expect("state");

    assert_eq!(read.routing_family, "edit");
    assert!(read.once);
    assert_eq!(read.payload, state.payload);
    assert!(read.expires_at.is_some());
}

#[tokio::test]
async fn stored_json_uses_wire_field_names() {
    let Some((store, kv)) = try_store().await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    let key = RoutingKey::modal(RoutingToken::generate());
    store
        .put(&key, RoutingState::new("rename"), TTL)
        .await
        .unwrap();

    let raw = kv.get(key.to_string()).await.unwrap().expect("entry");
    let stored: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(stored["componentRoutingId"], "rename");
    assert_eq!(stored["componentOnce"], false);
    assert!(stored["expiresAt"].is_u64());
}

#[tokio::test]
async fn missing_key_is_absent() {
    let Some((store, _)) = try_store().await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    assert!(store.get(&component_key()).await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_key_is_absent() {
    let Some((store, _)) = try_store().await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    let key = component_key();
    store.put(&key, RoutingState::new("dismiss"), TTL).await.unwrap();
    store.delete(&key).await.unwrap();
    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_entry_is_absent() {
    let Some((store, kv)) = try_store().await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    let key = component_key();
    let stale = json!({ "componentRoutingId": "dismiss", "componentOnce": true, "expiresAt": 1u64 });
    kv.put(key.to_string(), serde_json::to_vec(&stale).unwrap().into())
        .await
        .unwrap();

    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn reopening_keeps_the_existing_bucket_max_age() {
    let Ok(client) = async_nats::connect(NATS_URL).await else {
        eprintln!("SKIP: NATS not available");
        return;
    };
    let js = jetstream::new(client);
    let bucket = format!("test-interactions-{}", uuid::Uuid::new_v4().simple());

    let first = open_bucket(&js, &bucket, Duration::from_secs(60)).await.unwrap();
    let reopened = open_bucket(&js, &bucket, TTL).await.unwrap();

    let status = reopened.status().await.unwrap();
    assert_eq!(status.max_age(), Duration::from_secs(60));

    let key = component_key();
    NatsCallbackStore::new(first)
        .put(&key, RoutingState::new("dismiss"), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(NatsCallbackStore::new(reopened).get(&key).await.unwrap().is_some());
}
