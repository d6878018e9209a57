//! What a handler returns and what the router sends back.
//!
//! A handler produces a [`HandlerResult`]: a reply, or a reply plus
//! [`DeferredWork`] that runs after the reply has been written. Deferred work
//! is spawned on [`BackgroundTasks`], which the server drains on shutdown.

use std::future::Future;

use axum::Json;
use axum::response::{IntoResponse, Response};
use discord_types::InteractionResponse;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info_span};

use crate::errors::HandlerError;

/// Work to run after the reply has been sent.
pub struct DeferredWork(BoxFuture<'static, Result<(), HandlerError>>);

impl DeferredWork {
    pub fn new<F>(work: F) -> Self
    where
        F: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self(Box::pin(work))
    }
}

impl std::fmt::Debug for DeferredWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeferredWork")
    }
}

/// Outcome of a successful handler invocation.
#[derive(Debug)]
pub enum HandlerResult {
    Reply(InteractionResponse),
    /// Reply now; the work starts only once the reply is on its way.
    ReplyThen(InteractionResponse, DeferredWork),
}

impl HandlerResult {
    pub fn reply(response: InteractionResponse) -> Self {
        Self::Reply(response)
    }

    pub fn reply_then<F>(response: InteractionResponse, work: F) -> Self
    where
        F: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self::ReplyThen(response, DeferredWork::new(work))
    }

    pub fn into_parts(self) -> (InteractionResponse, Option<DeferredWork>) {
        match self {
            Self::Reply(response) => (response, None),
            Self::ReplyThen(response, work) => (response, Some(work)),
        }
    }
}

impl From<InteractionResponse> for HandlerResult {
    fn from(response: InteractionResponse) -> Self {
        Self::Reply(response)
    }
}

/// Body of the HTTP reply to an interaction.
///
/// Routing misses and handler failures are still answered with `200` and a
/// structured `{"error": ...}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Response(InteractionResponse),
    Error { error: String },
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

impl From<InteractionResponse> for Reply {
    fn from(response: InteractionResponse) -> Self {
        Self::Response(response)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A dispatched interaction: the reply to send, then the work to start.
#[derive(Debug)]
pub struct Dispatched {
    pub reply: Reply,
    pub deferred: Option<DeferredWork>,
}

impl Dispatched {
    pub fn reply(reply: impl Into<Reply>) -> Self {
        Self {
            reply: reply.into(),
            deferred: None,
        }
    }
}

/// Tracks deferred work so shutdown can wait for it.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` to completion in the background. Failures are logged.
    pub fn spawn(&self, work: DeferredWork) -> JoinHandle<()> {
        let span = info_span!("interactions.deferred");
        self.tracker.spawn(
            async move {
                if let Err(e) = work.0.await {
                    error!(error = %e, "Deferred work failed");
                }
            }
            .instrument(span),
        )
    }

    /// Number of deferred units still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stops accepting new work and waits for everything already spawned.
    ///
    /// Work spawned after this is still run; the tracker only uses the close
    /// flag to know when `wait` may return.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discord_types::MessageData;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_error_reply_shape() {
        let json = serde_json::to_value(Reply::error("Unknown component")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Unknown component" }));
    }

    #[test]
    fn test_response_reply_is_transparent() {
        let json = serde_json::to_value(Reply::from(InteractionResponse::pong())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": 1 }));
    }

    #[test]
    fn test_into_parts() {
        let (response, work) = HandlerResult::reply_then(
            InteractionResponse::message(MessageData::content("hi")),
            async { Ok(()) },
        )
        .into_parts();
        assert_eq!(response, InteractionResponse::message(MessageData::content("hi")));
        assert!(work.is_some());

        let (_, work) = HandlerResult::from(InteractionResponse::pong()).into_parts();
        assert!(work.is_none());
    }

    #[tokio::test]
    async fn shutdown_waits_for_deferred_work() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(DeferredWork::new(async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        tasks.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn failed_work_does_not_poison_tracker() {
        let tasks = BackgroundTasks::new();
        tasks
            .spawn(DeferredWork::new(async {
                Err(HandlerError::other("follow-up failed"))
            }))
            .await
            .unwrap();
        tasks.shutdown().await;
        assert_eq!(tasks.len(), 0);
    }
}
