use std::future::Future;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use ed25519_dalek::VerifyingKey;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::dispatch::Dispatcher;
use crate::reply::{BackgroundTasks, Dispatched};
use crate::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::store::CallbackStore;

pub struct AppState<S> {
    pub dispatcher: Dispatcher<S>,
    pub public_key: VerifyingKey,
    pub tasks: BackgroundTasks,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            public_key: self.public_key,
            tasks: self.tasks.clone(),
        }
    }
}

/// `GET /` liveness, `POST /` interactions, `404 Not Found.` for everything else.
pub fn router<S: CallbackStore>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            "/",
            get(liveness::<S>)
                .post(handle_interaction::<S>)
                .fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
}

/// Serves until `shutdown` resolves, then waits for outstanding deferred work.
pub async fn serve<S, F>(listener: TcpListener, state: AppState<S>, shutdown: F) -> std::io::Result<()>
where
    S: CallbackStore,
    F: Future<Output = ()> + Send + 'static,
{
    let tasks = state.tasks.clone();
    info!(addr = ?listener.local_addr().ok(), "Interactions server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(pending = tasks.len(), "Server stopped; draining deferred work");
    tasks.shutdown().await;
    info!("Deferred work drained");
    Ok(())
}

async fn liveness<S: CallbackStore>(State(state): State<AppState<S>>) -> String {
    format!("👋 {}", state.dispatcher.bindings().application_id)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found.")
}

#[instrument(name = "interactions.http", skip_all)]
async fn handle_interaction<S: CallbackStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    // Nothing about the body is looked at before this passes.
    if !signature::verify(
        &state.public_key,
        &body,
        header(SIGNATURE_HEADER),
        header(TIMESTAMP_HEADER),
    ) {
        warn!("Invalid interaction signature");
        return (StatusCode::UNAUTHORIZED, "Bad request signature.").into_response();
    }

    match state.dispatcher.dispatch(&body).await {
        Ok(Dispatched { reply, deferred }) => {
            // Materialise the reply before any deferred work can start.
            let response = reply.into_response();
            if let Some(work) = deferred {
                state.tasks.spawn(work);
            }
            response
        }
        Err(e) => {
            warn!(error = %e, "Verified body is not an interaction");
            (StatusCode::BAD_REQUEST, "Bad request.").into_response()
        }
    }
}
