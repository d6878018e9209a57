//! # discord-interactions
//!
//! Receiver and router for Discord HTTP interactions.
//!
//! ## How it works
//!
//! 1. Discord sends `POST /` with `X-Signature-Ed25519` and
//!    `X-Signature-Timestamp` headers plus a JSON interaction.
//! 2. The server checks the Ed25519 signature over `timestamp ++ body`
//!    against `DISCORD_PUBLIC_KEY`; failures get `401 Bad request signature.`
//! 3. The body is classified (ping, command, autocomplete, component, modal).
//! 4. Commands are routed by `(type, name, qualified path)`, where the path is
//!    the subcommand group and subcommand joined by a space, or `BASE`.
//! 5. Components and modals with a `t_` custom id are routed through state in
//!    a NATS KV bucket (`component-{type}-{id}` / `modal-{id}`) naming the
//!    handler family; one-shot entries are deleted after a successful run.
//! 6. The handler's reply is written back; any deferred work it returned is
//!    started after that and drained on shutdown.
//!
//! ## Configuration (env vars)
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `DISCORD_APPLICATION_ID` | — | Application id (required) |
//! | `DISCORD_PUBLIC_KEY` | — | Hex Ed25519 public key (required) |
//! | `DISCORD_TOKEN` | — | Bot token handed to handlers |
//! | `ENVIRONMENT` | `production` | `dev` or `production` |
//! | `DEVELOPMENT_SERVER_ID` | — | Development guild id handed to handlers |
//! | `SITE_ORIGIN` | — | Web origin handed to handlers |
//! | `INTERACTIONS_PORT` | `8787` | HTTP listening port |
//! | `INTERACTIONS_STORE` | `nats` | `nats` or `memory` |
//! | `INTERACTIONS_KV_BUCKET` | `interaction_state` | KV bucket for routing state |
//! | `INTERACTIONS_STATE_TTL_SECS` | `900` | Routing state lifetime (seconds) |
//! | `NATS_URL` | `localhost:4222` | NATS server URL(s) |

pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod nats;
pub mod path;
pub mod registry;
pub mod reply;
pub mod routing;
pub mod server;
pub mod signature;
pub mod store;

pub use config::InteractionsConfig;
pub use context::{Bindings, InteractionContext};
pub use dispatch::Dispatcher;
pub use errors::{ErrorTranslator, HandlerError};
pub use registry::HandlerRegistry;
pub use reply::{BackgroundTasks, HandlerResult};
pub use server::{AppState, router, serve};
pub use store::{CallbackStore, MemoryCallbackStore, NatsCallbackStore};
