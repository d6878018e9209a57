//! Configuration for the interactions server.

#[path = "config_tests.rs"]
mod config_tests;

use std::env::VarError;
use std::time::Duration;

use ed25519_dalek::VerifyingKey;

use crate::context::Bindings;
use crate::nats::NatsConfig;
use crate::signature::{PublicKeyError, parse_public_key};

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_KV_BUCKET: &str = "interaction_state";
/// Matches the lifetime of an interaction token.
const DEFAULT_STATE_TTL_SECS: u64 = 15 * 60;

pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;
}

/// Reads the process environment.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

/// Won't touch the global process environment.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct InMemoryEnv {
    vars: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.lock().unwrap().insert(key.into(), value.into());
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ReadEnv for InMemoryEnv {
    fn var(&self, key: &str) -> Result<String, VarError> {
        self.vars
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(VarError::NotPresent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Production => "production",
        }
    }
}

/// Where routing state for managed components and modals lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Nats,
    /// Process-local; state is lost on restart. Local development only.
    Memory,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("DISCORD_PUBLIC_KEY is invalid: {0}")]
    InvalidPublicKey(#[source] PublicKeyError),
}

/// Configuration for the interactions server.
///
/// Resolved from environment variables:
/// - `DISCORD_APPLICATION_ID` (required)
/// - `DISCORD_PUBLIC_KEY`: hex Ed25519 key from the developer portal (required)
/// - `DISCORD_TOKEN`: bot token handed to handlers
/// - `ENVIRONMENT`: `dev` or `production` (default: `production`)
/// - `DEVELOPMENT_SERVER_ID`, `SITE_ORIGIN`: handed to handlers
/// - `INTERACTIONS_PORT`: HTTP listening port (default: 8787)
/// - `INTERACTIONS_STORE`: `nats` or `memory` (default: `nats`)
/// - `INTERACTIONS_KV_BUCKET`: KV bucket for routing state (default: `interaction_state`)
/// - `INTERACTIONS_STATE_TTL_SECS`: routing state lifetime (default: 900)
/// - Standard `NATS_*` variables for the NATS connection
#[derive(Debug, Clone)]
pub struct InteractionsConfig {
    pub application_id: String,
    pub public_key: VerifyingKey,
    pub bot_token: Option<String>,
    pub environment: Environment,
    pub development_guild_id: Option<String>,
    pub site_origin: Option<String>,
    pub port: u16,
    pub store: StoreBackend,
    pub kv_bucket: String,
    pub state_ttl: Duration,
    pub nats: NatsConfig,
}

impl InteractionsConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, ConfigError> {
        let application_id = non_empty(env, "DISCORD_APPLICATION_ID")
            .ok_or(ConfigError::Missing("DISCORD_APPLICATION_ID"))?;
        let public_key = non_empty(env, "DISCORD_PUBLIC_KEY")
            .ok_or(ConfigError::Missing("DISCORD_PUBLIC_KEY"))?;
        let public_key = parse_public_key(&public_key).map_err(ConfigError::InvalidPublicKey)?;

        let environment = match env.var("ENVIRONMENT").unwrap_or_default().to_lowercase().as_str() {
            "dev" | "development" => Environment::Dev,
            _ => Environment::Production,
        };

        let store = match env
            .var("INTERACTIONS_STORE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Nats,
        };

        Ok(Self {
            application_id,
            public_key,
            bot_token: non_empty(env, "DISCORD_TOKEN"),
            environment,
            development_guild_id: non_empty(env, "DEVELOPMENT_SERVER_ID"),
            site_origin: non_empty(env, "SITE_ORIGIN"),
            port: env
                .var("INTERACTIONS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            store,
            kv_bucket: env
                .var("INTERACTIONS_KV_BUCKET")
                .unwrap_or_else(|_| DEFAULT_KV_BUCKET.to_string()),
            state_ttl: Duration::from_secs(
                env.var("INTERACTIONS_STATE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_STATE_TTL_SECS),
            ),
            nats: NatsConfig::from_env(env),
        })
    }

    /// Values handed to every handler through its context.
    pub fn bindings(&self) -> Bindings {
        Bindings {
            application_id: self.application_id.clone(),
            environment: self.environment,
            bot_token: self.bot_token.clone(),
            development_guild_id: self.development_guild_id.clone(),
            site_origin: self.site_origin.clone(),
            state_ttl: self.state_ttl,
        }
    }
}

fn non_empty<E: ReadEnv>(env: &E, key: &str) -> Option<String> {
    env.var(key).ok().filter(|v| !v.trim().is_empty())
}
