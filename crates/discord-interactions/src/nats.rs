//! NATS connection settings and connect helper.

use std::path::PathBuf;
use std::time::Duration;

use async_nats::{Client, ConnectOptions, Event};
use tracing::{info, instrument, warn};

use crate::config::ReadEnv;

const DEFAULT_NATS_URL: &str = "localhost:4222";
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// NATS authentication method.
///
/// Resolved from the environment in priority order: `NATS_CREDS`,
/// `NATS_NKEY`, `NATS_USER` + `NATS_PASSWORD`, `NATS_TOKEN`, none.
#[derive(Debug, Clone)]
pub enum NatsAuth {
    Credentials(PathBuf),
    NKey(String),
    UserPassword { user: String, password: String },
    Token(String),
    None,
}

impl NatsAuth {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "credentials file",
            Self::NKey(_) => "NKey",
            Self::UserPassword { .. } => "user/password",
            Self::Token(_) => "token",
            Self::None => "none",
        }
    }

    fn from_env<E: ReadEnv>(env: &E) -> Self {
        if let Ok(path) = env.var("NATS_CREDS") {
            return Self::Credentials(PathBuf::from(path));
        }
        if let Ok(seed) = env.var("NATS_NKEY") {
            return Self::NKey(seed);
        }
        if let (Ok(user), Ok(password)) = (env.var("NATS_USER"), env.var("NATS_PASSWORD")) {
            return Self::UserPassword { user, password };
        }
        if let Ok(token) = env.var("NATS_TOKEN") {
            return Self::Token(token);
        }
        Self::None
    }
}

#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    pub auth: NatsAuth,
}

impl NatsConfig {
    /// `NATS_URL` is a comma-separated server list (default: `localhost:4222`).
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let raw = env
            .var("NATS_URL")
            .unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self {
            servers: raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            auth: NatsAuth::from_env(env),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Failed to load credentials file: {0}")]
    InvalidCredentials(#[source] std::io::Error),
    #[error("Failed to connect to NATS servers {servers:?}: {error}")]
    ConnectionFailed {
        servers: Vec<String>,
        #[source]
        error: async_nats::ConnectError,
    },
}

fn reconnect_delay(attempts: usize) -> Duration {
    let exponent = u32::try_from(attempts).unwrap_or(u32::MAX);
    Duration::from_secs(std::cmp::min(
        MAX_RECONNECT_DELAY.as_secs(),
        2u64.saturating_pow(exponent),
    ))
}

fn log_event(event: &Event) {
    match event {
        Event::Connected => info!("Reconnected to NATS"),
        Event::Disconnected => warn!("Lost NATS connection, retrying"),
        Event::Closed | Event::Draining => info!(event = %event, "NATS connection closing"),
        Event::ServerError(_)
        | Event::ClientError(_)
        | Event::SlowConsumer(_)
        | Event::LameDuckMode => warn!(event = %event, "NATS connection event"),
    }
}

/// Connect to NATS with automatic reconnection and event logging.
#[instrument(name = "nats.connect", skip(config), fields(servers = ?config.servers, auth = %config.auth.description()))]
pub async fn connect(config: &NatsConfig) -> Result<Client, ConnectError> {
    let options = match &config.auth {
        NatsAuth::Credentials(path) => ConnectOptions::with_credentials_file(path.clone())
            .await
            .map_err(ConnectError::InvalidCredentials)?,
        NatsAuth::NKey(seed) => ConnectOptions::with_nkey(seed.clone()),
        NatsAuth::UserPassword { user, password } => {
            ConnectOptions::with_user_and_password(user.clone(), password.clone())
        }
        NatsAuth::Token(token) => ConnectOptions::with_token(token.clone()),
        NatsAuth::None => ConnectOptions::new(),
    };

    let client = options
        .retry_on_initial_connect()
        .connection_timeout(CONNECTION_TIMEOUT)
        .reconnect_delay_callback(reconnect_delay)
        .event_callback(|event| async move { log_event(&event) })
        .connect(&config.servers)
        .await
        .map_err(|error| {
            warn!(error = %error, "Failed to connect to NATS");
            ConnectError::ConnectionFailed {
                servers: config.servers.clone(),
                error,
            }
        })?;

    info!("Connected to NATS");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryEnv;

    #[test]
    fn test_reconnect_delay_backs_off_and_caps() {
        assert_eq!(reconnect_delay(0).as_secs(), 1);
        assert_eq!(reconnect_delay(3).as_secs(), 8);
        assert_eq!(reconnect_delay(5).as_secs(), 30);
        assert_eq!(reconnect_delay(usize::MAX).as_secs(), 30);
    }

    #[test]
    fn test_auth_priority() {
        let env = InMemoryEnv::new();
        env.set("NATS_TOKEN", "tok");
        env.set("NATS_USER", "u");
        env.set("NATS_PASSWORD", "p");
        assert!(matches!(
            NatsAuth::from_env(&env),
            NatsAuth::UserPassword { ref user, .. } if user == "u"
        ));

        env.set("NATS_CREDS", "/etc/nats.creds");
        assert!(matches!(NatsAuth::from_env(&env), NatsAuth::Credentials(_)));
    }

    #[test]
    fn test_user_without_password_falls_through_to_token() {
        let env = InMemoryEnv::new();
        env.set("NATS_USER", "u");
        env.set("NATS_TOKEN", "tok");
        assert!(matches!(NatsAuth::from_env(&env), NatsAuth::Token(_)));
    }

    #[test]
    fn test_servers_skip_blank_entries() {
        let env = InMemoryEnv::new();
        env.set("NATS_URL", "a:4222,, b:4222 ,");
        assert_eq!(NatsConfig::from_env(&env).servers, vec!["a:4222", "b:4222"]);
    }
}
