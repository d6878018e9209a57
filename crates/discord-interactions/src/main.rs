//! Discord HTTP interactions server.

mod commands;

use std::net::SocketAddr;

use anyhow::Result;
use async_nats::jetstream;
use clap::Parser;
use discord_interactions::config::{InteractionsConfig, StoreBackend, SystemEnv};
use discord_interactions::dispatch::Dispatcher;
use discord_interactions::nats;
use discord_interactions::registry::HandlerRegistry;
use discord_interactions::reply::BackgroundTasks;
use discord_interactions::server::{AppState, serve};
use discord_interactions::store::{
    CallbackStore, MemoryCallbackStore, NatsCallbackStore, open_bucket,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP listening port (overrides INTERACTIONS_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "discord_interactions=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = InteractionsConfig::from_env(&SystemEnv)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    info!(
        application_id = %config.application_id,
        environment = config.environment.as_str(),
        store = ?config.store,
        "Starting Discord interactions server"
    );

    match config.store {
        StoreBackend::Nats => {
            let client = nats::connect(&config.nats).await?;
            let js = jetstream::new(client);
            let bucket = open_bucket(&js, &config.kv_bucket, config.state_ttl).await?;
            run(config, NatsCallbackStore::new(bucket)).await
        }
        StoreBackend::Memory => {
            warn!("Routing state is process-local and will not survive a restart");
            run(config, MemoryCallbackStore::new()).await
        }
    }
}

async fn run<S: CallbackStore>(config: InteractionsConfig, store: S) -> Result<()> {
    let registry = commands::register(HandlerRegistry::builder()).build();
    info!(commands = registry.command_count(), "Handlers registered");

    let state = AppState {
        dispatcher: Dispatcher::new(registry, store, config.bindings()),
        public_key: config.public_key,
        tasks: BackgroundTasks::new(),
    };

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port))).await?;
    serve(listener, state, shutdown_signal()).await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(error) => {
                warn!(error = %error, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(error) => {
                warn!(error = %error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
