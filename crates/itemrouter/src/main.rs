mod app;
mod config;
mod handlers;
mod router;
mod storage;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use listenfd::ListenFd;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itemrouter_core::request::{RouteRequest, RouteResponse};
use itemrouter_core::storage::ItemRepository;

use crate::{
    app::create_app,
    config::{Config, StorageBackend},
    router::ItemRouter,
    storage::InMemoryRepository,
};

/// itemrouter - Route item CRUD requests to a single collection
#[derive(Parser, Debug)]
#[command(name = "itemrouter")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the item routes over HTTP
    Serve(ServeArgs),
    /// Run request descriptors through the router and print the responses
    Invoke(InvokeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[derive(Args, Debug)]
struct InvokeArgs {
    /// JSON file holding one request descriptor or an array of them (stdin when omitted)
    #[arg(long, short)]
    event: Option<PathBuf>,
}

/// One request descriptor or a batch run in order against the same backend.
#[derive(Deserialize)]
#[serde(untagged)]
enum Events {
    One(RouteRequest),
    Many(Vec<RouteRequest>),
}

#[derive(Serialize)]
#[serde(untagged)]
enum Responses {
    One(RouteResponse),
    Many(Vec<RouteResponse>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `invoke` output stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itemrouter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let repository = build_repository(&config).await?;
    let router = ItemRouter::from_config(repository, &config);

    tracing::debug!(
        id_strategy = ?config.id_strategy,
        error_status_policy = ?config.error_status_policy,
        "Router configured"
    );

    match cli.command {
        Command::Serve(args) => serve(router, args).await,
        Command::Invoke(args) => invoke(router, args).await,
    }
}

/// Build the repository selected by the configuration.
async fn build_repository(config: &Config) -> Result<Arc<dyn ItemRepository>> {
    match config.storage_backend {
        StorageBackend::InMemory => {
            tracing::info!("Using in-memory storage");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        #[cfg(feature = "dynamodb")]
        StorageBackend::DynamoDb => {
            let repository = storage::DynamoDbRepository::connect(&config.dynamodb).await;
            tracing::info!(
                table = repository.table_name(),
                endpoint = ?config.dynamodb.endpoint_url,
                "Using DynamoDB storage"
            );
            Ok(Arc::new(repository))
        }
        #[cfg(not(feature = "dynamodb"))]
        StorageBackend::DynamoDb => anyhow::bail!(
            "STORAGE_BACKEND=dynamodb requires building with the `dynamodb` feature"
        ),
    }
}

async fn serve(router: ItemRouter, args: ServeArgs) -> Result<()> {
    let app = create_app(router);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", args.host, args.port);
            TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn invoke(router: ItemRouter, args: InvokeArgs) -> Result<()> {
    let raw = match &args.event {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
    };

    let responses = run_events(&router, &raw).await?;

    println!("{}", serde_json::to_string_pretty(&responses)?);
    Ok(())
}

/// Parse request descriptors from `raw` and run them in order.
async fn run_events(router: &ItemRouter, raw: &str) -> Result<Responses> {
    let events: Events =
        serde_json::from_str(raw).context("input is not a request descriptor")?;

    let responses = match events {
        Events::One(request) => Responses::One(router.handle(request).await),
        Events::Many(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for request in requests {
                responses.push(router.handle(request).await);
            }
            Responses::Many(responses)
        }
    };

    Ok(responses)
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
