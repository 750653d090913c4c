//! Esports tournament API server.
//!
//! Serves the team, tournament and match API plus the static front end,
//! backed by PostgreSQL or, with `--in-memory`, a process-local store.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Error};
use lol_tournament::{db::Database, winner::RandomCoin};
use lt_server::{
    api::{self, AppState},
    config::{CliOverrides, ServerConfig, StorageBackend},
    logging, metrics,
};
use pico_args::Arguments;
use tracing::{info, warn};

const HELP: &str = "\
Run the esports tournament API server

USAGE:
  lt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --static-dir DIR         Front-end directory served at /  [default: env STATIC_DIR or bundled static/]

FLAGS:
  --in-memory              Keep everything in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Pool size                    [default: 20]
  RUN_MIGRATIONS           Apply migrations on startup  [default: true]
  METRICS_BIND             Prometheus listener address  [default: disabled]
  RUST_LOG                 Log filter                   [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        in_memory: pargs.contains("--in-memory"),
        bind: pargs
            .opt_value_from_str::<_, SocketAddr>("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
        static_dir: pargs
            .opt_value_from_os_str("--static-dir", |s| {
                Ok::<PathBuf, std::convert::Infallible>(PathBuf::from(s))
            })
            .context("Invalid --static-dir")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{}/metrics", addr);
    }

    let coin = Arc::new(RandomCoin);
    let state = match config.storage {
        StorageBackend::Postgres => {
            info!("Connecting to database");
            let database = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected successfully");

            if config.run_migrations {
                database
                    .migrate()
                    .await
                    .context("Failed to apply database migrations")?;
            }

            AppState::postgres(database, coin)
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            AppState::in_memory(coin)
        }
    };
    let database = state.database.clone();

    let static_dir = config.static_dir.as_deref().filter(|dir| {
        let exists = dir.is_dir();
        if !exists {
            warn!("Static directory {} not found, front end disabled", dir.display());
        }
        exists
    });
    if let Some(dir) = static_dir {
        info!("Serving front end from {}", dir.display());
    }

    let app = api::create_router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(database) = database {
        database.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
