use std::{process::ExitCode, sync::Arc, time::Duration};

use chrono::Utc;
use clap::Parser;
use syncgate::{
    AppState, build_app,
    config::SyncConfig,
    db::DbPool,
    observability,
    retention::{RetentionSweeper, start_retention_worker},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

#[derive(Parser, Debug)]
#[command(name = "syncgate", version, about = "Mailbox and news sync service")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a TOML config file. Without one, settings are read from
    /// environment variables (CLIENT_ID, TARGET_USER_EMAIL, NEWS_API_KEY, PORT, ...).
    #[arg(short, long, global = true, env = "SYNCGATE_CONFIG")]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Run one retention pass over every collection and exit
    Sweep,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Migrate => run_migrate(config).await,
        Command::Sweep => run_sweep(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting with error");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&str>) -> Result<SyncConfig, syncgate::config::ConfigError> {
    match path {
        Some(path) => SyncConfig::from_file(path),
        None => SyncConfig::from_env(),
    }
}

type RunResult = Result<(), Box<dyn std::error::Error>>;

async fn run_server(config: SyncConfig) -> RunResult {
    let state = AppState::new(config).await?;
    let config = state.config.clone();

    let shutdown = CancellationToken::new();
    let task_tracker = state.task_tracker.clone();

    if config.retention.enabled {
        task_tracker.spawn(start_retention_worker(
            state.db.clone(),
            config.retention.clone(),
            shutdown.clone(),
        ));
    }

    let app = build_app(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    // Graceful shutdown: wait for SIGINT/SIGTERM, then wait for all background tasks
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            task_tracker,
            shutdown,
            Duration::from_secs(config.server.shutdown_timeout_secs),
        ))
        .await?;

    Ok(())
}

async fn run_migrate(config: SyncConfig) -> RunResult {
    // connect() already migrated if the config enables it
    let db = DbPool::connect(&config.database).await?;
    if !config.database.run_migrations() {
        db.run_migrations().await?;
    }
    Ok(())
}

async fn run_sweep(config: SyncConfig) -> RunResult {
    let db = DbPool::connect(&config.database).await?;
    let sweeper = RetentionSweeper::new(Arc::new(db), config.retention.periods.clone());
    for result in sweeper.sweep_all(Utc::now()).await? {
        println!(
            "{}: deleted {} records older than {}",
            result.collection,
            result.deleted,
            result.cutoff.to_rfc3339()
        );
    }
    Ok(())
}

async fn shutdown_signal(task_tracker: TaskTracker, shutdown: CancellationToken, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, waiting for background tasks to complete...");

    shutdown.cancel();
    task_tracker.close();

    if tokio::time::timeout(timeout, task_tracker.wait()).await.is_err() {
        tracing::warn!("Timeout waiting for background tasks to complete");
    } else {
        tracing::info!("All background tasks completed");
    }
}
