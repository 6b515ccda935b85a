//! # Shelf Bot Library
//!
//! Process wiring for the Shelf bot: configuration, logging, the global
//! store handle and the request loop.
//!
//! ## Module Organization
//! ```text
//! shelf_bot/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── config.rs       ◄─── BotConfig (defaults → TOML → env)
//! ├── console.rs      ◄─── Line-oriented request loop
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   └── registry.rs ◄─── Last-rendered-view registry
//! └── error.rs        ◄─── AppError for fatal failures
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod state;

use tokio::io::BufReader;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::{BotConfig, LoggingSettings};
use console::Console;
use error::{AppError, AppResult};
use shelf_db::Database;
use state::ViewRegistry;

/// Runs the bot until its input closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Bot Startup                                       │
/// │                                                                         │
/// │  1. Create the database directory ────────────────────────────────────► │
/// │                                                                         │
/// │  2. Connect the global Database ──────────────────────────────────────► │
/// │     • SQLite with WAL mode, pragmas on every connection                 │
/// │     • ensure schema, favorite column, one-time status backfill          │
/// │                                                                         │
/// │  3. Serve stdin → stdout ─────────────────────────────────────────────► │
/// │     • one request per line, one JSON outcome per line                   │
/// │                                                                         │
/// │  4. Close the pool on end of input ───────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config: BotConfig) -> AppResult<()> {
    if let Some(dir) = config.database_dir() {
        std::fs::create_dir_all(dir)?;
    }

    let db = Database::connect_global(config.db_config()).await?;
    info!(path = ?config.database.path, "Database ready");

    let console = Console::new(db.handler(), ViewRegistry::new());
    let written = console
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!(outcomes = written, "Input closed, shutting down");
    db.close().await;
    Ok(())
}

/// Initializes console and rolling-file logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - otherwise `logging.level` from the config
///   (default `info,shelf=debug,sqlx=warn`)
///
/// Console output goes to stderr; stdout carries outcomes. The returned
/// guard flushes the file writer and must live as long as the process.
pub fn init_tracing(logging: &LoggingSettings) -> AppResult<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| AppError::logging(format!("Invalid log filter: {}", e)))?;

    std::fs::create_dir_all(&logging.dir)?;
    let file_appender = tracing_appender::rolling::daily(&logging.dir, &logging.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| AppError::logging(e.to_string()))?;

    Ok(guard)
}
