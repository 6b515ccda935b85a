//! # Shelf Bot Entry Point
//!
//! ## Usage
//! ```bash
//! # Platform default config file, if present
//! shelf-bot
//!
//! # Explicit config file
//! shelf-bot --config ./shelf.toml
//!
//! # Quick session against a scratch database
//! echo "42 book_list" | SHELF_DB_PATH=./scratch.db shelf-bot
//! ```
//!
//! ## Startup Sequence
//! 1. Load configuration
//! 2. Initialize tracing (console + rolling file), then log the config notices
//! 3. Connect to database & run migrations
//! 4. Serve requests until stdin closes

use std::path::PathBuf;
use std::process::ExitCode;

use shelf_bot::config::{BotConfig, ConfigNotice};
use shelf_bot::error::AppResult;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = match parse_args() {
        Ok(Some(path)) => path,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    match start(config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("shelf-bot: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn start(config_path: Option<PathBuf>) -> AppResult<()> {
    // Logging settings come from the config, so its notices wait for tracing.
    let (config, notices) = BotConfig::load_with_notices(config_path)?;
    let _guard = shelf_bot::init_tracing(&config.logging)?;

    tracing::info!("Starting Shelf bot");
    notices.iter().for_each(ConfigNotice::log);
    shelf_bot::run(config).await
}

/// `Ok(None)` when the process should exit right away (`--help`).
fn parse_args() -> Result<Option<Option<PathBuf>>, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| "--config needs a path".to_string())?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => {
                println!("Shelf Bot");
                println!();
                println!("Usage: shelf-bot [OPTIONS]");
                println!();
                println!("Reads '<user_id> <payload>' or '<user_id> add name|author|genre[|photo]'");
                println!("lines from stdin and prints one JSON outcome per line.");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {} (try --help)", other)),
        }
        i += 1;
    }

    Ok(Some(config_path))
}
