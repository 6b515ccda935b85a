//! # Application Error Type
//!
//! Errors that stop the bot process: bad configuration, an unusable
//! database, a broken log directory or a closed output stream.
//!
//! Per-request failures never show up here. The action handler folds those
//! into an `Outcome` and the request loop keeps going.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main()                                                                 │
//! │    │                                                                    │
//! │    ├── BotConfig::load ──── io / toml / validate ──┐                   │
//! │    ├── init_tracing ─────── filter / log dir ──────┤                   │
//! │    ├── connect_global ───── DbError ───────────────┼──► AppError       │
//! │    └── Console::serve ───── io / serde_json ───────┘     { code,       │
//! │                                                            message }   │
//! │                                                              │          │
//! │                                           eprintln + exit code 1       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use shelf_db::DbError;

/// A fatal error with a machine-readable code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for process-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Configuration could not be read or is invalid
    ConfigError,

    /// The store could not be opened or migrated
    DatabaseError,

    /// Logging could not be set up
    LoggingError,

    /// Reading requests or writing outcomes failed
    IoError,

    /// Anything else
    Internal,
}

/// Result type for the bot process.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ConfigError, message)
    }

    pub fn logging(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::LoggingError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(e) => AppError::new(
                ErrorCode::DatabaseError,
                format!("Database connection failed: {}", e),
            ),
            DbError::MigrationFailed(e) => AppError::new(
                ErrorCode::DatabaseError,
                format!("Database migration failed: {}", e),
            ),
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => AppError::new(ErrorCode::DatabaseError, other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::config(format!("Invalid config file: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("Failed to encode outcome: {}", err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

// =============================================================================
// Unit Tests
// =============================================================================
