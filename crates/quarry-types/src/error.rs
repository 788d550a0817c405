//! Error types for quarry.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::DataType;

/// Result type alias for run-level quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Errors that abort a whole run.
///
/// Per-task failures never surface here; they are recorded as [`TaskError`]s
/// inside outcomes and only show up in the aggregate statistics.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// Invalid configuration, detected before any task runs.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The symbol list could not be fetched from the exchange.
    #[error("Symbol discovery failed: {0}")]
    SymbolDiscovery(String),

    /// Task generation produced nothing to do.
    #[error("No download tasks generated; check the date range, symbols and enabled data types")]
    NoTasks,

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid date range.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// No symbols to download after resolution.
    #[error("Symbol list is empty")]
    NoSymbols,

    /// A numeric or string setting is out of range.
    #[error("Invalid setting `{key}`: {reason}")]
    InvalidSetting {
        /// The offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown values.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be rendered back to TOML.
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// A date literal is not `YYYY-MM-DD`.
    #[error("Malformed date '{value}', expected YYYY-MM-DD or \"latest\"")]
    Malformed {
        /// The rejected literal.
        value: String,
    },
}

/// Failure of a single download task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task cannot be resolved to a URL, e.g. a kline type without interval.
    #[error("Invalid task: {data_type} requires an interval")]
    InvalidTask {
        /// The data type missing its interval.
        data_type: DataType,
    },

    /// The store has no archive for this key (HTTP 404). Never retried.
    #[error("Not found: {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// Timeouts, connection errors and non-404 error statuses, after all attempts.
    #[error("Download failed after {attempts} attempts: {url}: {message}")]
    Transient {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The last error seen.
        message: String,
    },

    /// The archive was downloaded but could not be extracted.
    #[error("Extraction failed for '{path}': {message}")]
    Extraction {
        /// The archive path, retained on disk.
        path: PathBuf,
        /// The underlying error.
        message: String,
    },

    /// Anything else, including a panicked worker.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl TaskError {
    /// Short stable identifier for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTask { .. } => "invalid_task",
            Self::NotFound { .. } => "not_found",
            Self::Transient { .. } => "transient",
            Self::Extraction { .. } => "extraction",
            Self::Unexpected(_) => "unexpected",
        }
    }
}
