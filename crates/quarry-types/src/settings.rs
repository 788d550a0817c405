//! Run settings, loaded from TOML.
//!
//! Every field has a default, so a config file only needs the keys it wants to
//! change. Delays are fractional seconds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ConfigError, DataType, DataTypeSelection, Interval};

/// Default archive store location (USD-M futures, daily archives).
pub const DEFAULT_BASE_URL: &str = "https://data.binance.vision/data/futures/um/daily/";

/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Store root; archive paths are appended to it.
    pub base_url: String,
    /// Root of the local directory tree.
    pub output_directory: PathBuf,
    /// Symbols to fetch. Empty means "discover all USDT perpetuals".
    pub trading_pairs: Vec<String>,
    /// Intervals for interval-bearing data types.
    pub kline_intervals: Vec<Interval>,
    /// Network and concurrency settings.
    pub download: DownloadSettings,
    /// Post-download file handling.
    pub file_processing: FileProcessing,
    /// Dates to fetch.
    pub time_range: TimeRange,
    /// Ordered data type enablement.
    pub data_types: DataTypeSelection,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_directory: PathBuf::from("./data"),
            trading_pairs: Vec::new(),
            kline_intervals: vec![Interval::Hour1],
            download: DownloadSettings::default(),
            file_processing: FileProcessing::default(),
            time_range: TimeRange::default(),
            data_types: DataTypeSelection::new()
                .with(DataType::AggTrades, true)
                .with(DataType::Trades, false)
                .with(DataType::BookTicker, false)
                .with(DataType::BookDepth, false)
                .with(DataType::Metrics, true)
                .with(DataType::Klines, true)
                .with(DataType::IndexPriceKlines, false)
                .with(DataType::MarkPriceKlines, false)
                .with(DataType::PremiumIndexKlines, false),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Loads and validates settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not parse or fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Renders the settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(invalid("base_url", "must not be empty"));
        }
        let download = &self.download;
        if download.retry_attempts == 0 {
            return Err(invalid("download.retry_attempts", "must be at least 1"));
        }
        if download.max_concurrent_downloads == 0 {
            return Err(invalid(
                "download.max_concurrent_downloads",
                "must be at least 1",
            ));
        }
        if download.chunk_size == 0 {
            return Err(invalid("download.chunk_size", "must be at least 1"));
        }
        if download.progress_every == 0 {
            return Err(invalid("download.progress_every", "must be at least 1"));
        }
        for (key, secs) in [
            ("download.retry_delay", download.retry_delay),
            ("download.rate_limit_delay", download.rate_limit_delay),
        ] {
            check_seconds(key, secs)?;
        }
        check_seconds("download.timeout", download.timeout)?;
        if download.timeout <= 0.0 {
            return Err(invalid("download.timeout", "must be positive"));
        }
        if self.logging.file_output && self.logging.max_log_files == 0 {
            return Err(invalid("logging.max_log_files", "must be at least 1"));
        }
        Ok(())
    }

    /// Base URL guaranteed to end with `/`.
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSettings {
    /// Attempts per file, including the first.
    pub retry_attempts: u32,
    /// Seconds to wait between attempts.
    pub retry_delay: f64,
    /// Seconds to wait before every request.
    pub rate_limit_delay: f64,
    /// Seconds to wait for the next bytes of a response before giving up.
    pub timeout: f64,
    /// Write buffer size in bytes.
    pub chunk_size: usize,
    /// Worker pool size.
    pub max_concurrent_downloads: usize,
    /// Emit a progress event every this many completed tasks.
    pub progress_every: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: 5.0,
            rate_limit_delay: 0.1,
            timeout: 30.0,
            chunk_size: 8192,
            max_concurrent_downloads: 3,
            progress_every: 10,
        }
    }
}

impl DownloadSettings {
    /// Delay between attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay)
    }

    /// Delay before every request.
    #[must_use]
    pub fn rate_limit_delay(&self) -> Duration {
        seconds(self.rate_limit_delay)
    }

    /// Read timeout: the longest gap between received bytes.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout)
    }
}

/// `[file_processing]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileProcessing {
    /// Extract archives after download.
    pub auto_extract: bool,
    /// Delete the archive once extraction succeeds.
    #[serde(alias = "delete_zip_after_extract")]
    pub delete_archive_after_extract: bool,
    /// Re-download even when a complete output exists.
    pub overwrite_existing: bool,
}

impl Default for FileProcessing {
    fn default() -> Self {
        Self {
            auto_extract: true,
            delete_archive_after_extract: true,
            overwrite_existing: false,
        }
    }
}

/// `[time_range]` section. Dates stay literal until task generation so that
/// `"latest"` resolves against the clock at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeRange {
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD` or `"latest"`.
    pub end_date: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start_date: "2024-01-01".to_string(),
            end_date: crate::LATEST.to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default filter directive, e.g. `"info"` or `"quarry=debug"`.
    pub level: String,
    /// Console output format.
    pub format: LogFormat,
    /// Log to stderr.
    pub console_output: bool,
    /// Log to daily files under `log_directory`, plus an errors-only file.
    pub file_output: bool,
    /// Directory for log files.
    pub log_directory: PathBuf,
    /// Rotated files kept per log; older ones are deleted.
    pub max_log_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            console_output: true,
            file_output: true,
            log_directory: PathBuf::from("./logs"),
            max_log_files: 5,
        }
    }
}

fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

fn check_seconds(key: &'static str, secs: f64) -> Result<(), ConfigError> {
    if Duration::try_from_secs_f64(secs).is_err() {
        return Err(invalid(key, "must be a non-negative number of seconds"));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key,
        reason: reason.to_string(),
    }
}
