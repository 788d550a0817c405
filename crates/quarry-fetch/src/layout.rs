//! Local directory layout for downloaded archives.

use std::path::{Path, PathBuf};

use quarry_types::{Task, TaskError};

use crate::url::archive_url;

/// Everything the fetcher needs to know about where one task's bytes come
/// from and go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    /// Source URL.
    pub url: String,
    /// Destination directory: `{out}/{data_type}/{SYMBOL}[/{interval}]`.
    pub dir: PathBuf,
    /// Downloaded archive path inside `dir`.
    pub archive_path: PathBuf,
    /// Extracted file path inside `dir`.
    pub csv_path: PathBuf,
}

impl FileTarget {
    /// Resolves URL and paths for a task. Pure; touches no files.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTask`] for an interval type without interval.
    pub fn resolve(base_url: &str, output_dir: &Path, task: &Task) -> Result<Self, TaskError> {
        let url = archive_url(base_url, task)?;
        let dir = task_directory(output_dir, task);
        let stem = file_stem(task);
        Ok(Self {
            url,
            archive_path: dir.join(format!("{stem}.zip")),
            csv_path: dir.join(format!("{stem}.csv")),
            dir,
        })
    }
}

/// Destination directory of a task.
#[must_use]
pub fn task_directory(output_dir: &Path, task: &Task) -> PathBuf {
    let dir = output_dir
        .join(task.data_type.as_str())
        .join(&task.symbol);
    match task.interval {
        Some(interval) if task.data_type.requires_interval() => dir.join(interval.as_str()),
        _ => dir,
    }
}

/// Local file name without extension: `{SYMBOL}-{data_type}[-{interval}]-{date}`.
#[must_use]
pub fn file_stem(task: &Task) -> String {
    match task.interval {
        Some(interval) if task.data_type.requires_interval() => format!(
            "{}-{}-{}-{}",
            task.symbol,
            task.data_type,
            interval,
            task.date_str()
        ),
        _ => format!("{}-{}-{}", task.symbol, task.data_type, task.date_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quarry_types::{DataType, Interval};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    #[test]
    fn test_simple_layout() {
        let task = Task::new("BTCUSDT", date(), DataType::AggTrades);
        let target = FileTarget::resolve("http://store/", Path::new("/data"), &task).unwrap();

        assert_eq!(target.dir, PathBuf::from("/data/aggTrades/BTCUSDT"));
        assert_eq!(
            target.csv_path,
            PathBuf::from("/data/aggTrades/BTCUSDT/BTCUSDT-aggTrades-2024-08-01.csv")
        );
        assert_eq!(
            target.archive_path,
            PathBuf::from("/data/aggTrades/BTCUSDT/BTCUSDT-aggTrades-2024-08-01.zip")
        );
    }

    #[test]
    fn test_interval_layout() {
        let task = Task::with_interval("BTCUSDT", date(), DataType::Klines, Interval::Hour1);
        let target = FileTarget::resolve("http://store/", Path::new("/data"), &task).unwrap();

        assert_eq!(target.dir, PathBuf::from("/data/klines/BTCUSDT/1h"));
        assert_eq!(
            target.csv_path,
            PathBuf::from("/data/klines/BTCUSDT/1h/BTCUSDT-klines-1h-2024-08-01.csv")
        );
        assert_eq!(target.url, "http://store/klines/BTCUSDT/1h/BTCUSDT-1h-2024-08-01.zip");
    }

    #[test]
    fn test_resolve_rejects_missing_interval() {
        let task = Task::new("BTCUSDT", date(), DataType::IndexPriceKlines);
        assert!(FileTarget::resolve("http://store/", Path::new("/data"), &task).is_err());
    }
}
