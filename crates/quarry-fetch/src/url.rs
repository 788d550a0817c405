//! Archive store URL construction.

use quarry_types::{Task, TaskError};

/// Builds the archive URL for a task.
///
/// URL formats:
/// - simple types: `{base}{data_type}/{SYMBOL}/{SYMBOL}-{data_type}-{date}.zip`
/// - interval types: `{base}{data_type}/{SYMBOL}/{interval}/{SYMBOL}-{interval}-{date}.zip`
///
/// A missing trailing `/` on `base_url` is added.
///
/// # Errors
///
/// Returns [`TaskError::InvalidTask`] if the data type requires an interval
/// and the task has none.
///
/// # Example
///
/// ```
/// use quarry_fetch::url::archive_url;
/// use quarry_types::{DataType, Interval, Task};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
/// let task = Task::with_interval("BTCUSDT", date, DataType::Klines, Interval::Hour1);
/// let url = archive_url("https://data.binance.vision/data/futures/um/daily/", &task).unwrap();
/// assert_eq!(
///     url,
///     "https://data.binance.vision/data/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-08-01.zip"
/// );
/// ```
pub fn archive_url(base_url: &str, task: &Task) -> Result<String, TaskError> {
    let separator = if base_url.ends_with('/') { "" } else { "/" };
    let date = task.date_str();
    let data_type = task.data_type;
    let symbol = &task.symbol;

    match (data_type.requires_interval(), task.interval) {
        (true, Some(interval)) => Ok(format!(
            "{base_url}{separator}{data_type}/{symbol}/{interval}/{symbol}-{interval}-{date}.zip"
        )),
        (true, None) => Err(TaskError::InvalidTask { data_type }),
        // Simple types ignore a stray interval.
        (false, _) => Ok(format!(
            "{base_url}{separator}{data_type}/{symbol}/{symbol}-{data_type}-{date}.zip"
        )),
    }
}
