//! Download task definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DataType, Interval};

/// One archive to fetch: a symbol, a day, a data type and, for kline-style
/// types, an interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Trading pair (e.g. "BTCUSDT").
    pub symbol: String,
    /// Trading day.
    pub date: NaiveDate,
    /// Archive kind.
    pub data_type: DataType,
    /// Candle interval, required for interval-bearing data types.
    pub interval: Option<Interval>,
}

impl Task {
    /// Creates a task without an interval.
    #[must_use]
    pub fn new(symbol: impl Into<String>, date: NaiveDate, data_type: DataType) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            data_type,
            interval: None,
        }
    }

    /// Creates a task for an interval-bearing data type.
    #[must_use]
    pub fn with_interval(
        symbol: impl Into<String>,
        date: NaiveDate,
        data_type: DataType,
        interval: Interval,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            data_type,
            interval: Some(interval),
        }
    }

    /// Key of this task within its symbol-day: `data_type` or
    /// `data_type_interval`.
    #[must_use]
    pub fn key(&self) -> String {
        match self.interval {
            Some(interval) => format!("{}_{}", self.data_type, interval),
            None => self.data_type.to_string(),
        }
    }

    /// The symbol-day group this task belongs to.
    #[must_use]
    pub fn symbol_day(&self) -> SymbolDay {
        SymbolDay::new(self.symbol.clone(), self.date)
    }

    /// Returns the date formatted as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.interval {
            Some(interval) => write!(
                f,
                "{} {}/{} {}",
                self.symbol, self.data_type, interval, self.date
            ),
            None => write!(f, "{} {} {}", self.symbol, self.data_type, self.date),
        }
    }
}

/// All tasks sharing one symbol and date.
///
/// Orders date-major, matching task generation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolDay {
    /// Trading day.
    pub date: NaiveDate,
    /// Trading pair.
    pub symbol: String,
}

impl SymbolDay {
    /// Creates a new symbol-day key.
    #[must_use]
    pub const fn new(symbol: String, date: NaiveDate) -> Self {
        Self { date, symbol }
    }
}

impl std::fmt::Display for SymbolDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.symbol, self.date)
    }
}
