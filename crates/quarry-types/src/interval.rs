//! Kline interval definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Candle interval used by the kline-style archives.
///
/// The string form matches the store's directory names (`1m`, `1h`, `1mo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1-minute candles.
    #[serde(rename = "1m")]
    Minute1,
    /// 3-minute candles.
    #[serde(rename = "3m")]
    Minute3,
    /// 5-minute candles.
    #[serde(rename = "5m")]
    Minute5,
    /// 15-minute candles.
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute candles.
    #[serde(rename = "30m")]
    Minute30,
    /// 1-hour candles.
    #[serde(rename = "1h")]
    Hour1,
    /// 2-hour candles.
    #[serde(rename = "2h")]
    Hour2,
    /// 4-hour candles.
    #[serde(rename = "4h")]
    Hour4,
    /// 6-hour candles.
    #[serde(rename = "6h")]
    Hour6,
    /// 8-hour candles.
    #[serde(rename = "8h")]
    Hour8,
    /// 12-hour candles.
    #[serde(rename = "12h")]
    Hour12,
    /// Daily candles.
    #[serde(rename = "1d")]
    Day1,
    /// 3-day candles.
    #[serde(rename = "3d")]
    Day3,
    /// Weekly candles.
    #[serde(rename = "1w")]
    Week1,
    /// Monthly candles.
    #[serde(rename = "1mo")]
    Month1,
}

impl Interval {
    /// Returns the nominal duration in seconds.
    ///
    /// Months are counted as 30 days.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Minute1 => 60,
            Self::Minute3 => 180,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1800,
            Self::Hour1 => 3600,
            Self::Hour2 => 7200,
            Self::Hour4 => 14400,
            Self::Hour6 => 21600,
            Self::Hour8 => 28800,
            Self::Hour12 => 43200,
            Self::Day1 => 86400,
            Self::Day3 => 259_200,
            Self::Week1 => 604_800,
            Self::Month1 => 2_592_000,
        }
    }

    /// Returns the interval as used in archive paths.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute3 => "3m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour2 => "2h",
            Self::Hour4 => "4h",
            Self::Hour6 => "6h",
            Self::Hour8 => "8h",
            Self::Hour12 => "12h",
            Self::Day1 => "1d",
            Self::Day3 => "3d",
            Self::Week1 => "1w",
            Self::Month1 => "1mo",
        }
    }

    /// Returns all intervals published by the store.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute3,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour2,
            Self::Hour4,
            Self::Hour6,
            Self::Hour8,
            Self::Hour12,
            Self::Day1,
            Self::Day3,
            Self::Week1,
            Self::Month1,
        ]
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = IntervalParseError;

    // Case-sensitive: "1m" is a minute, "1M" is not accepted to avoid month ambiguity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| IntervalParseError(s.to_string()))
    }
}

/// Error returned when parsing an invalid interval string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalParseError(String);

impl std::fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid interval '{}', expected one of: 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 1d, 3d, 1w, 1mo",
            self.0
        )
    }
}

impl std::error::Error for IntervalParseError {}
