//! Archive data types published by the store.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::Interval;

/// Kind of daily archive.
///
/// Names match the store's directory names exactly (`aggTrades`, `klines`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    /// Aggregated trades.
    AggTrades,
    /// Raw trades.
    Trades,
    /// Best bid/ask updates.
    BookTicker,
    /// Order book depth snapshots.
    BookDepth,
    /// Open interest and long/short ratio metrics.
    Metrics,
    /// Candles of the traded contract.
    Klines,
    /// Candles of the index price.
    IndexPriceKlines,
    /// Candles of the mark price.
    MarkPriceKlines,
    /// Candles of the premium index.
    PremiumIndexKlines,
}

impl DataType {
    /// Returns the data type as used in archive paths.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AggTrades => "aggTrades",
            Self::Trades => "trades",
            Self::BookTicker => "bookTicker",
            Self::BookDepth => "bookDepth",
            Self::Metrics => "metrics",
            Self::Klines => "klines",
            Self::IndexPriceKlines => "indexPriceKlines",
            Self::MarkPriceKlines => "markPriceKlines",
            Self::PremiumIndexKlines => "premiumIndexKlines",
        }
    }

    /// Returns true if archives of this type are split by [`Interval`].
    #[must_use]
    pub const fn requires_interval(&self) -> bool {
        matches!(
            self,
            Self::Klines | Self::IndexPriceKlines | Self::MarkPriceKlines | Self::PremiumIndexKlines
        )
    }

    /// Returns all known data types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AggTrades,
            Self::Trades,
            Self::BookTicker,
            Self::BookDepth,
            Self::Metrics,
            Self::Klines,
            Self::IndexPriceKlines,
            Self::MarkPriceKlines,
            Self::PremiumIndexKlines,
        ]
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = DataTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| DataTypeParseError(s.to_string()))
    }
}

/// Error returned when parsing an unknown data type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeParseError(String);

impl std::fmt::Display for DataTypeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown data type '{}'", self.0)
    }
}

impl std::error::Error for DataTypeParseError {}

/// Ordered data type → enabled mapping.
///
/// Iteration follows insertion order (document order when read from TOML),
/// which in turn fixes the order of generated tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTypeSelection {
    entries: Vec<(DataType, bool)>,
}

impl DataTypeSelection {
    /// Creates an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets the flag for a data type, keeping its original position if it was
    /// already present.
    pub fn set(&mut self, data_type: DataType, enabled: bool) {
        match self.entries.iter_mut().find(|(dt, _)| *dt == data_type) {
            Some(entry) => entry.1 = enabled,
            None => self.entries.push((data_type, enabled)),
        }
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, data_type: DataType, enabled: bool) -> Self {
        self.set(data_type, enabled);
        self
    }

    /// Returns true if the data type is present and enabled.
    #[must_use]
    pub fn is_enabled(&self, data_type: DataType) -> bool {
        self.entries
            .iter()
            .any(|(dt, enabled)| *dt == data_type && *enabled)
    }

    /// Iterates over enabled data types in order.
    pub fn enabled(&self) -> impl Iterator<Item = DataType> + '_ {
        self.entries
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(dt, _)| *dt)
    }

    /// Iterates over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (DataType, bool)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of data types that will produce tasks for one symbol and date.
    ///
    /// Interval-bearing types count once per interval.
    #[must_use]
    pub fn files_per_symbol_day(&self, intervals: &[Interval]) -> usize {
        self.enabled()
            .map(|dt| if dt.requires_interval() { intervals.len() } else { 1 })
            .sum()
    }

    /// Returns true if no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(DataType, bool)> for DataTypeSelection {
    fn from_iter<I: IntoIterator<Item = (DataType, bool)>>(iter: I) -> Self {
        let mut selection = Self::new();
        for (data_type, enabled) in iter {
            selection.set(data_type, enabled);
        }
        selection
    }
}

impl Serialize for DataTypeSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(dt, enabled)| (dt.as_str(), enabled)))
    }
}

impl<'de> Deserialize<'de> for DataTypeSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = DataTypeSelection;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a table of data type names to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut selection = DataTypeSelection::new();
                while let Some((name, enabled)) = map.next_entry::<String, bool>()? {
                    let data_type = name.parse().map_err(serde::de::Error::custom)?;
                    selection.set(data_type, enabled);
                }
                Ok(selection)
            }
        }

        deserializer.deserialize_map(SelectionVisitor)
    }
}
