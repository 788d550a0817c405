//! Core types for the quarry market-data archive downloader.
//!
//! This crate provides the fundamental data structures used throughout quarry:
//!
//! - [`Task`] - One (symbol, date, data type, interval) archive to fetch
//! - [`DataType`] - Kind of archive published by the data store
//! - [`Interval`] - Kline interval for candle-style data types
//! - [`DateRange`] - Inclusive range of trading days
//! - [`DownloadOutcome`] - Result of driving one task to completion
//! - [`SymbolDataResult`] - Per-key results for one symbol and date
//! - [`RunSummary`] - Aggregate statistics for a whole run
//! - [`DownloadEvent`] and [`EventSink`] - Structured event reporting
//! - [`Settings`] - Run configuration loaded from TOML

#![doc(issue_tracker_base_url = "https://github.com/quarry-rs/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod data_type;
mod date_range;
mod error;
pub mod events;
mod interval;
mod outcome;
pub mod settings;
mod task;

pub use data_type::{DataType, DataTypeParseError, DataTypeSelection};
pub use date_range::{DateRange, DayIterator, LATEST};
pub use error::{ConfigError, DateRangeError, QuarryError, Result, TaskError};
pub use events::{DownloadEvent, EventSink, NoOpSink, RecordingSink, TracingSink};
pub use interval::{Interval, IntervalParseError};
pub use outcome::{Disposition, DownloadOutcome, RunSummary, SymbolDataResult};
pub use settings::Settings;
pub use task::{SymbolDay, Task};
