//! Download orchestration for quarry.
//!
//! - [`generate_tasks`] - Expands dates, symbols, data types and intervals into tasks
//! - [`Dispatcher`] - Runs tasks with bounded concurrency
//! - [`Aggregator`] - Rolls outcomes into a [`RunSummary`](quarry_types::RunSummary)
//! - [`fetch_symbol_day`] - Fetches every archive for one symbol and date
//! - [`ShutdownCoordinator`] - Stops new tasks on request

#![doc(issue_tracker_base_url = "https://github.com/quarry-rs/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregate;
mod dispatch;
mod plan;
mod shutdown;
mod symbol_day;

pub use aggregate::{Aggregator, DEFAULT_PROGRESS_EVERY};
pub use dispatch::{DEFAULT_WORKERS, Dispatcher};
pub use plan::{generate_tasks, resolve_range};
pub use shutdown::{SharedShutdown, ShutdownCoordinator};
pub use symbol_day::fetch_symbol_day;
