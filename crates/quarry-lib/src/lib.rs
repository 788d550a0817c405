//! Bulk downloader for dated market-data archives from the Binance public data
//! store.
//!
//! This is a facade crate that re-exports functionality from the quarry
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use quarry_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("config.toml")?;
//!     let sink: Arc<dyn EventSink> = Arc::new(TracingSink);
//!
//!     let range = resolve_range(&settings, chrono::Utc::now().date_naive())?;
//!     let tasks = generate_tasks(
//!         &range,
//!         &settings.trading_pairs,
//!         &settings.data_types,
//!         &settings.kline_intervals,
//!         sink.as_ref(),
//!     )?;
//!
//!     let client = DownloadClient::new(ClientConfig::from_settings(&settings.download))?;
//!     let fetcher = Fetcher::new(Arc::new(client), FetchConfig::from_settings(&settings), sink);
//!     let summary = Dispatcher::new(fetcher, settings.download.max_concurrent_downloads)
//!         .run(tasks)
//!         .await?;
//!
//!     println!("{:.1}% of symbol-days complete", summary.success_rate());
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/quarry-rs/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use quarry_types::*;

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use quarry_fetch::{
    ArchiveSource, ClientConfig, DownloadClient, EXCHANGE_INFO_URL, ExtractError, FetchConfig,
    Fetcher, FileTarget, MIN_COMPLETE_BYTES, SourceError, SourceResponse, discover_symbols,
    extract_archive, is_download_needed,
};

// Re-export orchestration
#[cfg(feature = "engine")]
pub use quarry_engine::{
    Aggregator, DEFAULT_WORKERS, Dispatcher, SharedShutdown, ShutdownCoordinator,
    fetch_symbol_day, generate_tasks, resolve_range,
};

/// Prelude module for convenient imports.
///
/// ```
/// use quarry_lib::prelude::*;
/// ```
pub mod prelude {
    pub use quarry_types::{
        ConfigError, DataType, DataTypeSelection, DateRange, Disposition, DownloadEvent,
        DownloadOutcome, EventSink, Interval, NoOpSink, QuarryError, RecordingSink, Result,
        RunSummary, Settings, SymbolDataResult, Task, TaskError, TracingSink,
    };

    #[cfg(feature = "fetch")]
    pub use quarry_fetch::{ClientConfig, DownloadClient, FetchConfig, Fetcher, discover_symbols};

    #[cfg(feature = "engine")]
    pub use quarry_engine::{
        Dispatcher, ShutdownCoordinator, fetch_symbol_day, generate_tasks, resolve_range,
    };
}
