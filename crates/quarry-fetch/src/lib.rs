//! HTTP access and single-file fetching for quarry.
//!
//! This crate provides the per-archive download pipeline:
//!
//! - [`url::archive_url`] - Builds archive store URLs
//! - [`FileTarget`] - Local directory layout for one task
//! - [`is_download_needed`] - Resume check for already extracted files
//! - [`DownloadClient`] - reqwest client behind the [`ArchiveSource`] trait
//! - [`extract_archive`] - Zip extraction
//! - [`Fetcher`] - The resolve / resume / retry / extract state machine
//! - [`discover_symbols`] - USDT perpetual lookup from exchange metadata

#![doc(issue_tracker_base_url = "https://github.com/quarry-rs/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod extract;
mod fetcher;
mod layout;
mod resume;
mod symbols;
pub mod url;

pub use client::{ArchiveSource, ByteStream, ClientConfig, DownloadClient, SourceError, SourceResponse};
pub use extract::{ExtractError, extract_archive, extract_archive_blocking};
pub use fetcher::{FetchConfig, Fetcher};
pub use layout::{FileTarget, file_stem, task_directory};
pub use resume::{MIN_COMPLETE_BYTES, is_download_needed};
pub use symbols::{EXCHANGE_INFO_URL, ExchangeInfo, SymbolInfo, discover_symbols};
