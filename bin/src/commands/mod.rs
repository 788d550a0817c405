//! CLI command implementations.

pub(crate) mod fetch;
pub(crate) mod init;
pub(crate) mod run;
pub(crate) mod symbols;

use anyhow::{Context, Result};
use quarry_lib::prelude::*;
use quarry_lib::settings::DEFAULT_CONFIG_PATH;
use std::path::Path;
use std::sync::Arc;

use crate::display::ProgressSink;

/// Loads settings from `path`, or from `./config.toml` when no path is given.
///
/// An explicit path must exist. A missing default file falls back to built-in
/// defaults.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Settings::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {DEFAULT_CONFIG_PATH}")),
        None => Ok(Settings::default()),
    }
}

/// HTTP client configured from the `[download]` section.
pub(crate) fn build_client(settings: &Settings) -> Result<DownloadClient> {
    DownloadClient::new(ClientConfig::from_settings(&settings.download))
        .context("Failed to build HTTP client")
}

/// Fetcher reporting through a progress bar and tracing.
pub(crate) fn build_fetcher(
    settings: &Settings,
    client: DownloadClient,
    quiet: bool,
) -> (Fetcher, Arc<dyn EventSink>) {
    let sink: Arc<dyn EventSink> = Arc::new(ProgressSink::new(quiet));
    let fetcher = Fetcher::new(
        Arc::new(client),
        FetchConfig::from_settings(settings),
        Arc::clone(&sink),
    );
    (fetcher, sink)
}
