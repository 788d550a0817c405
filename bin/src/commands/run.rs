//! Full run: plan every task from the config and download them.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use quarry_lib::EXCHANGE_INFO_URL;
use quarry_lib::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::GlobalOpts;
use crate::display::print_summary;

/// Arguments of the `run` command. Every flag overrides one config key.
#[derive(Debug, Default, Args)]
pub(crate) struct RunArgs {
    /// Config file. Defaults to ./config.toml if present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last day (YYYY-MM-DD or "latest")
    #[arg(long)]
    end: Option<String>,

    /// Comma-separated symbols (e.g., BTCUSDT,ETHUSDT)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Concurrent downloads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Re-download files that already exist
    #[arg(long)]
    overwrite: bool,
}

impl RunArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(start) = self.start {
            settings.time_range.start_date = start;
        }
        if let Some(end) = self.end {
            settings.time_range.end_date = end;
        }
        if !self.symbols.is_empty() {
            settings.trading_pairs = self
                .symbols
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(workers) = self.workers {
            settings.download.max_concurrent_downloads = workers;
        }
        if let Some(output_dir) = self.output_dir {
            settings.output_directory = output_dir;
        }
        if self.overwrite {
            settings.file_processing.overwrite_existing = true;
        }
    }
}

/// Runs the download described by the config and CLI overrides.
pub(crate) async fn run(args: RunArgs, opts: GlobalOpts) -> Result<()> {
    let mut settings = super::load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate().context("Invalid settings")?;
    let _logging = crate::logging::init(&settings.logging, opts)?;

    let client = super::build_client(&settings)?;

    if settings.trading_pairs.is_empty() {
        tracing::info!("No trading pairs configured, discovering USDT perpetuals");
        settings.trading_pairs = discover_symbols(&client, EXCHANGE_INFO_URL)
            .await
            .context("Failed to discover symbols")?;
    }

    let range = resolve_range(&settings, Utc::now().date_naive())?;
    let (fetcher, sink) = super::build_fetcher(&settings, client, opts.quiet);
    let tasks = generate_tasks(
        &range,
        &settings.trading_pairs,
        &settings.data_types,
        &settings.kline_intervals,
        sink.as_ref(),
    )?;

    let shutdown = ShutdownCoordinator::shared();
    let listener = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight downloads");
                shutdown.request_shutdown();
            }
        })
    };

    let dispatcher = Dispatcher::new(fetcher, settings.download.max_concurrent_downloads)
        .with_progress_every(settings.download.progress_every)
        .with_shutdown(shutdown);
    let result = dispatcher.run(tasks).await;
    listener.abort();

    let summary = result?;
    if !opts.quiet {
        print_summary(&summary);
    }
    Ok(())
}
