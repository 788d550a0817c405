//! Single symbol-day command.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use quarry_lib::prelude::*;
use std::path::{Path, PathBuf};

use crate::GlobalOpts;
use crate::display::print_symbol_day;

/// Downloads every enabled data type for `symbol` on `date`.
pub(crate) async fn fetch(
    symbol: &str,
    date: &str,
    config: Option<&Path>,
    output_dir: Option<PathBuf>,
    opts: GlobalOpts,
) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {date}"))?;

    let mut settings = super::load_settings(config)?;
    if let Some(output_dir) = output_dir {
        settings.output_directory = output_dir;
    }
    let _logging = crate::logging::init(&settings.logging, opts)?;

    let client = super::build_client(&settings)?;
    let (fetcher, _sink) = super::build_fetcher(&settings, client, true);
    let result = fetch_symbol_day(
        &fetcher,
        &symbol.trim().to_uppercase(),
        date,
        &settings.data_types,
        &settings.kline_intervals,
    )
    .await;

    if !opts.quiet {
        print_symbol_day(&result);
    }
    if result.all_succeeded() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} files failed",
            result.total_count() - result.success_count(),
            result.total_count()
        )
    }
}
