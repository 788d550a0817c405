//! Symbol listing command.

use anyhow::{Context, Result};
use quarry_lib::EXCHANGE_INFO_URL;
use quarry_lib::prelude::*;
use quarry_lib::settings::LoggingSettings;

use crate::GlobalOpts;

/// Prints every trading USDT perpetual, one per line.
pub(crate) async fn list_symbols(opts: GlobalOpts) -> Result<()> {
    let console_only = LoggingSettings {
        file_output: false,
        ..LoggingSettings::default()
    };
    let _logging = crate::logging::init(&console_only, opts)?;

    let client = DownloadClient::with_defaults().context("Failed to build HTTP client")?;
    let symbols = discover_symbols(&client, EXCHANGE_INFO_URL)
        .await
        .context("Failed to fetch symbol list")?;

    for symbol in &symbols {
        println!("{symbol}");
    }
    if !opts.quiet {
        eprintln!("{} symbols", symbols.len());
    }
    Ok(())
}
