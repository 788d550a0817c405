//! Config scaffolding command.

use anyhow::{Context, Result};
use quarry_lib::prelude::*;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::GlobalOpts;

const HEADER: &str = "\
# quarry configuration
#
# Leave trading_pairs empty to download every trading USDT perpetual.
# end_date accepts \"latest\" (today in UTC).
# Logs go to log_directory unless [logging] file_output = false.
# Delays and timeouts are in seconds.

";

/// Writes the default config to `path`. Never overwrites an existing file.
pub(crate) fn init(path: &Path, opts: GlobalOpts) -> Result<()> {
    write_default_config(path)?;
    if !opts.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_default_config(path: &Path) -> Result<()> {
    let body = Settings::default()
        .to_toml_string()
        .context("Failed to render default config")?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Refusing to write {}", path.display()))?;
    file.write_all(HEADER.as_bytes())?;
    file.write_all(body.as_bytes())?;
    Ok(())
}
