//! quarry CLI - Bulk downloader for Binance public market-data archives.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use quarry_lib::settings::LogFormat;
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Bulk downloader for Binance public market-data archives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output and info logs)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format (overrides `logging.format`)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every archive described by the config
    Run(RunArgs),

    /// Download every enabled data type for one symbol and date
    Fetch {
        /// Trading pair (e.g., BTCUSDT)
        symbol: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Config file. Defaults to ./config.toml if present.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides `output_directory`)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List trading USDT perpetual symbols
    Symbols,

    /// Write a default config file
    Init {
        /// Destination path
        #[arg(default_value = quarry_lib::settings::DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

/// Log format as accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlobalOpts {
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
    pub(crate) log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let opts = GlobalOpts {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_format: cli.log_format.map(Into::into),
    };

    match command {
        Commands::Run(args) => commands::run::run(args, opts).await,
        Commands::Fetch {
            symbol,
            date,
            config,
            output_dir,
        } => commands::fetch::fetch(&symbol, &date, config.as_deref(), output_dir, opts).await,
        Commands::Symbols => commands::symbols::list_symbols(opts).await,
        Commands::Init { path } => commands::init::init(&path, opts),
    }
}
