use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "rsi-monitor", version, about = "Scans perpetuals for overbought RSI and alerts on Telegram")]
pub struct Cli {
    /// JSON config file. Defaults to ./config.json when present.
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// Run a single scan, send its status report, and exit.
    #[clap(long)]
    pub once: bool,

    /// Log messages instead of sending them to Telegram.
    #[clap(long)]
    pub dry_run: bool,
}
