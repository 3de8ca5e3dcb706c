use std::path::PathBuf;

use clap::{ArgAction, Parser};
use ncleg_logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "ncleg", version, about = "Harvest bill records from the NC General Assembly site")]
pub struct Cli {
    /// Chamber to harvest: H or S. Anything else harvests both.
    #[arg(short, long)]
    pub chamber: Option<String>,

    /// Legislative session, e.g. 2017
    #[arg(short, long)]
    pub session: Option<String>,

    /// Comma-separated bill numbers. Without it, numbers are probed from 1
    /// until a bill is not found.
    #[arg(short, long)]
    pub number: Option<String>,

    /// Write bills.json and manifest.json into this directory instead of
    /// JSON lines on stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// RON file with harvest and fetch settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bill lookup endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Log destination: terminal, file or both
    #[arg(long, value_parser = parse_log_destination)]
    pub log: Option<LogDestination>,

    /// Log file used by the file destination
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn parse_log_destination(raw: &str) -> Result<LogDestination, String> {
    LogDestination::parse(raw).ok_or_else(|| format!("unknown log destination {raw:?}"))
}
