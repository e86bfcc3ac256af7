use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Site-selection CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "openlocate", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the layers of a study directory
    Inspect(InspectArgs),

    /// Run the five-stage site-selection funnel
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Study directory holding regions/sites/linear/areas GeoJSON files
    #[arg(value_hint = ValueHint::DirPath)]
    pub study: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Study directory holding regions/sites/linear/areas GeoJSON files
    #[arg(value_hint = ValueHint::DirPath)]
    pub study: PathBuf,

    /// Analysis config file (JSON)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print one stage's records instead of the funnel summary
    #[arg(long)]
    pub stage: Option<String>,
}
