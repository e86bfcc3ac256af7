use anyhow::Result;
use clap::Parser;

use openlocate::{cli::{Cli, Commands}, commands::{analyze, inspect}};

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Inspect(args) => inspect::run(&cli, args),
        Commands::Analyze(args) => analyze::run(&cli, args),
    }
}
