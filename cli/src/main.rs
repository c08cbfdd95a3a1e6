mod cli;
mod commands;

use std::path::Path;

use anyhow::Result;
use hexreach::ReachConfig;

use cli::{Cli, Commands};
use commands::{grid, run};

/// Map `-v` counts onto a default log filter; RUST_LOG still wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Configuration from the file (or defaults), with global flag overrides applied.
fn load_config(cli: &Cli) -> Result<ReachConfig> {
    let mut config = match &cli.config {
        Some(path) => ReachConfig::from_json_file(path)?,
        None => ReachConfig::with_data_dir(cli.data_dir.as_deref().unwrap_or(Path::new("data"))),
    };
    if let Some(resolution) = cli.resolution {
        config.resolution = resolution;
        config.fine_resolution = config.fine_resolution.max(resolution);
    }
    Ok(config)
}

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Run(args) => run::run(config, args),
        Commands::Grid(args) => grid::run(config, args),
    }
}

fn main() -> Result<()> { run() }
