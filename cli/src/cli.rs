use std::path::PathBuf;

/// Population reach per hexagonal cell (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "hexreach", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG overrides it
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file; defaults are used for missing fields
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Root of the default data layout (external/, processed/), defaults to "./data"
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Grid resolution (0-15)
    #[arg(short, long, global = true)]
    pub resolution: Option<u8>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Compute the reach table and write it as Parquet (forbids stdout)
    Run(RunArgs),

    /// Export the grid over the city boundary as GeoJSON (forbids stdout)
    Grid(GridArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Output Parquet file, defaults to the configured output path
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Neighborhood radius in grid steps
    #[arg(long)]
    pub ring: Option<u32>,

    /// Resolution used to locate trip endpoints before rolling up
    #[arg(long)]
    pub fine_resolution: Option<u8>,
}

#[derive(clap::Args, Debug)]
pub struct GridArgs {
    /// Output GeoJSON file, defaults to "./grid.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
