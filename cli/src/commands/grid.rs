use std::path::PathBuf;

use anyhow::Result;
use hexreach::{io::write_geojson, ReachConfig};
use log::info;

use super::assert_not_stdout;

pub fn run(config: ReachConfig, args: &crate::cli::GridArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./grid.geojson"));
    assert_not_stdout(&out_path)?;

    info!("[grid] covering {} at resolution {}", config.boundary_path.display(), config.resolution);
    let grid = hexreach::build_city_grid(&config)?;

    write_geojson(&grid.to_geojson(), &out_path)?;
    info!("[grid] wrote {} cells to {}", grid.len(), out_path.display());

    Ok(())
}
