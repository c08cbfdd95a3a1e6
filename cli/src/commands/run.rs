use anyhow::Result;
use hexreach::ReachConfig;
use log::info;

use super::assert_not_stdout;

pub fn run(mut config: ReachConfig, args: &crate::cli::RunArgs) -> Result<()> {
    if let Some(output) = &args.output {
        assert_not_stdout(output)?;
        config.output_path = output.clone();
    }
    if let Some(ring) = args.ring {
        config.ring_radius = ring;
    }
    if let Some(fine) = args.fine_resolution {
        config.fine_resolution = fine;
    }
    config.validate()?;

    info!("[run] resolution {} (endpoints at {}), {}-ring reach", config.resolution, config.fine_resolution, config.ring_radius);
    let summary = hexreach::run(&config)?;

    info!(
        "[run] {} cells, {} census polygons ({} partly outside the grid), {} unmatched age rows",
        summary.cells, summary.census_polygons, summary.partially_covered, summary.unmatched_age_rows
    );
    info!(
        "[run] trips: {} legs, {} incomplete, {} duplicates, {} counted",
        summary.mobility.legs, summary.mobility.incomplete_legs, summary.mobility.duplicates, summary.mobility.counted
    );
    info!(
        "[run] wrote {} rows to {} (residents {}, circulating {}, reach {})",
        summary.rows,
        config.output_path.display(),
        summary.totals.total_residents,
        summary.totals.total_circulating,
        summary.totals.total_reach,
    );

    Ok(())
}
