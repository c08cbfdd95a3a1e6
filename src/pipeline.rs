//! End-to-end batch run: load the source layers, run every stage in order, write the reach table.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use geo::MultiPolygon;
use log::info;

use crate::{
    census::{compute_overlap, distribute, project, AgeCount, CensusLayer, SexRatioTable},
    config::ReachConfig,
    grid::{build_grid, HexGrid},
    io,
    mobility::{aggregate_trips, MobilitySettings, MobilityStats, TripLeg},
    reach::{merge, NeighborhoodTable, ReachMetrics},
};

/// In-memory source layers of a run.
#[derive(Debug, Clone)]
pub struct ReachInputs {
    pub boundary: MultiPolygon<f64>,
    pub census: CensusLayer,
    pub ages: Vec<AgeCount>,
    pub trips: Vec<TripLeg>,
}

impl Default for ReachInputs {
    fn default() -> Self {
        Self {
            boundary: MultiPolygon::new(vec![]),
            census: CensusLayer::default(),
            ages: Vec::new(),
            trips: Vec::new(),
        }
    }
}

/// Row counts and totals of a run.
#[derive(Debug, Clone, Default)]
pub struct ReachSummary {
    pub cells: usize,
    pub census_polygons: usize,
    pub overlap_records: usize,
    /// Census polygons whose proportions sum to less than one (partly outside the grid).
    pub partially_covered: usize,
    /// Age rows without a sex ratio, left out of the resident layer.
    pub unmatched_age_rows: usize,
    pub mobility: MobilityStats,
    pub rows: usize,
    /// Column sums of the unexpanded reach values.
    pub totals: ReachMetrics,
    pub output: Option<PathBuf>,
}

/// Tolerance below one for a polygon to count as fully covered.
const COVERAGE_EPSILON: f64 = 1e-6;

/// Build the output grid over the configured city boundary.
pub fn build_city_grid(config: &ReachConfig) -> Result<HexGrid> {
    let boundary = io::read_boundary(&config.boundary_path)?;
    Ok(build_grid(&boundary, config.grid_resolution()?))
}

/// Run every stage on in-memory inputs and return the expanded reach table.
pub fn compute_reach(inputs: &ReachInputs, config: &ReachConfig) -> Result<(NeighborhoodTable, ReachSummary)> {
    config.validate()?;
    ensure!(!inputs.census.is_empty(), "[pipeline] The census layer is empty");

    let grid = build_grid(&inputs.boundary, config.grid_resolution()?);
    ensure!(!grid.is_empty(), "[pipeline] The city boundary is empty or covers no cells");
    info!("[pipeline] grid: {} cells at resolution {}", grid.len(), grid.resolution());

    let overlap = compute_overlap(grid.cells(), &inputs.census, config.equal_area_proj.as_deref())?;
    let partially_covered = overlap.coverage().iter()
        .filter(|(_, sum)| *sum < 1.0 - COVERAGE_EPSILON)
        .count();
    if partially_covered > 0 {
        info!("[pipeline] {partially_covered} census polygon(s) extend beyond the grid and are under-counted");
    }

    let ratios = match &config.sex_ratios {
        Some(entries) => SexRatioTable::from_entries(entries).context("[pipeline] Invalid sex ratio table")?,
        None => SexRatioTable::default(),
    };
    let projection = project(&inputs.ages, &ratios);
    let residents = distribute(&overlap, &projection.counts);

    let mobility = aggregate_trips(&inputs.trips, &MobilitySettings::from_config(config)?);

    let reach = merge(&residents, &mobility.rows);
    let expanded = reach.expand(config.ring_radius);

    let totals = reach.totals();
    let summary = ReachSummary {
        cells: grid.len(),
        census_polygons: inputs.census.len(),
        overlap_records: overlap.len(),
        partially_covered,
        unmatched_age_rows: projection.unmatched.len(),
        mobility: mobility.stats,
        rows: expanded.len(),
        totals,
        output: None,
    };
    info!(
        "[pipeline] {} rows: {} residents, {} circulating, {} total reach",
        summary.rows, totals.total_residents, totals.total_circulating, totals.total_reach
    );

    Ok((expanded, summary))
}

/// Locate the trip table, downloading it into the cache directory when absent.
fn trips_source(config: &ReachConfig) -> Result<PathBuf> {
    let path = config.trips_file();
    #[cfg(feature = "download")]
    if let Some(url) = &config.trips_url {
        crate::common::fetch_if_absent(url, &path)?;
    }
    ensure!(path.exists(), "[pipeline] Trip table not found: {}", path.display());
    Ok(path)
}

/// Load every source layer named in the configuration.
pub fn load_inputs(config: &ReachConfig) -> Result<ReachInputs> {
    let boundary = io::read_boundary(&config.boundary_path)?;
    let census = io::read_census_layer(&config.census_geometry_path, &config.census_columns)?;
    let ages = io::read_age_counts(&config.census_ages_path, &config.census_columns)?;
    let trips = io::read_trips(&trips_source(config)?, &config.trip_columns)?;
    Ok(ReachInputs { boundary, census, ages, trips })
}

/// Full batch run; the output file is only replaced after every stage has succeeded.
pub fn run(config: &ReachConfig) -> Result<ReachSummary> {
    config.validate()?;
    let inputs = load_inputs(config)?;
    let (table, mut summary) = compute_reach(&inputs, config)?;
    write_output(&table, &config.output_path)?;
    summary.output = Some(config.output_path.clone());
    Ok(summary)
}

fn write_output(table: &NeighborhoodTable, path: &Path) -> Result<()> {
    io::write_reach_parquet(table, path)
        .with_context(|| format!("[pipeline] Failed to write the reach table to {}", path.display()))
}
