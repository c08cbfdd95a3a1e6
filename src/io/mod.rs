//! Reading the source layers and writing the reach table.
//!
//! - `table` - CSV/Parquet reading into Polars DataFrames, typed column access
//! - `wkb` - Well-Known Binary polygon decoding for census geometries
//! - `geojson` - city boundary reading and grid export
//! - `census`, `trips` - typed records from the raw tables
//! - `output` - reach table as a DataFrame, atomic Parquet write

mod census;
mod geojson;
mod output;
mod table;
mod trips;
mod wkb;

pub use census::{age_counts_from_frame, census_layer_from_frame, read_age_counts, read_census_layer};
pub use geojson::{boundary_from_geojson, read_boundary, write_geojson};
pub use output::{reach_frame, write_reach_parquet};
pub use table::read_table;
pub use trips::{read_trips, trips_from_frame};
pub use wkb::decode_wkb;
