use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use polars::{frame::DataFrame, prelude::{Column, ParquetWriter}};

use crate::{common::PendingWrite, reach::{NeighborhoodTable, ReachMetrics}};

/// Key columns of the reach table.
const KEY_COLUMNS: [&str; 2] = ["h3_index", "tramo_edad"];

/// Lay out the expanded reach table: keys, own values, then the `_{k}ring` values (Int64).
pub fn reach_frame(table: &NeighborhoodTable) -> Result<DataFrame> {
    let rows = table.rows();
    let names = table.metric_columns();

    let own = rows.iter().map(|row| row.own.values()).collect::<Vec<_>>();
    let ring = rows.iter().map(|row| row.ring.values()).collect::<Vec<_>>();

    let mut columns = vec![
        Column::new(KEY_COLUMNS[0].into(), rows.iter().map(|row| row.cell.to_string()).collect::<Vec<_>>()),
        Column::new(KEY_COLUMNS[1].into(), rows.iter().map(|row| row.bracket.label()).collect::<Vec<_>>()),
    ];
    let width = ReachMetrics::COLUMNS.len();
    for (j, name) in names.iter().enumerate() {
        let source = if j < width { &own } else { &ring };
        let values = source.iter().map(|values| values[j % width]).collect::<Vec<i64>>();
        columns.push(Column::new(name.as_str().into(), values));
    }

    DataFrame::new(columns).context("[io::output] Failed to build the reach table")
}

/// Write the reach table to Parquet, replacing `path` only once the write has succeeded.
pub fn write_reach_parquet(table: &NeighborhoodTable, path: &Path) -> Result<()> {
    let mut df = reach_frame(table)?;
    let mut sink = PendingWrite::open(path)?;
    ParquetWriter::new(&mut sink)
        .finish(&mut df)
        .with_context(|| format!("[io::output] Failed to write Parquet to {}", path.display()))?;
    sink.finalize()?;

    info!("[io::output] wrote {} rows x {} columns to {}", df.height(), df.width(), path.display());
    Ok(())
}
