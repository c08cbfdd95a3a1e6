use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use log::{info, warn};
use polars::frame::DataFrame;

use crate::{
    census::{AgeCount, CensusLayer, CensusPolygon},
    config::CensusColumns,
    types::{round_count, AgeBracket, RadioId},
};

use super::{
    table::{column, float_values, is_numeric, read_table, text_values},
    wkb::decode_wkb,
};

/// Build the census layer from a table with an identifier and a WKB geometry column.
/// Every other numeric column becomes a named metric. Rows without identifier or with
/// undecodable geometry are skipped and counted.
pub fn census_layer_from_frame(df: &DataFrame, columns: &CensusColumns) -> Result<CensusLayer> {
    let ids = text_values(df, &columns.radio_id)?;
    let geometry = column(df, &columns.geometry)?;
    let blobs = geometry.as_materialized_series().binary()
        .with_context(|| format!("[io::census] Column {:?} is not a WKB binary column", columns.geometry))?;

    let metric_columns = df.get_columns().iter()
        .filter(|col| col.name().as_str() != columns.radio_id && col.name().as_str() != columns.geometry)
        .filter(|col| is_numeric(col.dtype()))
        .map(|col| Ok((col.name().to_string(), float_values(df, col.name().as_str())?)))
        .collect::<Result<Vec<_>>>()?;

    let mut polygons = Vec::with_capacity(df.height());
    let mut skipped = 0;
    for (i, (id, blob)) in ids.into_iter().zip(blobs.into_iter()).enumerate() {
        let (Some(id), Some(blob)) = (id, blob) else {
            skipped += 1;
            continue;
        };
        let shape: MultiPolygon<f64> = match decode_wkb(blob) {
            Ok(shape) => shape,
            Err(e) => {
                warn!("[io::census] skipping polygon {id}: {e:#}");
                skipped += 1;
                continue;
            }
        };

        let mut polygon = CensusPolygon::new(RadioId::new(&id), shape);
        for (name, values) in &metric_columns {
            if let Some(value) = values[i] {
                polygon = polygon.with_metric(name, value);
            }
        }
        polygons.push(polygon);
    }

    if skipped > 0 {
        warn!("[io::census] skipped {skipped} row(s) without identifier or readable geometry");
    }
    Ok(CensusLayer::new(polygons))
}

/// Read the census polygon layer (Parquet with WKB geometry).
pub fn read_census_layer(path: &Path, columns: &CensusColumns) -> Result<CensusLayer> {
    let df = read_table(path)?;
    let layer = census_layer_from_frame(&df, columns)
        .with_context(|| format!("[io::census] Invalid census layer in {}", path.display()))?;
    info!("[io::census] read {} census polygons from {}", layer.len(), path.display());
    Ok(layer)
}

/// Read per-polygon age-bracket counts from a long table.
/// Rows without identifier or count are skipped; missing labels become the unknown bracket.
pub fn age_counts_from_frame(df: &DataFrame, columns: &CensusColumns) -> Result<Vec<AgeCount>> {
    let ids = text_values(df, &columns.radio_id)?;
    let labels = text_values(df, &columns.age_bracket)?;
    let totals = float_values(df, &columns.count)?;

    let counts = ids.into_iter()
        .zip(labels)
        .zip(totals)
        .filter_map(|((id, label), total)| {
            Some(AgeCount {
                radio: RadioId::new(&id?),
                bracket: label.as_deref().map_or(AgeBracket::Unknown, AgeBracket::from_label),
                total: round_count(total?),
            })
        })
        .collect::<Vec<_>>();

    if counts.len() < df.height() {
        warn!("[io::census] skipped {} age row(s) without identifier or count", df.height() - counts.len());
    }
    Ok(counts)
}

/// Read the census age table (Parquet or CSV).
pub fn read_age_counts(path: &Path, columns: &CensusColumns) -> Result<Vec<AgeCount>> {
    let df = read_table(path)?;
    let counts = age_counts_from_frame(&df, columns)
        .with_context(|| format!("[io::census] Invalid census age table in {}", path.display()))?;
    info!("[io::census] read {} age rows from {}", counts.len(), path.display());
    Ok(counts)
}
