use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use polars::frame::DataFrame;

use crate::{
    config::TripColumns,
    mobility::{Endpoint, TripLeg},
    types::{AgeBracket, Gender},
};

use super::table::{float_values, read_table, text_values};

/// Text values of an optional column, or `None` (with a warning) when it is absent.
fn optional_text(df: &DataFrame, name: &str, what: &str) -> Result<Option<Vec<Option<String>>>> {
    if df.get_column_index(name).is_none() {
        warn!("[io::trips] column {name:?} not found; every {what} is unknown");
        return Ok(None);
    }
    text_values(df, name).map(Some)
}

/// Build trip legs from the raw table.
/// Card id, expansion factor, coordinates and administrative codes are mandatory columns;
/// a missing age or gender column falls back to the unknown category.
pub fn trips_from_frame(df: &DataFrame, columns: &TripColumns) -> Result<Vec<TripLeg>> {
    let cards = text_values(df, &columns.card_id)?;
    let factors = float_values(df, &columns.expansion_factor)?;
    let origin_lat = float_values(df, &columns.origin_lat)?;
    let origin_lon = float_values(df, &columns.origin_lon)?;
    let destination_lat = float_values(df, &columns.destination_lat)?;
    let destination_lon = float_values(df, &columns.destination_lon)?;
    let origin_code = float_values(df, &columns.origin_code)?;
    let destination_code = float_values(df, &columns.destination_code)?;
    let ages = optional_text(df, &columns.age, "age")?;
    let genders = optional_text(df, &columns.gender, "gender")?;

    let legs = (0..df.height())
        .map(|i| TripLeg {
            card_id: cards[i].as_deref().map(str::trim).filter(|card| !card.is_empty()).map(Arc::from),
            expansion_factor: factors[i],
            age: ages.as_ref().map_or(AgeBracket::Unknown, |ages| AgeBracket::from_raw(ages[i].as_deref())),
            gender: genders.as_ref().map_or(Gender::Other, |genders| Gender::from_code(genders[i].as_deref())),
            origin: Endpoint { lat: origin_lat[i], lon: origin_lon[i], admin_code: origin_code[i] },
            destination: Endpoint { lat: destination_lat[i], lon: destination_lon[i], admin_code: destination_code[i] },
        })
        .collect();

    Ok(legs)
}

/// Read trip legs from a CSV (or Parquet) file.
pub fn read_trips(path: &Path, columns: &TripColumns) -> Result<Vec<TripLeg>> {
    let df = read_table(path)?;
    let legs = trips_from_frame(&df, columns)
        .with_context(|| format!("[io::trips] Invalid trip table in {}", path.display()))?;
    info!("[io::trips] read {} trip legs from {}", legs.len(), path.display());
    Ok(legs)
}
