use std::{fs::File, path::Path};

use anyhow::{bail, Context, Result};
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{Column, CsvReadOptions, DataType, ParquetReader},
};

/// Reads a CSV file with every column as text, so identifiers keep their leading zeros.
fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::table] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::table] Failed to read CSV from {:?}", path))
}

fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::table] Failed to open Parquet file: {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .with_context(|| format!("[io::table] Failed to read Parquet from {:?}", path))
}

/// Read a CSV or Parquet table, chosen by file extension.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => read_csv(path),
        Some("parquet" | "geoparquet") => read_parquet(path),
        _ => bail!("[io::table] Unsupported table format: {}", path.display()),
    }
}

/// Look up a column, naming the missing column in the error.
pub(super) fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .with_context(|| format!("[io::table] Missing column {name:?} (have {:?})", df.get_column_names()))
}

/// Column values as text; nulls stay `None`.
pub(super) fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = column(df, name)?.cast(&DataType::String)
        .with_context(|| format!("[io::table] Column {name:?} cannot be read as text"))?;
    Ok(column.str()?.into_iter().map(|value| value.map(str::to_string)).collect())
}

/// Column values as floats; nulls and unparseable text become `None`.
pub(super) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = column(df, name)?.cast(&DataType::Float64)
        .with_context(|| format!("[io::table] Column {name:?} cannot be read as numbers"))?;
    Ok(column.f64()?.into_iter().collect())
}

/// True for the numeric column types a census layer may carry as metrics.
pub(super) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 | DataType::Float32 | DataType::Float64
    )
}
