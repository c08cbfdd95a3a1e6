use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

use crate::{common::PendingWrite, grid::HexGrid};

/// Parse a ring: [[x, y], [x, y], ...], closing it if needed.
fn parse_ring(coords: &Value) -> Result<LineString<f64>> {
    let coords = coords.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Ring must be an array of positions"))?;

    let mut points = coords.iter()
        .map(|position| {
            let x = position.get(0).and_then(Value::as_f64);
            let y = position.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(anyhow!("[io::geojson] Invalid position: {position}")),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    if points.first() != points.last() {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

/// Parse Polygon coordinates: [exterior, hole, hole, ...].
fn parse_polygon(coords: &Value) -> Result<Polygon<f64>> {
    let rings = coords.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Polygon coordinates must be an array of rings"))?;
    let (exterior, holes) = rings.split_first()
        .ok_or_else(|| anyhow!("[io::geojson] Polygon has no exterior ring"))?;

    Ok(Polygon::new(
        parse_ring(exterior)?,
        holes.iter().map(parse_ring).collect::<Result<Vec<_>>>()?,
    ))
}

/// Collect the polygons of any GeoJSON object; non-polygonal geometries are skipped.
fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match value["type"].as_str() {
        Some("FeatureCollection") => {
            for feature in value["features"].as_array().into_iter().flatten() {
                collect_polygons(feature, out)?;
            }
        }
        Some("Feature") => collect_polygons(&value["geometry"], out)?,
        Some("GeometryCollection") => {
            for geometry in value["geometries"].as_array().into_iter().flatten() {
                collect_polygons(geometry, out)?;
            }
        }
        Some("Polygon") => out.push(parse_polygon(&value["coordinates"])?),
        Some("MultiPolygon") => {
            let parts = value["coordinates"].as_array()
                .ok_or_else(|| anyhow!("[io::geojson] MultiPolygon coordinates must be an array"))?;
            for part in parts {
                out.push(parse_polygon(part)?);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Union every polygon of a GeoJSON document into a single boundary.
pub fn boundary_from_geojson(value: &Value) -> Result<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    collect_polygons(value, &mut polygons)?;
    ensure!(!polygons.is_empty(), "[io::geojson] Boundary contains no Polygon or MultiPolygon geometry");

    let boundary = polygons.into_iter()
        .map(|polygon| MultiPolygon::new(vec![polygon]))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon::new(vec![]));
    Ok(boundary)
}

/// Read the city boundary from a GeoJSON file.
pub fn read_boundary(path: &Path) -> Result<MultiPolygon<f64>> {
    if !path.exists() {
        bail!("[io::geojson] Boundary file not found: {}", path.display());
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read boundary file: {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse GeoJSON: {}", path.display()))?;
    boundary_from_geojson(&value)
        .with_context(|| format!("[io::geojson] Invalid boundary in {}", path.display()))
}

/// Write a GeoJSON value to a file, replacing it atomically.
pub fn write_geojson(value: &Value, path: &Path) -> Result<()> {
    let mut sink = PendingWrite::open(path)?;
    serde_json::to_writer(&mut sink, value)
        .with_context(|| format!("[io::geojson] Failed to write GeoJSON to {}", path.display()))?;
    sink.finalize()
}

impl HexGrid {
    /// Export the grid cells as a GeoJSON FeatureCollection with an `h3_index` property.
    pub fn to_geojson(&self) -> Value {
        let features = self.cells().iter()
            .map(|cell| {
                let ring = cell.geometry().exterior().coords()
                    .map(|c| vec![c.x, c.y])
                    .collect::<Vec<_>>();
                json!({
                    "type": "Feature",
                    "geometry": { "type": "Polygon", "coordinates": [ring] },
                    "properties": { "h3_index": cell.id() },
                })
            })
            .collect::<Vec<_>>();

        json!({ "type": "FeatureCollection", "features": features })
    }
}
