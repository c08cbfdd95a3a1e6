use ahash::AHashMap;
use anyhow::{Context, Result};
use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon};
use h3o::CellIndex;
use log::{debug, info, warn};

use crate::{
    geom::{merge_rects, repair, EqualAreaProjection, Geometries},
    grid::HexCell,
    types::RadioId,
};

use super::CensusLayer;

/// Share of a census polygon's area that falls inside a cell (areas in m² of the equal-area CRS).
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRecord {
    pub cell: CellIndex,
    pub radio: RadioId,
    pub intersection_area: f64,
    pub parent_area: f64,
    /// `intersection_area / parent_area`, or 0 when the parent has no area.
    pub proportion: f64,
}

/// A census metric apportioned to one (cell, polygon) intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedValue {
    pub cell: CellIndex,
    pub radio: RadioId,
    /// `metric * proportion`; `None` when the polygon does not carry the metric.
    pub value: Option<f64>,
}

/// Result of overlaying the hexagonal grid with the census layer.
#[derive(Debug, Clone, Default)]
pub struct OverlapTable {
    records: Vec<OverlapRecord>,
    dropped_cells: usize,
    dropped_polygons: usize,
}

impl OverlapTable {
    #[inline] pub fn records(&self) -> &[OverlapRecord] { &self.records }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Number of cells whose geometry could not be repaired or projected.
    #[inline] pub fn dropped_cells(&self) -> usize { self.dropped_cells }

    /// Number of census polygons whose geometry could not be repaired or projected.
    #[inline] pub fn dropped_polygons(&self) -> usize { self.dropped_polygons }

    /// Sum of proportions per census polygon, sorted by identifier.
    /// Values below 1 measure how much of a polygon lies outside the grid.
    pub fn coverage(&self) -> Vec<(RadioId, f64)> {
        let mut sums = AHashMap::<&RadioId, f64>::new();
        for record in &self.records {
            *sums.entry(&record.radio).or_default() += record.proportion;
        }
        let mut coverage = sums.into_iter()
            .map(|(radio, sum)| (radio.clone(), sum))
            .collect::<Vec<_>>();
        coverage.sort_by(|a, b| a.0.cmp(&b.0));
        coverage
    }

    /// Apportion a named census metric to every intersection as `metric * proportion`.
    pub fn allocate(&self, layer: &CensusLayer, metric: &str) -> Vec<AllocatedValue> {
        let values = layer.polygons().iter()
            .map(|polygon| (&polygon.id, polygon.metric(metric)))
            .collect::<AHashMap<_, _>>();

        self.records.iter()
            .map(|record| AllocatedValue {
                cell: record.cell,
                radio: record.radio.clone(),
                value: values.get(&record.radio).copied().flatten()
                    .map(|value| value * record.proportion),
            })
            .collect()
    }
}

/// Projected areas at or below this many m² are reprojection noise, not parent area.
const MIN_PARENT_AREA: f64 = 1e-6;

/// Area of a census polygon for apportioning; 0 when the polygon is flat before or after projection.
fn parent_area(raw: &MultiPolygon<f64>, projected: f64) -> f64 {
    if raw.unsigned_area() <= 0.0 || projected <= MIN_PARENT_AREA { 0.0 } else { projected }
}

/// Project then repair a lon/lat shape; `None` if either step fails.
fn prepare(shape: &MultiPolygon<f64>, projection: &EqualAreaProjection) -> Option<MultiPolygon<f64>> {
    projection.project(shape).ok().and_then(|projected| repair(&projected))
}

/// Overlay grid cells with census polygons and compute, for every intersecting pair, the
/// share of the polygon's area that falls in the cell.
///
/// Areas are measured after reprojecting both layers to an equal-area CRS (`equal_area_proj`,
/// or a Lambert azimuthal equal-area projection centered on the data), and after repairing
/// invalid geometries. Pairs that only touch are kept with a zero proportion.
pub fn compute_overlap(cells: &[HexCell], layer: &CensusLayer, equal_area_proj: Option<&str>) -> Result<OverlapTable> {
    let cell_shapes = cells.iter()
        .map(|cell| MultiPolygon::new(vec![cell.geometry().clone()]))
        .collect::<Vec<_>>();

    let extent = cell_shapes.iter()
        .filter_map(|shape| shape.bounding_rect())
        .chain(layer.bounds())
        .reduce(|a, b| merge_rects(&a, &b));
    let Some(extent) = extent else { return Ok(OverlapTable::default()) };

    let projection = match equal_area_proj {
        Some(definition) => EqualAreaProjection::from_definition(definition),
        None => EqualAreaProjection::centered_on(&extent),
    }.context("[census::overlap] Failed to set up the equal-area projection")?;
    debug!("[census::overlap] measuring areas in {}", projection.definition());

    // Unrepairable polygons become empty shapes, which the R-tree never returns.
    let mut dropped_polygons = 0;
    let radios = Geometries::new(
        layer.polygons().iter()
            .map(|polygon| prepare(&polygon.geometry, &projection).unwrap_or_else(|| {
                dropped_polygons += 1;
                MultiPolygon::new(vec![])
            }))
            .collect()
    );
    let radio_areas = layer.polygons().iter()
        .zip(radios.areas())
        .map(|(polygon, projected)| parent_area(&polygon.geometry, projected))
        .collect::<Vec<_>>();

    let mut dropped_cells = 0;
    let mut records = Vec::new();
    for (cell, shape) in cells.iter().zip(&cell_shapes) {
        let Some(shape) = prepare(shape, &projection) else {
            dropped_cells += 1;
            continue;
        };
        let Some(rect) = shape.bounding_rect() else { continue };

        for j in radios.candidates(&rect) {
            let radio = &radios.shapes()[j];
            if !shape.intersects(radio) { continue }

            let intersection_area = shape.intersection(radio).unsigned_area();
            let parent_area = radio_areas[j];
            let proportion = if parent_area > 0.0 { intersection_area / parent_area } else { 0.0 };

            records.push(OverlapRecord {
                cell: cell.index(),
                radio: layer.polygons()[j].id.clone(),
                intersection_area,
                parent_area,
                proportion,
            });
        }
    }

    if dropped_polygons > 0 {
        warn!("[census::overlap] dropped {dropped_polygons} census polygon(s) with unrepairable geometry");
    }
    if dropped_cells > 0 {
        warn!("[census::overlap] dropped {dropped_cells} cell(s) with unrepairable geometry");
    }

    records.sort_by(|a, b| a.cell.cmp(&b.cell).then_with(|| a.radio.cmp(&b.radio)));
    info!(
        "[census::overlap] {} intersections between {} cells and {} census polygons",
        records.len(), cells.len(), layer.len()
    );

    Ok(OverlapTable { records, dropped_cells, dropped_polygons })
}
