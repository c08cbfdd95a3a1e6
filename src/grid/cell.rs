use geo::{Coord, LineString, Polygon};
use h3o::{CellIndex, Resolution};

/// Boundary of a hexagonal cell as a lon/lat polygon.
pub fn cell_polygon(index: CellIndex) -> Polygon<f64> {
    let ring = index.boundary().iter()
        .map(|vertex| Coord { x: vertex.lng(), y: vertex.lat() })
        .collect::<Vec<_>>();
    Polygon::new(LineString::from(ring), vec![])
}

/// A single cell of the hexagonal grid, with its geometry in lon/lat.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    index: CellIndex,
    geometry: Polygon<f64>,
}

impl HexCell {
    pub fn new(index: CellIndex) -> Self {
        Self { index, geometry: cell_polygon(index) }
    }

    #[inline] pub fn index(&self) -> CellIndex { self.index }

    /// Opaque string key of the cell (lowercase hexadecimal index).
    #[inline] pub fn id(&self) -> String { self.index.to_string() }

    #[inline] pub fn resolution(&self) -> Resolution { self.index.resolution() }

    #[inline] pub fn geometry(&self) -> &Polygon<f64> { &self.geometry }
}

/// The set of cells covering a boundary at a single resolution, sorted by index.
#[derive(Debug, Clone)]
pub struct HexGrid {
    resolution: Resolution,
    cells: Vec<HexCell>,
}

impl HexGrid {
    /// Build a grid from arbitrary cell indices; duplicates are collapsed.
    /// Errors if an index does not match the grid resolution.
    pub fn from_indices(resolution: Resolution, indices: impl IntoIterator<Item = CellIndex>) -> anyhow::Result<Self> {
        let mut indices = indices.into_iter().collect::<Vec<_>>();
        if let Some(bad) = indices.iter().find(|index| index.resolution() != resolution) {
            anyhow::bail!("[grid] cell {bad} has resolution {}, expected {resolution}", bad.resolution());
        }
        indices.sort_unstable();
        indices.dedup();

        Ok(Self { resolution, cells: indices.into_iter().map(HexCell::new).collect() })
    }

    /// Wrap cells already sorted by index and free of duplicates.
    pub(super) fn from_sorted(resolution: Resolution, cells: Vec<HexCell>) -> Self {
        debug_assert!(cells.windows(2).all(|w| w[0].index < w[1].index), "cells must be sorted");
        Self { resolution, cells }
    }

    #[inline] pub fn resolution(&self) -> Resolution { self.resolution }

    #[inline] pub fn cells(&self) -> &[HexCell] { &self.cells }

    #[inline] pub fn len(&self) -> usize { self.cells.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Check whether the grid contains a cell.
    #[inline]
    pub fn contains(&self, index: CellIndex) -> bool {
        self.cells.binary_search_by(|cell| cell.index.cmp(&index)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, Contains, Point};
    use h3o::LatLng;

    use super::*;

    fn obelisco(resolution: Resolution) -> CellIndex {
        LatLng::new(-34.6037, -58.3816).unwrap().to_cell(resolution)
    }

    #[test]
    fn cell_polygon_is_a_closed_hexagon_around_its_center() {
        let index = obelisco(Resolution::Nine);
        let polygon = cell_polygon(index);

        // At least six vertices plus the closing one.
        assert!(polygon.exterior().0.len() >= 7);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
        assert!(polygon.unsigned_area() > 0.0);

        let center = LatLng::from(index);
        assert!(polygon.contains(&Point::new(center.lng(), center.lat())));
    }

    #[test]
    fn grid_from_indices_sorts_and_dedups() {
        let center = obelisco(Resolution::Nine);
        let ring = center.grid_disk::<Vec<_>>(1);
        let mut input = ring.clone();
        input.extend(ring.iter().copied());

        let grid = HexGrid::from_indices(Resolution::Nine, input).unwrap();
        assert_eq!(grid.len(), 7);
        assert!(grid.cells().windows(2).all(|w| w[0].index() < w[1].index()));
        assert!(grid.contains(center));
        assert_eq!(grid.cells()[0].resolution(), Resolution::Nine);
    }

    #[test]
    fn grid_from_indices_rejects_mixed_resolutions() {
        let fine = obelisco(Resolution::Ten);
        assert!(HexGrid::from_indices(Resolution::Nine, [fine]).is_err());
    }

    #[test]
    fn cell_ids_are_lowercase_hex() {
        let cell = HexCell::new(obelisco(Resolution::Nine));
        let id = cell.id();
        assert_eq!(id.len(), 15);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(id.parse::<CellIndex>().unwrap(), cell.index());
    }
}
