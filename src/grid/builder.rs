use std::collections::{BTreeSet, VecDeque};

use ahash::AHashSet;
use geo::{Area, InteriorPoint, MultiPolygon, Polygon, Relate};
use h3o::{CellIndex, LatLng, Resolution};
use log::debug;

use super::{cell::cell_polygon, HexCell, HexGrid};

/// True if the hexagon shares interior area with the polygon (merely touching is not enough).
fn overlaps_interior(cell: &Polygon<f64>, part: &Polygon<f64>) -> bool {
    let im = cell.relate(part);
    im.is_intersects() && !im.is_touches()
}

/// Flood-fill outwards from the cells around the part's interior point, keeping every cell
/// whose hexagon overlaps the part. Holes are honored by the overlap test itself.
fn cover_part(part: &Polygon<f64>, resolution: Resolution, cells: &mut BTreeSet<CellIndex>) {
    let Some(seed) = part.interior_point()
        .and_then(|point| LatLng::new(point.y(), point.x()).ok())
        .map(|latlng| latlng.to_cell(resolution))
    else { return };

    // Start from the whole first ring: the seed hexagon's planar outline may miss the point.
    let mut visited = seed.grid_disk::<AHashSet<_>>(1);
    let mut queue = visited.iter().copied().collect::<VecDeque<_>>();

    while let Some(index) = queue.pop_front() {
        if !overlaps_interior(&cell_polygon(index), part) { continue }
        cells.insert(index);

        for neighbor in index.grid_disk::<Vec<_>>(1) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
}

/// Returns the minimal set of cells at `resolution` whose area intersects the boundary.
/// Every part of a multi-part boundary is covered with its holes; degenerate (empty or
/// zero-area) boundaries yield an empty grid.
pub fn build_grid(boundary: &MultiPolygon<f64>, resolution: Resolution) -> HexGrid {
    let mut cells = BTreeSet::new();

    for part in boundary.iter().filter(|part| part.unsigned_area() > 0.0) {
        cover_part(part, resolution, &mut cells);
    }

    debug!("[grid] {} cells at resolution {} cover {} boundary part(s)", cells.len(), resolution, boundary.0.len());

    HexGrid::from_sorted(resolution, cells.into_iter().map(HexCell::new).collect())
}

#[cfg(test)]
mod tests {
    use geo::{polygon, BooleanOps, Contains, LineString, MultiPolygon, Point};

    use super::*;

    fn center_cell() -> CellIndex {
        LatLng::new(-34.6037, -58.3816).unwrap().to_cell(Resolution::Nine)
    }

    fn union_of(cells: &[CellIndex]) -> MultiPolygon<f64> {
        cells.iter()
            .map(|&cell| MultiPolygon::new(vec![cell_polygon(cell)]))
            .reduce(|a, b| a.union(&b))
            .unwrap()
    }

    #[test]
    fn empty_and_flat_boundaries_give_empty_grids() {
        assert!(build_grid(&MultiPolygon::new(vec![]), Resolution::Nine).is_empty());

        let flat = MultiPolygon::new(vec![polygon![
            (x: -58.40, y: -34.60), (x: -58.38, y: -34.60), (x: -58.36, y: -34.60),
        ]]);
        assert!(build_grid(&flat, Resolution::Nine).is_empty());
    }

    #[test]
    fn small_boundary_inside_one_cell_yields_that_cell() {
        let center = center_cell();
        let c = LatLng::from(center);
        let d = 1e-5;
        let tiny = MultiPolygon::new(vec![polygon![
            (x: c.lng() - d, y: c.lat() - d), (x: c.lng() + d, y: c.lat() - d),
            (x: c.lng() + d, y: c.lat() + d), (x: c.lng() - d, y: c.lat() + d),
        ]]);

        let grid = build_grid(&tiny, Resolution::Nine);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cells()[0].index(), center);
    }

    #[test]
    fn every_cell_overlapping_the_boundary_is_returned() {
        let center = center_cell();
        let c = LatLng::from(center);
        let d = 0.01;
        let square = MultiPolygon::new(vec![polygon![
            (x: c.lng() - d, y: c.lat() - d), (x: c.lng() + d, y: c.lat() - d),
            (x: c.lng() + d, y: c.lat() + d), (x: c.lng() - d, y: c.lat() + d),
        ]]);

        let grid = build_grid(&square, Resolution::Nine);
        assert!(grid.len() > 20);

        // Every returned cell overlaps, and every cell holding a sample point of the square is present.
        for cell in grid.cells() {
            assert!(overlaps_interior(cell.geometry(), &square.0[0]));
        }
        for i in 0..=10 {
            for j in 0..=10 {
                let lng = c.lng() - d * 0.99 + (i as f64) * d * 0.198;
                let lat = c.lat() - d * 0.99 + (j as f64) * d * 0.198;
                let index = LatLng::new(lat, lng).unwrap().to_cell(Resolution::Nine);
                assert!(grid.contains(index), "missing cell {index} at ({lng}, {lat})");
            }
        }
    }

    #[test]
    fn holes_exclude_the_cells_they_fully_contain() {
        let center = center_cell();
        let c = LatLng::from(center);
        let (outer, inner) = (0.02, 0.008);
        let ring = |d: f64| LineString::from(vec![
            (c.lng() - d, c.lat() - d), (c.lng() + d, c.lat() - d),
            (c.lng() + d, c.lat() + d), (c.lng() - d, c.lat() + d), (c.lng() - d, c.lat() - d),
        ]);
        let with_hole = MultiPolygon::new(vec![Polygon::new(ring(outer), vec![ring(inner)])]);
        let solid = MultiPolygon::new(vec![Polygon::new(ring(outer), vec![])]);

        let holed_grid = build_grid(&with_hole, Resolution::Nine);
        let solid_grid = build_grid(&solid, Resolution::Nine);

        assert!(!holed_grid.contains(center));
        assert!(solid_grid.contains(center));
        assert!(holed_grid.len() < solid_grid.len());

        let hole = Polygon::new(ring(inner), vec![]);
        for cell in holed_grid.cells() {
            assert!(!hole.contains(cell.geometry()));
        }
    }

    #[test]
    fn disjoint_parts_are_all_covered() {
        let a = center_cell();
        let far = LatLng::new(-34.55, -58.45).unwrap().to_cell(Resolution::Nine);
        let boundary = MultiPolygon::new(
            union_of(&[a]).0.into_iter().chain(union_of(&[far]).0).collect()
        );

        let grid = build_grid(&boundary, Resolution::Nine);
        assert!(grid.contains(a));
        assert!(grid.contains(far));
    }

    #[test]
    fn union_of_cells_is_covered_by_at_least_those_cells() {
        let center = center_cell();
        let cells = center.grid_disk::<Vec<_>>(1);
        let grid = build_grid(&union_of(&cells), Resolution::Nine);

        for cell in &cells {
            assert!(grid.contains(*cell));
        }
        let c = LatLng::from(center);
        assert!(union_of(&cells).contains(&Point::new(c.lng(), c.lat())));
    }
}
