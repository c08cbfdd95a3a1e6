use geo::{Area, BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{RTree, AABB};

use super::BoundingBox;

/// Geometries represents a collection of MultiPolygons indexed by an R-tree of their bounding boxes.
/// Shapes keep their position, so callers can zip them with attribute rows.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are stored but never returned by spatial queries.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Indices of shapes whose bounding box intersects the given rectangle.
    #[inline]
    pub(crate) fn candidates(&self, rect: &Rect<f64>) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        self.rtree.locate_in_envelope_intersecting(&envelope).map(|bbox| bbox.idx())
    }

    /// Unsigned area of every shape, in squared units of the current CRS.
    #[inline]
    pub(crate) fn areas(&self) -> Vec<f64> {
        self.shapes.iter().map(|shape| shape.unsigned_area()).collect()
    }
}

/// Smallest rectangle covering both inputs.
pub(crate) fn merge_rects(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        }
    )
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::*;

    fn square(x: f64, y: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y), (x: x + side, y: y), (x: x + side, y: y + side), (x: x, y: y + side),
        ]])
    }

    #[test]
    fn candidates_follow_bounding_boxes() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]);
        let query = Rect::new(Coord { x: 0.5, y: 0.5 }, Coord { x: 2.0, y: 2.0 });
        assert_eq!(geoms.candidates(&query).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn empty_shapes_keep_their_slot_but_are_never_candidates() {
        let geoms = Geometries::new(vec![MultiPolygon::new(vec![]), square(0.0, 0.0, 1.0)]);
        assert_eq!(geoms.shapes().len(), 2);
        let query = Rect::new(Coord { x: -10.0, y: -10.0 }, Coord { x: 10.0, y: 10.0 });
        assert_eq!(geoms.candidates(&query).collect::<Vec<_>>(), vec![1]);
        assert_eq!(geoms.areas(), vec![0.0, 1.0]);
    }
}
