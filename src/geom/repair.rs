use geo::{BooleanOps, CoordsIter, MultiPolygon};

/// Repair an invalid shape (self-intersections, bow-ties, overlapping parts) by normalizing
/// it through a boolean union with the empty shape, the equivalent of a zero-width buffer.
/// Returns `None` when the shape cannot be repaired (non-finite coordinates).
pub(crate) fn repair(shape: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    if !shape.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) { return None }
    if shape.0.is_empty() { return Some(shape.clone()) }

    Some(shape.union(&MultiPolygon::new(vec![])))
}
