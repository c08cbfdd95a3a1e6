use std::collections::BTreeMap;

use ahash::AHashSet;
use geo::{BoundingRect, MultiPolygon, Rect};
use log::warn;

use crate::{geom::merge_rects, types::RadioId};

/// A census polygon with its identifier and raw metrics (lon/lat geometry).
#[derive(Debug, Clone, PartialEq)]
pub struct CensusPolygon {
    pub id: RadioId,
    pub geometry: MultiPolygon<f64>,
    pub metrics: BTreeMap<String, f64>,
}

impl CensusPolygon {
    pub fn new(id: impl Into<RadioId>, geometry: MultiPolygon<f64>) -> Self {
        Self { id: id.into(), geometry, metrics: BTreeMap::new() }
    }

    /// Attach a named raw metric (e.g. total population).
    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    #[inline] pub fn metric(&self, name: &str) -> Option<f64> { self.metrics.get(name).copied() }
}

/// The census polygon layer, unique by identifier.
#[derive(Debug, Clone, Default)]
pub struct CensusLayer {
    polygons: Vec<CensusPolygon>,
}

impl CensusLayer {
    /// Build a layer; later polygons repeating an identifier are discarded with a warning.
    pub fn new(polygons: Vec<CensusPolygon>) -> Self {
        let mut seen = AHashSet::with_capacity(polygons.len());
        let before = polygons.len();
        let polygons = polygons.into_iter()
            .filter(|polygon| seen.insert(polygon.id.clone()))
            .collect::<Vec<_>>();

        if polygons.len() < before {
            warn!("[census] discarded {} polygon(s) with a repeated identifier", before - polygons.len());
        }

        Self { polygons }
    }

    #[inline] pub fn len(&self) -> usize { self.polygons.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.polygons.is_empty() }

    #[inline] pub fn polygons(&self) -> &[CensusPolygon] { &self.polygons }

    /// Lon/lat bounding rectangle of the whole layer.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.polygons.iter()
            .filter_map(|polygon| polygon.geometry.bounding_rect())
            .reduce(|a, b| merge_rects(&a, &b))
    }
}
