use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon, Rect};
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// PROJ.4 string of the geographic CRS every input layer is expressed in.
const SOURCE_GEOG_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Projection from WGS84 lon/lat to an equal-area, meter-based CRS, so that areas
/// measured in different latitudes stay comparable.
pub(crate) struct EqualAreaProjection {
    from: Proj4,
    to: Proj4,
    definition: String,
}

impl EqualAreaProjection {
    /// Lambert azimuthal equal-area projection centered on the given lon/lat extent.
    pub(crate) fn centered_on(extent: &Rect<f64>) -> Result<Self> {
        let center = extent.center();
        Self::from_definition(&format!(
            "+proj=laea +lat_0={} +lon_0={} +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs +type=crs",
            center.y, center.x
        ))
    }

    /// Target CRS given as a PROJ.4 string; must be projected (meters), not geographic.
    pub(crate) fn from_definition(definition: &str) -> Result<Self> {
        let from = Proj4::from_proj_string(SOURCE_GEOG_PROJ4)
            .with_context(|| anyhow!("failed to build source PROJ.4: {SOURCE_GEOG_PROJ4}"))?;
        let to = Proj4::from_proj_string(definition)
            .with_context(|| anyhow!("failed to build target PROJ.4: {definition}"))?;
        Ok(Self { from, to, definition: definition.to_string() })
    }

    /// PROJ.4 definition of the target CRS.
    #[inline] pub(crate) fn definition(&self) -> &str { &self.definition }

    /// Reproject a lon/lat shape into the target CRS (meters).
    pub(crate) fn project(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        let (from, to) = (&self.from, &self.to);

        // Map coords → radians in, meters out.
        shape.try_map_coords(move |coord: Coord<f64>| {
            let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
            transform(from, to, &mut point)
                .with_context(|| format!("CRS transform failed at ({}, {})", coord.x, coord.y))?;
            if !(point.0.is_finite() && point.1.is_finite()) {
                return Err(anyhow!("CRS transform produced non-finite output at ({}, {})", coord.x, coord.y));
            }
            Ok(Coord { x: point.0, y: point.1 })
        })
    }
}
