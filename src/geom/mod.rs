mod bbox;
mod geom;
mod proj;
mod repair;

use bbox::BoundingBox;
pub(crate) use geom::{merge_rects, Geometries};
pub(crate) use proj::EqualAreaProjection;
pub(crate) use repair::repair;
