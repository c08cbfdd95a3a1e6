mod demographic;
mod distribute;
mod layer;
mod overlap;

pub use demographic::{project, split_by_sex_ratio, AgeCount, AgeGenderCount, Projection, SexRatio, SexRatioTable};
pub use distribute::{distribute, CellPopulation};
pub use layer::{CensusLayer, CensusPolygon};
pub use overlap::{compute_overlap, AllocatedValue, OverlapRecord, OverlapTable};
