//! Combined resident and circulating population per cell, and its neighborhood expansion.

mod metrics;
mod neighborhood;
mod table;

pub use metrics::ReachMetrics;
pub use neighborhood::{NeighborhoodReach, NeighborhoodTable};
pub use table::{merge, CellReach, ReachTable};
