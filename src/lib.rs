#![doc = "HexReach public API"]
mod common;
mod geom;

pub mod census;
pub mod config;
pub mod grid;
pub mod io;
pub mod mobility;
pub mod pipeline;
pub mod reach;
pub mod types;

#[doc(inline)]
pub use config::ReachConfig;

#[doc(inline)]
pub use grid::{build_grid, HexCell, HexGrid};

#[doc(inline)]
pub use pipeline::{build_city_grid, compute_reach, load_inputs, run, ReachInputs, ReachSummary};

#[doc(inline)]
pub use types::{AgeBracket, Gender, RadioId};
