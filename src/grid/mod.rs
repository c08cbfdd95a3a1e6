mod builder;
mod cell;

pub use builder::build_grid;
pub use cell::{cell_polygon, HexCell, HexGrid};
