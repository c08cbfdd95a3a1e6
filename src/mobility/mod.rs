//! Circulating population from public-transport trip legs.

mod aggregate;
mod leg;

pub use aggregate::{aggregate_trips, CellMobility, MobilitySettings, MobilityStats, MobilityTable};
pub use leg::{Endpoint, TripLeg};
