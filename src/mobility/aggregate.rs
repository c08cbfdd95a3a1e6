use std::{collections::BTreeMap, sync::Arc};

use ahash::AHashSet;
use anyhow::Result;
use h3o::{CellIndex, Resolution};
use log::{info, warn};

use crate::{
    config::{CodeRange, ReachConfig},
    types::{round_count, AgeBracket, Gender},
};

use super::TripLeg;

/// Parameters of the trip aggregation, taken from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct MobilitySettings {
    pub resolution: Resolution,
    pub fine_resolution: Resolution,
    pub city_codes: CodeRange,
}

impl MobilitySettings {
    pub fn from_config(config: &ReachConfig) -> Result<Self> {
        Ok(Self {
            resolution: config.grid_resolution()?,
            fine_resolution: config.endpoint_resolution()?,
            city_codes: config.city_codes,
        })
    }
}

/// Circulating population of one cell and age bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMobility {
    pub cell: CellIndex,
    pub bracket: AgeBracket,
    pub men: i64,
    pub women: i64,
    pub other: i64,
    pub total: i64,
}

/// Row counts of each filtering step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MobilityStats {
    pub legs: usize,
    /// Legs without a card id or expansion factor.
    pub incomplete_legs: usize,
    /// Endpoint rows outside the city code range.
    pub outside_city: usize,
    /// In-city endpoint rows with missing or invalid coordinates.
    pub unlocated: usize,
    /// Endpoint rows dropped because the card was already seen in the cell.
    pub duplicates: usize,
    /// Distinct (cell, card) pairs counted.
    pub counted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MobilityTable {
    pub rows: Vec<CellMobility>,
    pub stats: MobilityStats,
}

/// Weighted sums by gender, before rounding.
#[derive(Default, Clone, Copy)]
struct GenderSums([f64; 3]);

impl GenderSums {
    fn add(&mut self, gender: Gender, value: f64) {
        let slot = match gender {
            Gender::Men => 0,
            Gender::Women => 1,
            Gender::Other => 2,
        };
        self.0[slot] += value;
    }
}

/// Aggregate trip legs into per-cell circulating counts.
///
/// Every leg yields an origin row and a destination row; only rows inside the city are kept.
/// A card is counted at most once per cell: the first occurrence wins, with all origin rows
/// ahead of all destination rows and legs in input order. Expansion factors are then summed
/// by (cell, bracket, gender). Each gender sum is rounded on its own, and the total is the
/// rounded sum of the unrounded gender sums.
pub fn aggregate_trips(legs: &[TripLeg], settings: &MobilitySettings) -> MobilityTable {
    let mut stats = MobilityStats { legs: legs.len(), ..Default::default() };

    let weighted = legs.iter()
        .filter_map(|leg| leg.weight().map(|(card, factor)| (leg, card, factor)))
        .collect::<Vec<_>>();
    stats.incomplete_legs = legs.len() - weighted.len();
    if stats.incomplete_legs > 0 {
        warn!("[mobility] dropped {} leg(s) without card id or expansion factor", stats.incomplete_legs);
    }

    let mut seen = AHashSet::<(CellIndex, &Arc<str>)>::new();
    let mut sums = BTreeMap::<(CellIndex, AgeBracket), GenderSums>::new();

    for destination in [false, true] {
        for &(leg, card, factor) in &weighted {
            let endpoint = if destination { &leg.destination } else { &leg.origin };
            if !endpoint.in_city(&settings.city_codes) {
                stats.outside_city += 1;
                continue;
            }
            let Some(cell) = endpoint.locate(settings.fine_resolution, settings.resolution) else {
                stats.unlocated += 1;
                continue;
            };
            if !seen.insert((cell, card)) {
                stats.duplicates += 1;
                continue;
            }
            sums.entry((cell, leg.age.clone())).or_default().add(leg.gender, factor);
        }
    }
    stats.counted = seen.len();

    if stats.unlocated > 0 {
        warn!("[mobility] {} in-city endpoint(s) have no valid coordinates", stats.unlocated);
    }

    let rows = sums.into_iter()
        .map(|((cell, bracket), GenderSums([men, women, other]))| CellMobility {
            cell,
            bracket,
            men: round_count(men),
            women: round_count(women),
            other: round_count(other),
            total: round_count(men + women + other),
        })
        .collect::<Vec<_>>();

    info!(
        "[mobility] {} legs -> {} endpoint rows outside the city, {} duplicates, {} counted, {} (cell, bracket) rows",
        stats.legs, stats.outside_city, stats.duplicates, stats.counted, rows.len()
    );

    MobilityTable { rows, stats }
}

#[cfg(test)]
mod tests {
    use h3o::LatLng;

    use super::*;
    use crate::mobility::Endpoint;

    const HOME: (f64, f64) = (-34.6037, -58.3816);
    const WORK: (f64, f64) = (-34.5890, -58.4000);

    fn settings() -> MobilitySettings {
        MobilitySettings::from_config(&ReachConfig::default()).unwrap()
    }

    fn cell_of((lat, lon): (f64, f64)) -> CellIndex {
        LatLng::new(lat, lon).unwrap().to_cell(Resolution::Ten).parent(Resolution::Nine).unwrap()
    }

    fn leg(card: &str, factor: f64, gender: Gender, from: (f64, f64), to: (f64, f64)) -> TripLeg {
        TripLeg {
            card_id: Some(Arc::from(card)),
            expansion_factor: Some(factor),
            age: AgeBracket::Span(20),
            gender,
            origin: Endpoint::new(from.0, from.1, 2001.0),
            destination: Endpoint::new(to.0, to.1, 3005.0),
        }
    }

    #[test]
    fn same_card_and_destination_counts_once() {
        let legs = vec![
            leg("c1", 1.0, Gender::Women, HOME, WORK),
            leg("c1", 1.0, Gender::Women, WORK, WORK),
        ];
        let table = aggregate_trips(&legs, &settings());

        let work = table.rows.iter().find(|row| row.cell == cell_of(WORK)).unwrap();
        assert_eq!(work.total, 1);
        assert_eq!(work.women, 1);
        let home = table.rows.iter().find(|row| row.cell == cell_of(HOME)).unwrap();
        assert_eq!(home.total, 1);
        assert_eq!(table.stats.counted, 2);
        assert_eq!(table.stats.duplicates, 2);
    }

    #[test]
    fn duplicating_legs_leaves_the_aggregate_unchanged() {
        let legs = vec![
            leg("c1", 2.5, Gender::Men, HOME, WORK),
            leg("c2", 1.5, Gender::Women, WORK, HOME),
            leg("c3", 3.0, Gender::Other, HOME, HOME),
        ];
        let doubled = legs.iter().chain(&legs).cloned().collect::<Vec<_>>();

        let once = aggregate_trips(&legs, &settings());
        let twice = aggregate_trips(&doubled, &settings());
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn first_occurrence_keeps_its_attributes() {
        let mut second = leg("c1", 9.0, Gender::Men, WORK, HOME);
        second.age = AgeBracket::Span(60);
        let legs = vec![leg("c1", 1.0, Gender::Women, HOME, WORK), second];

        let table = aggregate_trips(&legs, &settings());
        // Origins come first: the second leg's origin claims WORK before the first leg arrives there.
        let work = table.rows.iter().find(|row| row.cell == cell_of(WORK)).unwrap();
        assert_eq!(work.bracket, AgeBracket::Span(60));
        assert_eq!(work.men, 9);
        let home = table.rows.iter().find(|row| row.cell == cell_of(HOME)).unwrap();
        assert_eq!(home.bracket, AgeBracket::Span(20));
        assert_eq!(home.women, 1);
    }

    #[test]
    fn out_of_city_and_incomplete_legs_are_dropped() {
        let mut outside = leg("c1", 1.0, Gender::Men, HOME, WORK);
        outside.origin.admin_code = Some(7000.0);
        outside.destination.admin_code = None;
        let mut no_card = leg("c2", 1.0, Gender::Men, HOME, WORK);
        no_card.card_id = None;
        let mut no_factor = leg("c3", 1.0, Gender::Men, HOME, WORK);
        no_factor.expansion_factor = None;
        let mut lost = leg("c4", 1.0, Gender::Men, HOME, WORK);
        lost.origin.lat = None;

        let table = aggregate_trips(&[outside, no_card, no_factor, lost], &settings());
        assert_eq!(table.stats.incomplete_legs, 2);
        assert_eq!(table.stats.outside_city, 2);
        assert_eq!(table.stats.unlocated, 1);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cell, cell_of(WORK));
    }

    #[test]
    fn total_rounds_the_unrounded_gender_sums() {
        let legs = vec![
            leg("m", 0.4, Gender::Men, HOME, HOME),
            leg("w", 0.4, Gender::Women, HOME, HOME),
            leg("o", 0.4, Gender::Other, HOME, HOME),
        ];
        let table = aggregate_trips(&legs, &settings());
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!((row.men, row.women, row.other), (0, 0, 0));
        assert_eq!(row.total, 1);
    }
}
