use ahash::AHashMap;
use h3o::CellIndex;
use log::info;

use crate::types::AgeBracket;

use super::{ReachMetrics, ReachTable};

/// A reach row with its values summed over the closed k-ring of its cell.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodReach {
    pub cell: CellIndex,
    pub bracket: AgeBracket,
    /// Values of the row itself.
    pub own: ReachMetrics,
    /// Values summed over every present row of the same bracket within the ring.
    pub ring: ReachMetrics,
}

/// Reach table expanded over a k-ring neighborhood.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodTable {
    radius: u32,
    rows: Vec<NeighborhoodReach>,
}

impl NeighborhoodTable {
    #[inline] pub fn radius(&self) -> u32 { self.radius }

    #[inline] pub fn rows(&self) -> &[NeighborhoodReach] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Suffix appended to the expanded column names, e.g. `_1ring`.
    #[inline] pub fn suffix(&self) -> String { format!("_{}ring", self.radius) }

    /// Output column names of the numeric fields: own values, then ring values.
    pub fn metric_columns(&self) -> Vec<String> {
        let suffix = self.suffix();
        ReachMetrics::COLUMNS.iter()
            .map(|name| name.to_string())
            .chain(ReachMetrics::COLUMNS.iter().map(|name| format!("{name}{suffix}")))
            .collect()
    }

    /// Column sums of the own values.
    pub fn totals(&self) -> ReachMetrics {
        self.rows.iter().fold(ReachMetrics::default(), |mut sum, row| {
            sum += &row.own;
            sum
        })
    }
}

impl ReachTable {
    /// Sum every row with the rows of the same bracket whose cell lies within `radius` grid
    /// steps (the cell included). Absent neighbors contribute nothing.
    pub fn expand(&self, radius: u32) -> NeighborhoodTable {
        let mut by_bracket = AHashMap::<&AgeBracket, AHashMap<CellIndex, &ReachMetrics>>::new();
        for row in self.rows() {
            by_bracket.entry(&row.bracket).or_default().insert(row.cell, &row.metrics);
        }

        let rows = self.rows().iter()
            .map(|row| {
                let mut ring = ReachMetrics::default();
                if let Some(present) = by_bracket.get(&row.bracket) {
                    for neighbor in row.cell.grid_disk::<Vec<_>>(radius) {
                        if let Some(metrics) = present.get(&neighbor) {
                            ring += *metrics;
                        }
                    }
                }
                NeighborhoodReach { cell: row.cell, bracket: row.bracket.clone(), own: row.metrics, ring }
            })
            .collect::<Vec<_>>();

        info!("[reach] expanded {} rows over {}-ring neighborhoods", rows.len(), radius);

        NeighborhoodTable { radius, rows }
    }
}

#[cfg(test)]
mod tests {
    use h3o::{LatLng, Resolution};

    use super::*;
    use crate::{census::CellPopulation, reach::merge};

    fn center() -> CellIndex {
        LatLng::new(-34.6037, -58.3816).unwrap().to_cell(Resolution::Nine)
    }

    fn resident(cell: CellIndex, lo: u8, total: i64) -> CellPopulation {
        CellPopulation { cell, bracket: AgeBracket::Span(lo), men: total / 2, women: total - total / 2, total }
    }

    #[test]
    fn ring_sums_neighbors_of_the_same_bracket() {
        let center = center();
        let neighbors = center.grid_disk::<Vec<_>>(1).into_iter().filter(|&c| c != center).collect::<Vec<_>>();
        let far = center.grid_disk::<Vec<_>>(3).into_iter().find(|c| center.grid_distance(*c).ok() == Some(3)).unwrap();

        let residents = vec![
            resident(center, 20, 10),
            resident(neighbors[0], 20, 5),
            resident(neighbors[1], 20, 7),
            resident(neighbors[2], 60, 100),
            resident(far, 20, 1000),
        ];
        let expanded = merge(&residents, &[]).expand(1);
        assert_eq!(expanded.len(), 5);

        let row = expanded.rows().iter().find(|r| r.cell == center).unwrap();
        assert_eq!(row.own.total_reach, 10);
        assert_eq!(row.ring.total_reach, 22);
        assert_eq!(row.ring.total_residents, 22);
    }

    #[test]
    fn isolated_cells_keep_their_own_values() {
        let center = center();
        let expanded = merge(&[resident(center, 20, 42)], &[]).expand(1);
        assert_eq!(expanded.rows()[0].ring, expanded.rows()[0].own);
    }

    #[test]
    fn ring_totals_never_fall_below_own_totals() {
        let center = center();
        let residents = center.grid_disk::<Vec<_>>(2).into_iter()
            .enumerate()
            .map(|(i, cell)| resident(cell, 5 * (i % 3) as u8, i as i64))
            .collect::<Vec<_>>();
        let expanded = merge(&residents, &[]).expand(1);

        for row in expanded.rows() {
            assert!(row.ring.total_reach >= row.own.total_reach);
        }
    }

    #[test]
    fn radius_zero_is_the_identity() {
        let center = center();
        let residents = center.grid_disk::<Vec<_>>(1).into_iter().map(|c| resident(c, 20, 3)).collect::<Vec<_>>();
        let expanded = merge(&residents, &[]).expand(0);
        assert!(expanded.rows().iter().all(|row| row.ring == row.own));
    }

    #[test]
    fn expanded_columns_carry_the_radius_suffix() {
        let expanded = ReachTable::default().expand(2);
        let columns = expanded.metric_columns();
        assert_eq!(columns.len(), 20);
        assert_eq!(columns[9], "total_reach");
        assert_eq!(columns[19], "total_reach_2ring");
    }
}
