use std::collections::BTreeMap;

use h3o::CellIndex;
use log::info;

use crate::{census::CellPopulation, mobility::CellMobility, types::AgeBracket};

use super::ReachMetrics;

/// Reach of one cell and age bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct CellReach {
    pub cell: CellIndex,
    pub bracket: AgeBracket,
    pub metrics: ReachMetrics,
}

/// Merged resident and circulating layers, unique and sorted by (cell, bracket).
#[derive(Debug, Clone, Default)]
pub struct ReachTable {
    rows: Vec<CellReach>,
}

impl ReachTable {
    #[inline] pub fn rows(&self) -> &[CellReach] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Column sums over every row.
    pub fn totals(&self) -> ReachMetrics {
        self.rows.iter().fold(ReachMetrics::default(), |mut sum, row| {
            sum += &row.metrics;
            sum
        })
    }
}

/// Outer join of residents and mobility on (cell, bracket); a missing side counts as zero.
pub fn merge(residents: &[CellPopulation], mobility: &[CellMobility]) -> ReachTable {
    let mut joined = BTreeMap::<(CellIndex, AgeBracket), (Option<&CellPopulation>, Option<&CellMobility>)>::new();
    for row in residents {
        joined.entry((row.cell, row.bracket.clone())).or_default().0 = Some(row);
    }
    for row in mobility {
        joined.entry((row.cell, row.bracket.clone())).or_default().1 = Some(row);
    }

    let rows = joined.into_iter()
        .map(|((cell, bracket), (resident, moving))| {
            let (men_r, women_r, total_r) = resident.map_or((0, 0, 0), |r| (r.men, r.women, r.total));
            let (men_c, women_c, other_c, total_c) = moving.map_or((0, 0, 0, 0), |m| (m.men, m.women, m.other, m.total));
            CellReach {
                cell,
                bracket,
                metrics: ReachMetrics::combine(men_r, women_r, total_r, men_c, women_c, other_c, total_c),
            }
        })
        .collect::<Vec<_>>();

    info!(
        "[reach] merged {} resident and {} mobility rows into {} (cell, bracket) rows",
        residents.len(), mobility.len(), rows.len()
    );

    ReachTable { rows }
}
