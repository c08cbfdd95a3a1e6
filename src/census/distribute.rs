use std::collections::BTreeMap;

use ahash::AHashMap;
use h3o::CellIndex;
use log::info;

use crate::types::{round_count, AgeBracket, RadioId};

use super::{AgeGenderCount, OverlapTable};

/// Resident population of one cell and age bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPopulation {
    pub cell: CellIndex,
    pub bracket: AgeBracket,
    pub men: i64,
    pub women: i64,
    pub total: i64,
}

#[derive(Default, Clone, Copy)]
struct Sums {
    men: f64,
    total: f64,
}

/// Spread projected counts onto cells by overlap proportion.
///
/// Polygons without a projection contribute nothing. Fractions are summed per
/// (cell, bracket) and rounded once at the end: `total` and `men` are rounded, women take the
/// remainder so every row closes.
pub fn distribute(overlap: &OverlapTable, counts: &[AgeGenderCount]) -> Vec<CellPopulation> {
    let mut by_radio = AHashMap::<&RadioId, Vec<&AgeGenderCount>>::new();
    for count in counts {
        by_radio.entry(&count.radio).or_default().push(count);
    }

    let mut sums = BTreeMap::<(CellIndex, AgeBracket), Sums>::new();
    let mut matched = 0usize;
    for record in overlap.records() {
        let Some(rows) = by_radio.get(&record.radio) else { continue };
        matched += 1;
        for row in rows {
            let entry = sums.entry((record.cell, row.bracket.clone())).or_default();
            entry.men += row.men as f64 * record.proportion;
            entry.total += row.total() as f64 * record.proportion;
        }
    }

    let population = sums.into_iter()
        .map(|((cell, bracket), sums)| {
            let total = round_count(sums.total);
            let men = round_count(sums.men);
            CellPopulation { cell, bracket, men, women: total - men, total }
        })
        .collect::<Vec<_>>();

    info!(
        "[census::distribute] {} of {} overlap records matched a projection; {} (cell, bracket) rows",
        matched, overlap.len(), population.len()
    );

    population
}
