use std::collections::BTreeMap;

use ahash::AHashMap;
use anyhow::{ensure, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::types::{round_count, AgeBracket, RadioId};

/// Women per 100 men for one age bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SexRatio {
    /// Census bracket label, e.g. "20 A 24".
    pub bracket: String,
    pub ratio: f64,
}

/// Femininity ratios by age bracket, City of Buenos Aires, 2022 census.
const CABA_2022: [(&str, f64); 21] = [
    ("00 A 04", 97.0), ("05 A 09", 97.0), ("10 A 14", 97.0), ("15 A 19", 101.0),
    ("20 A 24", 108.0), ("25 A 29", 109.0), ("30 A 34", 108.0), ("35 A 39", 106.0),
    ("40 A 44", 110.0), ("45 A 49", 115.0), ("50 A 54", 118.0), ("55 A 59", 123.0),
    ("60 A 64", 126.0), ("65 A 69", 137.0), ("70 A 74", 147.0), ("75 A 79", 163.0),
    ("80 A 84", 187.0), ("85 A 89", 223.0), ("90 A 94", 290.0), ("95 A 99", 370.0),
    ("100 Y MÁS", 557.0),
];

/// Lookup of sex ratios keyed by canonical age bracket.
#[derive(Debug, Clone)]
pub struct SexRatioTable {
    ratios: AHashMap<AgeBracket, f64>,
}

impl Default for SexRatioTable {
    fn default() -> Self { Self::caba_2022() }
}

impl SexRatioTable {
    /// Built-in reference table (2022 census, City of Buenos Aires).
    pub fn caba_2022() -> Self {
        Self {
            ratios: CABA_2022.iter()
                .map(|&(label, ratio)| (AgeBracket::from_label(label), ratio))
                .collect(),
        }
    }

    /// Build a table from explicit entries. Ratios must be finite and non-negative.
    pub fn from_entries(entries: &[SexRatio]) -> Result<Self> {
        let mut ratios = AHashMap::with_capacity(entries.len());
        for entry in entries {
            ensure!(
                entry.ratio.is_finite() && entry.ratio >= 0.0,
                "[census::demographic] invalid sex ratio {} for bracket {:?}", entry.ratio, entry.bracket
            );
            let bracket = AgeBracket::from_label(&entry.bracket);
            ensure!(
                ratios.insert(bracket, entry.ratio).is_none(),
                "[census::demographic] bracket {:?} listed twice", entry.bracket
            );
        }
        Ok(Self { ratios })
    }

    #[inline] pub fn get(&self, bracket: &AgeBracket) -> Option<f64> { self.ratios.get(bracket).copied() }

    #[inline] pub fn len(&self) -> usize { self.ratios.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ratios.is_empty() }
}

/// Raw head count of one census polygon and age bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeCount {
    pub radio: RadioId,
    pub bracket: AgeBracket,
    pub total: i64,
}

/// Men/women split of an [`AgeCount`]; `men + women` is the bracket total.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeGenderCount {
    pub radio: RadioId,
    pub bracket: AgeBracket,
    pub men: i64,
    pub women: i64,
}

impl AgeGenderCount {
    #[inline] pub fn total(&self) -> i64 { self.men + self.women }
}

/// Output of the projection: split rows, and rows whose bracket has no ratio.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub counts: Vec<AgeGenderCount>,
    pub unmatched: Vec<AgeCount>,
}

/// Split a total using a women-per-100-men ratio.
/// Men are rounded (half away from zero); women take the remainder, so the split always adds up.
pub fn split_by_sex_ratio(total: i64, ratio: f64) -> (i64, i64) {
    let men = round_count(total as f64 / (1.0 + ratio / 100.0));
    (men, total - men)
}

/// Project per-polygon age-bracket totals into men and women.
///
/// Brackets are canonicalized first (everything from 100 up becomes the terminal bracket) and
/// totals landing on the same (polygon, bracket) are summed. Rows whose bracket is missing
/// from the ratio table are returned in `unmatched` and reported as a data-quality warning.
pub fn project(counts: &[AgeCount], ratios: &SexRatioTable) -> Projection {
    let mut totals = BTreeMap::<(RadioId, AgeBracket), i64>::new();
    for count in counts {
        let bracket = match &count.bracket {
            AgeBracket::Other(label) => AgeBracket::from_label(label),
            bracket => bracket.clone(),
        };
        *totals.entry((count.radio.clone(), bracket)).or_default() += count.total;
    }

    let mut projection = Projection::default();
    for ((radio, bracket), total) in totals {
        match ratios.get(&bracket) {
            Some(ratio) => {
                let (men, women) = split_by_sex_ratio(total, ratio);
                projection.counts.push(AgeGenderCount { radio, bracket, men, women });
            }
            None => projection.unmatched.push(AgeCount { radio, bracket, total }),
        }
    }

    if !projection.unmatched.is_empty() {
        let mut labels = projection.unmatched.iter()
            .map(|count| count.bracket.label())
            .collect::<Vec<_>>();
        labels.sort();
        labels.dedup();
        warn!(
            "[census::demographic] {} row(s) ({} people) have no sex ratio for bracket(s) {:?}",
            projection.unmatched.len(),
            projection.unmatched.iter().map(|count| count.total).sum::<i64>(),
            labels,
        );
    }
    info!(
        "[census::demographic] projected {} of {} (polygon, bracket) rows into men/women",
        projection.counts.len(), projection.counts.len() + projection.unmatched.len()
    );

    projection
}
