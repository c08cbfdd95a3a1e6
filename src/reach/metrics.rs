use std::ops::AddAssign;

/// Integer population counts of one (cell, bracket) row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReachMetrics {
    pub men_residents: i64,
    pub women_residents: i64,
    pub total_residents: i64,
    pub men_circulating: i64,
    pub women_circulating: i64,
    pub other_circulating: i64,
    pub total_circulating: i64,
    pub men_total_reach: i64,
    pub women_total_reach: i64,
    pub total_reach: i64,
}

impl ReachMetrics {
    /// Output column names, in the order of [`ReachMetrics::values`].
    pub const COLUMNS: [&'static str; 10] = [
        "hombres_residentes",
        "mujeres_residentes",
        "total_residentes",
        "hombres_circulante",
        "mujeres_circulante",
        "otros_circulante",
        "total_circulante",
        "hombres_total_reach",
        "mujeres_total_reach",
        "total_reach",
    ];

    /// Build a row from its resident and circulating parts, deriving the reach totals.
    /// The "other" circulating category only feeds the general total.
    pub fn combine(men_residents: i64, women_residents: i64, total_residents: i64, men_circulating: i64, women_circulating: i64, other_circulating: i64, total_circulating: i64) -> Self {
        Self {
            men_residents,
            women_residents,
            total_residents,
            men_circulating,
            women_circulating,
            other_circulating,
            total_circulating,
            men_total_reach: men_residents + men_circulating,
            women_total_reach: women_residents + women_circulating,
            total_reach: total_residents + total_circulating,
        }
    }

    pub fn values(&self) -> [i64; 10] {
        [
            self.men_residents,
            self.women_residents,
            self.total_residents,
            self.men_circulating,
            self.women_circulating,
            self.other_circulating,
            self.total_circulating,
            self.men_total_reach,
            self.women_total_reach,
            self.total_reach,
        ]
    }
}

impl AddAssign<&ReachMetrics> for ReachMetrics {
    fn add_assign(&mut self, other: &ReachMetrics) {
        self.men_residents += other.men_residents;
        self.women_residents += other.women_residents;
        self.total_residents += other.total_residents;
        self.men_circulating += other.men_circulating;
        self.women_circulating += other.women_circulating;
        self.other_circulating += other.other_circulating;
        self.total_circulating += other.total_circulating;
        self.men_total_reach += other.men_total_reach;
        self.women_total_reach += other.women_total_reach;
        self.total_reach += other.total_reach;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reach_totals_add_both_layers() {
        let metrics = ReachMetrics::combine(10, 12, 22, 3, 4, 2, 9);
        assert_eq!(metrics.men_total_reach, 13);
        assert_eq!(metrics.women_total_reach, 16);
        assert_eq!(metrics.total_reach, 31);
    }

    #[test]
    fn values_follow_column_order() {
        let metrics = ReachMetrics::combine(1, 2, 3, 4, 5, 6, 7);
        let values = metrics.values();
        assert_eq!(values.len(), ReachMetrics::COLUMNS.len());
        assert_eq!(values[..7], [1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(values[9], 10);
    }

    #[test]
    fn add_assign_sums_every_field() {
        let mut sum = ReachMetrics::default();
        sum += &ReachMetrics::combine(1, 1, 2, 1, 0, 1, 2);
        sum += &ReachMetrics::combine(2, 3, 5, 0, 1, 0, 1);
        assert_eq!(sum, ReachMetrics::combine(3, 4, 7, 1, 1, 1, 3));
    }
}
