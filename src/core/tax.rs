//! Progressive tax schedules built from one or more raw marginal-rate tables,
//! plus the flat capital-gains table that shares a deduction with ordinary
//! income.

/// A raw rate table: `(bracket start, marginal rate)` pairs. Every table is
/// expected to define a rate at 0.
pub type RateTable<'a> = &'a [(u64, f64)];

pub const FED_STANDARD_DEDUCTION: f64 = 12_950.0;
pub const STATE_STANDARD_DEDUCTION: f64 = 2_400.0;
pub const CAPITAL_STANDARD_DEDUCTION: f64 = 44_625.0;
pub const CAPITAL_GAINS_RATE: f64 = 0.15;

pub const FED_TAX_RAW: RateTable<'static> = &[
    (0, 0.10),
    (11_676, 0.15),
    (47_476, 0.25),
    (114_750, 0.28),
    (239_301, 0.33),
    (520_301, 0.35),
    (522_426, 0.396),
];

pub const STATE_TAX_RAW: RateTable<'static> = &[
    (0, 0.02),
    (1_000, 0.03),
    (2_000, 0.04),
    (3_000, 0.0475),
    (100_000, 0.05),
    (125_000, 0.0525),
    (150_000, 0.055),
    (250_000, 0.0575),
];

pub const LOCAL_TAX_RAW: RateTable<'static> = &[(0, 0.032)];

/// The marginal rate a single table applies at `amount`: its highest defined
/// rate at or below `amount`, or its lowest defined rate if none qualifies.
pub fn lookup_rate(table: RateTable<'_>, amount: u64) -> f64 {
    let mut best: Option<(u64, f64)> = None;
    let mut lowest: Option<(u64, f64)> = None;
    for &(start, rate) in table {
        if lowest.is_none_or(|(s, _)| start < s) {
            lowest = Some((start, rate));
        }
        if start <= amount && best.is_none_or(|(s, _)| start >= s) {
            best = Some((start, rate));
        }
    }
    best.or(lowest).map(|(_, rate)| rate).unwrap_or(0.0)
}

/// Sorted union of every distinct bracket start across all tables.
pub fn get_all_brackets(tables: &[RateTable<'_>]) -> Vec<u64> {
    let mut starts: Vec<u64> = tables
        .iter()
        .flat_map(|table| table.iter().map(|&(start, _)| start))
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// One contiguous income range taxed at a single combined marginal rate.
///
/// Brackets live in a `Vec` ordered by `start`; adjacency replaces the
/// previous/next links of a classic chain, and `cumulative` is precomputed at
/// construction. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    start: u64,
    marginal: f64,
    end: Option<u64>,
    prev_end: Option<u64>,
    cumulative: f64,
}

impl Bracket {
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn marginal(&self) -> f64 {
        self.marginal
    }

    /// Last whole unit inside this bracket; `None` for the open-ended top
    /// bracket.
    pub fn end(&self) -> Option<u64> {
        self.end
    }

    /// Tax owed for all income below `start`.
    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    /// Tax owed for this complete bracket alone; `None` for the top bracket.
    pub fn bracket_cost(&self) -> Option<f64> {
        self.end
            .map(|end| (end - self.start) as f64 * self.marginal)
    }

    /// Tax owed within this bracket for a net amount that may fall below,
    /// inside, or above it.
    pub fn partial_bracket_cost(&self, net: f64) -> f64 {
        if net < self.start as f64 {
            return 0.0;
        }
        if let Some(end) = self.end {
            if net >= end as f64 {
                return self.bracket_cost().unwrap_or(0.0);
            }
        }
        match self.prev_end {
            Some(prev_end) => (net - prev_end as f64) * self.marginal,
            None => net * self.marginal,
        }
    }
}

/// A progressive schedule: bracket list plus a standard deduction applied
/// before any bracket walk.
#[derive(Debug, Clone)]
pub struct TaxTable {
    brackets: Vec<Bracket>,
    deduction: f64,
}

impl TaxTable {
    /// Stack one or more raw tables into a single combined schedule. Each
    /// threshold appearing in any table becomes a bracket whose marginal rate
    /// is the sum of every table's applicable rate there.
    pub fn new(tables: &[RateTable<'_>], deduction: f64) -> Self {
        let starts = get_all_brackets(tables);
        let mut brackets = Vec::with_capacity(starts.len());
        let mut cumulative = 0.0;

        for (index, &start) in starts.iter().enumerate() {
            let marginal: f64 = tables.iter().map(|table| lookup_rate(table, start)).sum();
            let end = starts.get(index + 1).map(|next| next - 1);
            let prev_end = (index > 0).then(|| start - 1);
            let bracket = Bracket {
                start,
                marginal,
                end,
                prev_end,
                cumulative,
            };
            if let Some(cost) = bracket.bracket_cost() {
                cumulative += cost;
            }
            brackets.push(bracket);
        }

        Self {
            brackets,
            deduction,
        }
    }

    pub fn deduction(&self) -> f64 {
        self.deduction
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Tax on `amount` after the standard deduction. Amounts at a bracket
    /// boundary are charged the higher bracket's rate from that point on.
    pub fn calculate_tax(&self, amount: f64) -> f64 {
        let net = (amount - self.deduction).max(0.0);
        let Some(mut bracket) = self.brackets.first() else {
            return 0.0;
        };
        for candidate in &self.brackets {
            bracket = candidate;
            match bracket.end {
                Some(end) if net > end as f64 => continue,
                _ => break,
            }
        }
        bracket.cumulative + bracket.partial_bracket_cost(net)
    }
}

/// Flat-rate capital-gains schedule whose deduction pool is consumed first by
/// ordinary income (the `offset`), then by the capital amount.
#[derive(Debug, Clone, Copy)]
pub struct CapitalTaxTable {
    rate: f64,
    deduction: f64,
}

impl CapitalTaxTable {
    pub fn new(rate: f64, deduction: f64) -> Self {
        Self { rate, deduction }
    }

    pub fn calculate_tax(&self, amount: f64, offset: f64) -> f64 {
        if offset >= self.deduction {
            return amount * self.rate;
        }
        if amount + offset < self.deduction {
            return 0.0;
        }
        (amount - (self.deduction - offset)) * self.rate
    }
}

/// The three schedules one simulated year is taxed under. Constructed
/// explicitly and passed into the year engine so tests can substitute
/// alternates.
#[derive(Debug, Clone)]
pub struct TaxPolicy {
    pub federal: TaxTable,
    pub state: TaxTable,
    pub capital: CapitalTaxTable,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            federal: TaxTable::new(&[FED_TAX_RAW], FED_STANDARD_DEDUCTION),
            state: TaxTable::new(&[STATE_TAX_RAW, LOCAL_TAX_RAW], STATE_STANDARD_DEDUCTION),
            capital: CapitalTaxTable::new(CAPITAL_GAINS_RATE, CAPITAL_STANDARD_DEDUCTION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    const SIMPLE_RAW: RateTable<'static> =
        &[(0, 0.1), (500, 0.2), (5_000, 0.3), (50_000, 0.4)];

    #[test]
    fn lookup_rate_picks_highest_defined_rate_at_or_below() {
        let table: RateTable = &[(0, 0.0), (800, 0.2), (4_000, 0.25), (800_000, 0.3)];
        assert_approx(lookup_rate(table, 5_000), 0.25);
        assert_approx(lookup_rate(table, 800), 0.2);
        assert_approx(lookup_rate(table, 799), 0.0);
    }

    #[test]
    fn lookup_rate_falls_back_to_lowest_rate() {
        let table: RateTable = &[(1_000, 0.05), (9_000, 0.15)];
        assert_approx(lookup_rate(table, 0), 0.05);
    }

    #[test]
    fn get_all_brackets_returns_sorted_union() {
        let table1: RateTable = &[(0, 0.1), (5_000, 0.2), (50_000, 0.3)];
        let table2: RateTable = &[(0, 0.1), (3_000, 0.2), (30_000, 0.3)];
        let table3: RateTable = &[(0, 0.0), (800, 0.2), (800_000, 0.3), (4_000, 0.25)];
        let starts = get_all_brackets(&[table1, table2, table3]);
        assert_eq!(starts, vec![0, 800, 3_000, 4_000, 5_000, 30_000, 50_000, 800_000]);
    }

    #[test]
    fn bracket_chain_has_expected_shape() {
        let table = TaxTable::new(&[&[(0, 0.1), (500, 0.2), (5_000, 0.3)]], 0.0);
        let brackets = table.brackets();
        assert_eq!(brackets.len(), 3);

        assert_eq!(brackets[0].start(), 0);
        assert_eq!(brackets[1].start(), 500);
        assert_eq!(brackets[2].start(), 5_000);

        assert_eq!(brackets[0].end(), Some(499));
        assert_eq!(brackets[1].end(), Some(4_999));
        assert_eq!(brackets[2].end(), None);

        assert_approx(brackets[0].marginal(), 0.1);
        assert_approx(brackets[1].marginal(), 0.2);
        assert_approx(brackets[2].marginal(), 0.3);
    }

    #[test]
    fn bracket_cost_covers_the_complete_finite_segment() {
        let table = TaxTable::new(&[&[(0, 0.1), (500, 0.2), (5_000, 0.3)]], 0.0);
        let brackets = table.brackets();
        assert_approx(brackets[0].bracket_cost().unwrap(), 499.0 * 0.1);
        assert_approx(brackets[1].bracket_cost().unwrap(), (4_999.0 - 500.0) * 0.2);
        assert!(brackets[2].bracket_cost().is_none());
    }

    #[test]
    fn cumulative_sums_every_preceding_bracket() {
        let table = TaxTable::new(&[&[(0, 0.1), (500, 0.2), (5_000, 0.3)]], 0.0);
        let brackets = table.brackets();
        assert_approx(brackets[0].cumulative(), 0.0);
        assert_approx(brackets[1].cumulative(), 49.9);
        assert_approx(brackets[2].cumulative(), 949.7);
    }

    #[test]
    fn partial_bracket_cost_prorates_within_the_bracket() {
        let table = TaxTable::new(&[&[(0, 0.1), (500, 0.2), (5_000, 0.3)]], 0.0);
        let middle = table.brackets()[1];
        for (amount, cost) in [
            (0.0, 0.0),
            (250.0, 0.0),
            (499.0, 0.0),
            (500.0, 0.2),
            (1_000.0, 501.0 * 0.2),
            (10_000.0, 4_499.0 * 0.2),
        ] {
            assert_approx(middle.partial_bracket_cost(amount), cost);
        }
    }

    #[test]
    fn stacked_tables_sum_rates_at_every_threshold() {
        let table2: RateTable = &[(0, 0.05), (9_000, 0.15)];
        let table = TaxTable::new(&[SIMPLE_RAW, table2], 0.0);
        let expected = [
            (0, 0.15),
            (500, 0.25),
            (5_000, 0.35),
            (9_000, 0.45),
            (50_000, 0.55),
        ];
        assert_eq!(table.brackets().len(), expected.len());
        for (bracket, (start, marginal)) in table.brackets().iter().zip(expected) {
            assert_eq!(bracket.start(), start);
            assert_approx(bracket.marginal(), marginal);
        }
    }

    #[test]
    fn calculate_tax_walks_to_the_owning_bracket() {
        for (amount, deduction, expected) in [
            (0.0, 500.0, 0.0),
            (510.0, 500.0, 1.0),
            (510.0, 0.0, 499.0 * 0.1 + 11.0 * 0.2),
            (30_000.0, 0.0, 499.0 * 0.1 + 4_499.0 * 0.2 + 25_001.0 * 0.3),
        ] {
            let table = TaxTable::new(&[SIMPLE_RAW], deduction);
            assert_approx(table.calculate_tax(amount), expected);
        }
    }

    #[test]
    fn default_state_table_matches_oracle_rates() {
        let policy = TaxPolicy::default();
        for (income, expected) in [
            (0.0, 0.0),
            (2_400.0, 0.0),
            (3_000.0, 600.0 * 0.052),
            (3_399.0, 999.0 * 0.052),
            (3_400.0, 999.0 * 0.052 + 1.0 * 0.062),
            (5_000.0, 999.0 * 0.052 + 999.0 * 0.062 + 601.0 * 0.072),
        ] {
            assert_approx(policy.state.calculate_tax(income), expected);
        }
    }

    #[test]
    fn capital_tax_shares_the_deduction_with_its_offset() {
        for (amount, offset, deduction, expected) in [
            (0.0, 0.0, 500.0, 0.0),
            (510.0, 0.0, 500.0, 10.0 * 0.15),
            (510.0, 0.0, 0.0, 510.0 * 0.15),
            (30_000.0, 0.0, 0.0, 30_000.0 * 0.15),
            (1_000.0, 500.0, 500.0, 1_000.0 * 0.15),
            (1_000.0, 100.0, 300.0, 800.0 * 0.15),
        ] {
            let table = CapitalTaxTable::new(0.15, deduction);
            assert_approx(table.calculate_tax(amount, offset), expected);
        }
    }

    proptest! {
        #[test]
        fn prop_flat_table_with_no_deduction_is_a_pure_rate(amount in 0u32..2_000_000) {
            let table = TaxTable::new(&[&[(0, 0.22)]], 0.0);
            let amount = amount as f64;
            let tax = table.calculate_tax(amount);
            prop_assert!((tax - amount * 0.22).abs() <= 1e-6);
        }

        #[test]
        fn prop_tax_is_non_negative_and_non_decreasing(
            lo in 0u32..1_000_000,
            extra in 0u32..1_000_000,
            deduction in 0u32..50_000
        ) {
            let table = TaxTable::new(&[SIMPLE_RAW], deduction as f64);
            let low = table.calculate_tax(lo as f64);
            let high = table.calculate_tax((lo + extra) as f64);
            prop_assert!(low >= 0.0);
            prop_assert!(high + EPS >= low);
        }

        #[test]
        fn prop_capital_tax_stays_within_the_flat_rate_bound(
            amount in 0u32..500_000,
            offset in 0u32..500_000
        ) {
            let table = CapitalTaxTable::new(0.15, CAPITAL_STANDARD_DEDUCTION);
            let tax = table.calculate_tax(amount as f64, offset as f64);
            prop_assert!(tax >= 0.0);
            prop_assert!(tax <= amount as f64 * 0.15 + EPS);
        }
    }
}
