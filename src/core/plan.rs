//! Withdrawal policy: the age- and state-driven decisions a simulated year
//! asks of its plan.

use super::accounts::AccountSet;
use super::types::{IncomeSources, PortfolioMix};

pub const NEED_EXPENSES: f64 = 45_000.0;
pub const WANT_EXPENSES: f64 = 10_000.0;
pub const ACA_PREMIUMS: f64 = 15_000.0;
pub const MEDICARE_PREMIUMS: f64 = 5_000.0;
pub const SS_AMOUNT: f64 = 47_500.0;

pub const MEDICARE_AGE: u32 = 65;
pub const SS_CLAIMING_AGE: u32 = 70;
pub const TAXABLE_FIRST_AGE: u32 = 60;

/// Fraction of net worth an account must retain, after this year's expenses,
/// to stay the preferred withdrawal source.
pub const MINIMUM_ACCOUNT_BALANCE_PERCENT: f64 = 0.1;

/// The four decisions the year engine delegates. Stateless; implementations
/// are swapped wholesale in tests.
pub trait WithdrawalPlan {
    /// Target asset mix at `age`.
    fn portfolio(&self, age: u32) -> PortfolioMix;

    /// Living expenses for the year before any tax is added.
    fn pre_tax_expenses(&self, age: u32) -> f64;

    /// Which account funds this year's cash need, as fractions of the total.
    fn income_source(&self, age: u32, starting: &AccountSet) -> IncomeSources;

    /// Amount converted from the IRA into the Roth this year; taxed as
    /// ordinary income.
    fn roth_conversion(&self, age: u32) -> f64;
}

/// Production policy: fixed 75/20/5 mix, age-banded premiums and Social
/// Security offset, and an all-or-nothing source ladder that drains the IRA
/// first once it is reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlan;

impl WithdrawalPlan for DefaultPlan {
    fn portfolio(&self, _age: u32) -> PortfolioMix {
        PortfolioMix {
            stocks: 0.75,
            bonds: 0.20,
            cash: 0.05,
        }
    }

    fn pre_tax_expenses(&self, age: u32) -> f64 {
        let base_expenses = NEED_EXPENSES + WANT_EXPENSES;
        if age < MEDICARE_AGE {
            return base_expenses + ACA_PREMIUMS;
        }

        let expenses = base_expenses + MEDICARE_PREMIUMS;
        if age >= SS_CLAIMING_AGE {
            return (expenses - SS_AMOUNT).max(0.0);
        }
        expenses
    }

    fn income_source(&self, age: u32, starting: &AccountSet) -> IncomeSources {
        if age < TAXABLE_FIRST_AGE {
            return IncomeSources::new(1.0, 0.0, 0.0);
        }

        let reserve = starting.net_worth() as f64 * MINIMUM_ACCOUNT_BALANCE_PERCENT;
        let expenses = self.pre_tax_expenses(age);
        if starting.ira().balance() - expenses > reserve {
            return IncomeSources::new(0.0, 1.0, 0.0);
        }
        if starting.taxable().balance() - expenses > reserve {
            return IncomeSources::new(1.0, 0.0, 0.0);
        }
        IncomeSources::new(0.0, 0.0, 1.0)
    }

    fn roth_conversion(&self, _age: u32) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn portfolio_mix_is_fixed() {
        let mix = DefaultPlan.portfolio(40);
        assert_approx(mix.stocks, 0.75);
        assert_approx(mix.bonds, 0.20);
        assert_approx(mix.cash, 0.05);
        assert_approx(mix.stocks + mix.bonds + mix.cash, 1.0);
    }

    #[test]
    fn expenses_follow_the_age_bands() {
        // ACA premiums before Medicare eligibility.
        assert_approx(DefaultPlan.pre_tax_expenses(64), 55_000.0 + 15_000.0);
        // Medicare premiums from 65.
        assert_approx(DefaultPlan.pre_tax_expenses(65), 55_000.0 + 5_000.0);
        // Social Security offsets expenses from the claiming age.
        assert_approx(DefaultPlan.pre_tax_expenses(70), 60_000.0 - 47_500.0);
    }

    #[test]
    fn expenses_never_go_negative_after_the_offset() {
        assert!(DefaultPlan.pre_tax_expenses(90) >= 0.0);
    }

    #[test]
    fn young_households_draw_from_taxable_only() {
        let starting = AccountSet::new(100.0, 1_000_000.0, 100.0);
        let source = DefaultPlan.income_source(59, &starting);
        assert_eq!(source, IncomeSources::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn ira_is_preferred_while_it_clears_the_reserve() {
        let starting = AccountSet::new(600_000.0, 700_000.0, 800_000.0);
        let source = DefaultPlan.income_source(65, &starting);
        assert_eq!(source, IncomeSources::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn taxable_backstops_a_depleted_ira() {
        // IRA fails the reserve test, taxable passes it.
        let starting = AccountSet::new(600_000.0, 70_000.0, 100_000.0);
        let source = DefaultPlan.income_source(65, &starting);
        assert_eq!(source, IncomeSources::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn roth_is_the_source_of_last_resort() {
        let starting = AccountSet::new(50_000.0, 50_000.0, 800_000.0);
        let source = DefaultPlan.income_source(65, &starting);
        assert_eq!(source, IncomeSources::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn default_plan_never_converts_to_roth() {
        assert_approx(DefaultPlan.roth_conversion(60), 0.0);
        assert_approx(DefaultPlan.roth_conversion(75), 0.0);
    }
}
