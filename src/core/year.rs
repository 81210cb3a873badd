//! Single-year state transition: growth, the fixed-point tax solve, and
//! withdrawal allocation across the three accounts.

use tracing::debug;

use super::accounts::{AccountSet, TaxTreatment};
use super::plan::WithdrawalPlan;
use super::tax::TaxPolicy;
use super::types::{MarketSample, SimError};

/// First tax guess, as a share of pre-tax expenses.
const TAX_GUESS_SEED_RATE: f64 = 0.3;

/// The tax estimate and the withdrawal it pays for depend on each other; the
/// estimate is refined this many times and then taken as-is, with no
/// convergence check.
const TAX_ITERATIONS: usize = 7;

/// One simulated year. Built from explicit starting balances; processing sets
/// the market samples and the ending balances exactly once, after which the
/// year is immutable and can seed its successor.
#[derive(Debug, Clone)]
pub struct Year {
    age: u32,
    starting: AccountSet,
    ending: Option<AccountSet>,
    stock_growth: Option<f64>,
    bond_growth: Option<f64>,
    inflation: Option<f64>,
}

impl Year {
    pub fn new(age: u32, taxable: f64, ira: f64, roth: f64) -> Self {
        Self {
            age,
            starting: AccountSet::new(taxable, ira, roth),
            ending: None,
            stock_growth: None,
            bond_growth: None,
            inflation: None,
        }
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn starting(&self) -> &AccountSet {
        &self.starting
    }

    pub fn ending(&self) -> Option<&AccountSet> {
        self.ending.as_ref()
    }

    pub fn is_processed(&self) -> bool {
        self.ending.is_some()
    }

    /// Portfolio growth blended from the plan's target mix; `None` until both
    /// market samples are set.
    pub fn growth(&self, plan: &dyn WithdrawalPlan) -> Option<f64> {
        let (stock, bond) = match (self.stock_growth, self.bond_growth) {
            (Some(stock), Some(bond)) => (stock, bond),
            _ => return None,
        };
        let mix = plan.portfolio(self.age);
        Some(stock * mix.stocks + bond * mix.bonds)
    }

    /// Split the cash need into capital and ordinary taxable income: allocate
    /// by the plan's source fractions, raise either category to its forced
    /// floor (dividends, RMD), then count any Roth conversion as ordinary.
    fn calculate_taxable_income(&self, expenses: f64, plan: &dyn WithdrawalPlan) -> (f64, f64) {
        let needed_extra_income = expenses.max(0.0);
        let source = plan.income_source(self.age, &self.starting);
        let capital_income = needed_extra_income * source.taxable;
        let regular_income = needed_extra_income * source.ira;

        let (capital_income, mut regular_income) =
            self.adjust_for_forced_income(capital_income, regular_income);

        regular_income += plan.roth_conversion(self.age);
        (capital_income, regular_income)
    }

    /// Forced distributions are not optional: if planned income in either
    /// category falls short of what the accounts force out, raise that
    /// category and take the difference from the other, floored at zero.
    fn adjust_for_forced_income(&self, capital_income: f64, regular_income: f64) -> (f64, f64) {
        let mut forced_regular = 0.0;
        let mut forced_capital = 0.0;
        for acct in [self.starting.taxable(), self.starting.ira()] {
            match acct.tax_treatment() {
                TaxTreatment::Ordinary => forced_regular += acct.forced(self.age),
                _ => forced_capital += acct.forced(self.age),
            }
        }

        if capital_income < forced_capital && regular_income < forced_regular {
            (forced_capital, forced_regular)
        } else if capital_income < forced_capital {
            let diff = forced_capital - capital_income;
            (forced_capital, (regular_income - diff).max(0.0))
        } else if regular_income < forced_regular {
            let diff = forced_regular - regular_income;
            ((capital_income - diff).max(0.0), forced_regular)
        } else {
            (capital_income, regular_income)
        }
    }

    /// Total tax on a capital/ordinary split: progressive federal on ordinary
    /// income, state and local on the combined income, and capital gains with
    /// ordinary income as the shared-deduction offset.
    pub fn calculate_taxes(capital_gains: f64, regular_income: f64, taxes: &TaxPolicy) -> f64 {
        let est_fed_taxes = taxes.federal.calculate_tax(regular_income);
        let est_state_taxes = taxes.state.calculate_tax(regular_income + capital_gains);
        let est_capital_taxes = taxes.capital.calculate_tax(capital_gains, regular_income);
        est_fed_taxes + est_state_taxes + est_capital_taxes
    }

    /// Tax owed if this year withdraws `expenses` in total.
    pub fn taxes(&self, expenses: f64, plan: &dyn WithdrawalPlan, taxes: &TaxPolicy) -> f64 {
        let (capital_gains, regular_income) = self.calculate_taxable_income(expenses, plan);
        Self::calculate_taxes(capital_gains, regular_income, taxes)
    }

    /// Transform the starting balances into ending balances for one year of
    /// market movement, taxes, withdrawals, and forced moves.
    pub fn process_year(
        &mut self,
        sample: MarketSample,
        plan: &dyn WithdrawalPlan,
        taxes: &TaxPolicy,
    ) {
        self.stock_growth = Some(sample.stock_growth);
        self.bond_growth = Some(sample.bond_growth);
        self.inflation = Some(sample.inflation);

        let mix = plan.portfolio(self.age);
        let growth = sample.stock_growth * mix.stocks + sample.bond_growth * mix.bonds;
        let adjustment = 1.0 + growth - sample.inflation;

        let balances = self.starting.balances();
        let mut taxable = balances.taxable * adjustment;
        let mut ira = balances.ira * adjustment;
        let mut roth = balances.roth * adjustment;

        let expenses = plan.pre_tax_expenses(self.age);
        let mut tax_estimate = expenses * TAX_GUESS_SEED_RATE;
        for _ in 0..TAX_ITERATIONS {
            tax_estimate = self.taxes(expenses + tax_estimate, plan, taxes);
        }
        let total_expenses = expenses + tax_estimate;
        debug!(
            age = self.age,
            expenses, tax_estimate, total_expenses, "year cash need"
        );

        // The source fractions decide which balance is drawn down; the income
        // split above only decided how that draw is taxed.
        let source = plan.income_source(self.age, &self.starting);
        taxable -= total_expenses * source.taxable;
        ira -= total_expenses * source.ira;
        roth -= total_expenses * source.roth;

        // The RMD leaves the IRA whether or not it was spent; it lands as
        // taxable-account cash.
        let rmd = self.starting.ira().forced(self.age);
        taxable += rmd;
        ira -= rmd;

        let conversion = plan.roth_conversion(self.age);
        ira -= conversion;
        roth += conversion;

        self.ending = Some(AccountSet::new(taxable, ira, roth));
    }

    /// The age+1 year seeded from this year's ending balances. Errors if this
    /// year has not been processed.
    pub fn next_year(&self) -> Result<Year, SimError> {
        let Some(ending) = self.ending else {
            return Err(SimError::UnprocessedYear { age: self.age });
        };
        let balances = ending.balances();
        Ok(Year::new(
            self.age + 1,
            balances.taxable,
            balances.ira,
            balances.roth,
        ))
    }
}
