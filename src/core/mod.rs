mod accounts;
mod engine;
mod history;
mod plan;
mod tax;
mod types;
mod year;

pub use accounts::{Account, AccountKind, AccountSet, Balances, DIVIDEND_RATE, TaxTreatment, rmd_divisor};
pub use engine::{HistorySampler, MAX_AGE, MarketSampler, MonteCarlo, RUNS_PER_SIMULATION, Run};
pub use history::MarketHistory;
pub use plan::{DefaultPlan, WithdrawalPlan};
pub use tax::{Bracket, CapitalTaxTable, RateTable, TaxPolicy, TaxTable, get_all_brackets, lookup_rate};
pub use types::{IncomeSources, MarketSample, PortfolioMix, SimError};
pub use year::Year;
