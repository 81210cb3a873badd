//! Run and Monte Carlo drivers: chain years to the terminal age under
//! sampled market history and aggregate many independent runs into
//! percentile outcomes.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use super::accounts::AccountSet;
use super::history::MarketHistory;
use super::plan::WithdrawalPlan;
use super::tax::TaxPolicy;
use super::types::{MarketSample, SimError};
use super::year::Year;

/// Terminal age: the last year that is simulated.
pub const MAX_AGE: u32 = 97;

/// Default Monte Carlo batch size.
pub const RUNS_PER_SIMULATION: u32 = 1_500;

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn derive_seed(base_seed: u64, run_id: u32) -> u64 {
    splitmix64(base_seed ^ ((run_id as u64) << 32))
}

fn entropy_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0xA5A5_A5A5_A5A5_A5A5);
    splitmix64(nanos)
}

/// xorshift64* generator; small, seedable, and good enough for sampling
/// indices into the historical datasets.
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0xA5A5_A5A5_A5A5_A5A5 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

/// Source of one market triple per simulated year. Injectable so tests can
/// replay fixed sequences.
pub trait MarketSampler {
    fn draw(&mut self) -> MarketSample;
}

/// Draws each of the three values independently and uniformly, with
/// replacement, from the historical datasets. Values are stored in percent
/// and converted to fractions here.
pub struct HistorySampler<'a> {
    history: &'a MarketHistory,
    rng: Rng,
}

impl<'a> HistorySampler<'a> {
    pub fn new(history: &'a MarketHistory, seed: u64) -> Self {
        Self {
            history,
            rng: Rng::new(seed),
        }
    }

    pub fn from_entropy(history: &'a MarketHistory) -> Self {
        Self::new(history, entropy_seed())
    }

    fn choose(rng: &mut Rng, values: &[f64]) -> f64 {
        values[rng.next_index(values.len())] / 100.0
    }
}

impl MarketSampler for HistorySampler<'_> {
    fn draw(&mut self) -> MarketSample {
        MarketSample {
            stock_growth: Self::choose(&mut self.rng, self.history.stocks()),
            bond_growth: Self::choose(&mut self.rng, self.history.bonds()),
            inflation: Self::choose(&mut self.rng, self.history.inflation()),
        }
    }
}

/// One full simulated retirement horizon under one sampled sequence of
/// market draws.
#[derive(Debug)]
pub struct Run {
    first_year: Year,
    last_year: Option<Year>,
}

impl Run {
    pub fn new(age: u32, taxable: f64, ira: f64, roth: f64) -> Self {
        Self {
            first_year: Year::new(age, taxable, ira, roth),
            last_year: None,
        }
    }

    pub fn starting(&self) -> &AccountSet {
        self.first_year.starting()
    }

    pub fn ending(&self) -> Option<&AccountSet> {
        self.last_year.as_ref().and_then(|year| year.ending())
    }

    /// `None` until processed; afterwards, success means strictly positive
    /// terminal net worth — exactly zero is still failure.
    pub fn is_success(&self) -> Option<bool> {
        self.ending().map(|ending| ending.net_worth() > 0)
    }

    /// Process years from the starting age through `MAX_AGE` inclusive, one
    /// fresh market draw per year.
    pub fn process(
        &mut self,
        sampler: &mut dyn MarketSampler,
        plan: &dyn WithdrawalPlan,
        taxes: &TaxPolicy,
    ) -> Result<(), SimError> {
        let mut year = self.first_year.clone();
        while year.age() < MAX_AGE {
            year.process_year(sampler.draw(), plan, taxes);
            year = year.next_year()?;
        }
        year.process_year(sampler.draw(), plan, taxes);
        self.last_year = Some(year);
        Ok(())
    }
}

/// Monte Carlo driver: a batch of independent runs from fixed starting
/// parameters, with failure tally and memoized percentile ranking.
pub struct MonteCarlo {
    starting_age: u32,
    starting_taxable: f64,
    starting_ira: f64,
    starting_roth: f64,
    runs_per_batch: u32,
    seed: u64,
    runs: Vec<Run>,
    ranked_by_net_worth: Option<Vec<usize>>,
    failures: u32,
}

impl MonteCarlo {
    pub fn new(age: u32, taxable: f64, ira: f64, roth: f64) -> Self {
        Self {
            starting_age: age,
            starting_taxable: taxable,
            starting_ira: ira,
            starting_roth: roth,
            runs_per_batch: RUNS_PER_SIMULATION,
            seed: entropy_seed(),
            runs: Vec::new(),
            ranked_by_net_worth: None,
            failures: 0,
        }
    }

    pub fn with_runs(mut self, runs_per_batch: u32) -> Self {
        self.runs_per_batch = runs_per_batch;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn reset(&mut self) {
        self.runs.clear();
        self.ranked_by_net_worth = None;
        self.failures = 0;
    }

    /// Execute a fresh batch, discarding any previous one. Each run gets its
    /// own derived sample stream so the batch is reproducible from one seed.
    pub fn start(
        &mut self,
        history: &MarketHistory,
        plan: &dyn WithdrawalPlan,
        taxes: &TaxPolicy,
    ) -> Result<(), SimError> {
        self.reset();
        for run_id in 0..self.runs_per_batch {
            let mut sampler = HistorySampler::new(history, derive_seed(self.seed, run_id));
            let mut run = Run::new(
                self.starting_age,
                self.starting_taxable,
                self.starting_ira,
                self.starting_roth,
            );
            run.process(&mut sampler, plan, taxes)?;
            if run.is_success() != Some(true) {
                self.failures += 1;
            }
            self.runs.push(run);
        }
        debug!(
            runs = self.runs.len(),
            failures = self.failures,
            "monte carlo batch complete"
        );
        Ok(())
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The run ranked at `percentile` by ending net worth, or `None` for an
    /// empty batch. Ranking is computed once per batch and reused.
    pub fn nth_percentile_run(&mut self, percentile: u32) -> Option<&Run> {
        if self.runs.is_empty() {
            return None;
        }

        let runs = &self.runs;
        let order = self.ranked_by_net_worth.get_or_insert_with(|| {
            let mut indices: Vec<usize> = (0..runs.len()).collect();
            indices.sort_by(|&a, &b| {
                let left = runs[a].ending().map_or(i64::MIN, |e| e.net_worth());
                let right = runs[b].ending().map_or(i64::MIN, |e| e.net_worth());
                left.cmp(&right)
            });
            indices
        });

        let index = percentile as usize * runs.len() / 100;
        order.get(index).map(|&i| &self.runs[i])
    }
}
