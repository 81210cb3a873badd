//! Command-line surface: single-run and Monte Carlo subcommands plus the
//! text report renderer.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::{
    DefaultPlan, HistorySampler, MAX_AGE, MarketHistory, MonteCarlo, RUNS_PER_SIMULATION, Run,
    SimError, TaxPolicy,
};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Monte Carlo retirement survival estimator (taxable account + IRA + Roth)"
)]
pub struct Cli {
    #[arg(
        long,
        help = "Directory with inflation.json, stock_returns.json and bond_returns.json; defaults to the bundled 1928-2023 datasets"
    )]
    data_dir: Option<PathBuf>,
    #[arg(long, help = "Seed for reproducible sampling; defaults to clock entropy")]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one retirement horizon and report the terminal net worth.
    Run(StartingPosition),
    /// Run a batch of independent simulations and report percentile outcomes.
    MonteCarlo {
        #[command(flatten)]
        position: StartingPosition,
        #[arg(long, default_value_t = RUNS_PER_SIMULATION)]
        runs: u32,
    },
}

#[derive(Args, Debug)]
struct StartingPosition {
    #[arg(help = "Age at the start of retirement")]
    age: u32,
    #[arg(help = "Starting balance of the taxable brokerage account")]
    taxable: f64,
    #[arg(help = "Starting balance of the traditional IRA / 401k")]
    ira: f64,
    #[arg(help = "Starting balance of the Roth account")]
    roth: f64,
}

pub fn run(cli: Cli) -> Result<(), SimError> {
    let history = match &cli.data_dir {
        Some(dir) => MarketHistory::from_dir(dir)?,
        None => MarketHistory::bundled(),
    };
    let plan = DefaultPlan;
    let taxes = TaxPolicy::default();

    match cli.command {
        Command::Run(position) => {
            let mut run = Run::new(position.age, position.taxable, position.ira, position.roth);
            let mut sampler = match cli.seed {
                Some(seed) => HistorySampler::new(&history, seed),
                None => HistorySampler::from_entropy(&history),
            };
            run.process(&mut sampler, &plan, &taxes)?;

            let ending = run
                .ending()
                .map_or(0, |accounts| accounts.net_worth());
            println!("net worth at {MAX_AGE}: ${}", format_dollars(ending));
            println!(
                "outcome: {}",
                if run.is_success() == Some(true) {
                    "success"
                } else {
                    "failure"
                }
            );
        }
        Command::MonteCarlo { position, runs } => {
            let mut mc = MonteCarlo::new(position.age, position.taxable, position.ira, position.roth)
                .with_runs(runs);
            if let Some(seed) = cli.seed {
                mc = mc.with_seed(seed);
            }
            mc.start(&history, &plan, &taxes)?;
            print!("{}", render_report(&mut mc));
        }
    }
    Ok(())
}

fn render_report(mc: &mut MonteCarlo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=======================================");
    if mc.run_count() == 0 {
        let _ = writeln!(out, "no completed runs");
        return out;
    }

    let failure_percent = mc.failures() as f64 / mc.run_count() as f64 * 100.0;
    let _ = writeln!(out, "number of runs: {}", mc.run_count());
    let _ = writeln!(out, "Failures: {} [{:.2}%]", mc.failures(), failure_percent);
    for (label, percentile) in [("Median", 50), ("10%", 10), ("90%", 90)] {
        let net_worth = mc
            .nth_percentile_run(percentile)
            .and_then(|run| run.ending())
            .map_or(0, |accounts| accounts.net_worth());
        let _ = writeln!(out, "{label} Net Worth: ${}", format_dollars(net_worth));
    }
    out
}

fn format_dollars(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
