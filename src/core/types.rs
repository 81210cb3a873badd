use thiserror::Error;

/// One year's market draw: stock and bond growth plus inflation, all as
/// fractions (0.07 = 7%).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarketSample {
    pub stock_growth: f64,
    pub bond_growth: f64,
    pub inflation: f64,
}

/// Target asset allocation for a given age. Fractions should sum to 1; the
/// cash share earns nothing and only dilutes growth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PortfolioMix {
    pub stocks: f64,
    pub bonds: f64,
    pub cash: f64,
}

/// What fraction of this year's cash need is drawn from each account.
/// Fractions should sum to 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IncomeSources {
    pub taxable: f64,
    pub ira: f64,
    pub roth: f64,
}

impl IncomeSources {
    pub const fn new(taxable: f64, ira: f64, roth: f64) -> Self {
        Self { taxable, ira, roth }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("year at age {age} has not been processed yet")]
    UnprocessedYear { age: u32 },
    #[error("failed to read dataset {name}")]
    DatasetIo {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset {name}")]
    DatasetParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset {name} contains no values")]
    EmptyDataset { name: String },
}
