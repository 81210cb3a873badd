//! Historical market datasets: annual inflation, stock returns, and bond
//! returns, stored as percent values. A bundled copy ships with the binary
//! and can be overridden by a directory of JSON files.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::types::SimError;

const BUNDLED_HISTORY: &str = include_str!("../../data/history.json");

const INFLATION_FILE: &str = "inflation.json";
const STOCK_FILE: &str = "stock_returns.json";
const BOND_FILE: &str = "bond_returns.json";

/// Annual percent series. The three series are sampled independently, so
/// their lengths need not match; each must be non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketHistory {
    inflation: Vec<f64>,
    stocks: Vec<f64>,
    bonds: Vec<f64>,
}

impl MarketHistory {
    pub fn new(inflation: Vec<f64>, stocks: Vec<f64>, bonds: Vec<f64>) -> Result<Self, SimError> {
        Self {
            inflation,
            stocks,
            bonds,
        }
        .validated()
    }

    /// The datasets compiled into the binary (US annual data, 1928-2023).
    pub fn bundled() -> Self {
        serde_json::from_str(BUNDLED_HISTORY).expect("bundled history.json is valid")
    }

    /// Load `inflation.json`, `stock_returns.json`, and `bond_returns.json`
    /// from `dir`, each a flat JSON list of percent values.
    pub fn from_dir(dir: &Path) -> Result<Self, SimError> {
        Self {
            inflation: read_series(dir, INFLATION_FILE)?,
            stocks: read_series(dir, STOCK_FILE)?,
            bonds: read_series(dir, BOND_FILE)?,
        }
        .validated()
    }

    pub fn inflation(&self) -> &[f64] {
        &self.inflation
    }

    pub fn stocks(&self) -> &[f64] {
        &self.stocks
    }

    pub fn bonds(&self) -> &[f64] {
        &self.bonds
    }

    fn validated(self) -> Result<Self, SimError> {
        for (name, series) in [
            ("inflation", &self.inflation),
            ("stocks", &self.stocks),
            ("bonds", &self.bonds),
        ] {
            if series.is_empty() {
                return Err(SimError::EmptyDataset {
                    name: name.to_string(),
                });
            }
        }
        Ok(self)
    }
}

fn read_series(dir: &Path, file: &str) -> Result<Vec<f64>, SimError> {
    let path = dir.join(file);
    let text = fs::read_to_string(&path).map_err(|source| SimError::DatasetIo {
        name: file.to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SimError::DatasetParse {
        name: file.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_series_cover_1928_through_2023() {
        let history = MarketHistory::bundled();
        assert_eq!(history.inflation().len(), 96);
        assert_eq!(history.stocks().len(), 96);
        assert_eq!(history.bonds().len(), 96);
    }

    #[test]
    fn bundled_values_are_percents_in_a_plausible_range() {
        let history = MarketHistory::bundled();
        for value in history
            .inflation()
            .iter()
            .chain(history.stocks())
            .chain(history.bonds())
        {
            assert!(value.abs() < 100.0, "implausible percent value {value}");
        }
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = MarketHistory::new(vec![], vec![7.0], vec![2.0]).unwrap_err();
        assert!(matches!(err, SimError::EmptyDataset { name } if name == "inflation"));
    }

    #[test]
    fn series_lengths_may_differ() {
        let history = MarketHistory::new(vec![2.0], vec![7.0, 20.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(history.stocks().len(), 2);
    }

    #[test]
    fn missing_directory_reports_an_io_error() {
        let err = MarketHistory::from_dir(Path::new("/nonexistent/history")).unwrap_err();
        assert!(matches!(err, SimError::DatasetIo { name, .. } if name == "inflation.json"));
    }
}
