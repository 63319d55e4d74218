//! Experiment matrix: which cells a session runs, and in what order.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cases::TestCase;
use crate::{BenchError, BenchResult};

// ── Conditions ─────────────────────────────────────────────────────────

/// Execution condition for a cell. `Control` materializes every
/// assignment immediately; `Optimized` consolidates the whole evolution
/// scope into one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Control,
    Optimized,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Control, Condition::Optimized];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Control => "control",
            Condition::Optimized => "optimized",
        }
    }

    /// Whether catalog work runs in a consolidated evolution scope.
    #[must_use]
    pub fn consolidate(self) -> bool {
        !matches!(self, Condition::Control)
    }

    /// # Errors
    ///
    /// Returns a config error for anything other than a known condition
    /// name.
    pub fn parse(s: &str) -> BenchResult<Self> {
        Condition::ALL
            .into_iter()
            .find(|condition| condition.as_str() == s)
            .ok_or_else(|| BenchError::Config(format!("unknown condition `{s}`")))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Matrix configuration ───────────────────────────────────────────────

/// Full description of one benchmark session.
///
/// `params` of `None` means each test case runs its own default parameter
/// list; `Some` overrides the list for every case.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub catalog_root: PathBuf,
    pub datasets: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub params: Option<Vec<u32>>,
    pub conditions: Vec<Condition>,
    pub rounds: u32,
    pub settle: Duration,
    pub disable_teardown: bool,
}

impl MatrixConfig {
    #[must_use]
    pub fn new(catalog_root: impl Into<PathBuf>, datasets: Vec<String>) -> Self {
        Self {
            catalog_root: catalog_root.into(),
            datasets,
            test_cases: TestCase::ALL.to_vec(),
            params: None,
            conditions: Condition::ALL.to_vec(),
            rounds: 1,
            settle: Duration::from_secs(1),
            disable_teardown: false,
        }
    }

    /// Checks the configuration before anything runs.
    ///
    /// Disabling teardown leaves transformation output on disk for
    /// inspection, which only makes sense when the matrix collapses to a
    /// single cell; anything wider would have later cells measure against
    /// a dirty output schema.
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first violated rule.
    pub fn validate(&self) -> BenchResult<()> {
        if self.datasets.is_empty() {
            return Err(BenchError::Config(
                "at least one dataset is required".to_owned(),
            ));
        }
        if self.test_cases.is_empty() {
            return Err(BenchError::Config(
                "at least one test case is required".to_owned(),
            ));
        }
        if self.conditions.is_empty() {
            return Err(BenchError::Config(
                "at least one condition is required".to_owned(),
            ));
        }
        if self.rounds == 0 {
            return Err(BenchError::Config("rounds must be at least 1".to_owned()));
        }
        if let Some(params) = &self.params {
            if params.is_empty() {
                return Err(BenchError::Config(
                    "an explicit parameter list must not be empty".to_owned(),
                ));
            }
        }
        if self.disable_teardown {
            let single = self.rounds == 1
                && self.datasets.len() == 1
                && self.test_cases.len() == 1
                && self.conditions.len() == 1
                && self.params.as_ref().is_some_and(|p| p.len() == 1);
            if !single {
                return Err(BenchError::Config(
                    "disabling teardown requires a single round, dataset, test case, \
                     and condition, with exactly one explicit parameter"
                        .to_owned(),
                ));
            }
        }
        Ok(())
    }
}

// ── Cells ──────────────────────────────────────────────────────────────

/// One fully addressed run: a test case at one parameter value, against
/// one dataset, under one condition, for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCell {
    pub test_case: TestCase,
    pub dataset: String,
    pub param: u32,
    pub condition: Condition,
    pub round: u32,
}

impl fmt::Display for MatrixCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:n{}:{}:r{}",
            self.test_case, self.dataset, self.param, self.condition, self.round
        )
    }
}

/// Expands a configuration into its cells, ordered test case, then
/// dataset, then parameter, then condition, then round. Rounds of one
/// series therefore run back to back, which keeps their cache and page
/// state comparable.
#[must_use]
pub fn expand_matrix(config: &MatrixConfig) -> Vec<MatrixCell> {
    let mut cells = Vec::new();
    for &test_case in &config.test_cases {
        let params: &[u32] = match &config.params {
            Some(explicit) => explicit,
            None => test_case.default_params(),
        };
        for dataset in &config.datasets {
            for &param in params {
                for &condition in &config.conditions {
                    for round in 0..config.rounds {
                        cells.push(MatrixCell {
                            test_case,
                            dataset: dataset.clone(),
                            param,
                            condition,
                            round,
                        });
                    }
                }
            }
        }
    }
    cells
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> MatrixConfig {
        MatrixConfig::new("bench-root", vec!["100".to_owned()])
    }

    #[test]
    fn test_condition_names_and_consolidation() {
        assert_eq!(Condition::Control.as_str(), "control");
        assert_eq!(Condition::parse("optimized").unwrap(), Condition::Optimized);
        assert!(Condition::parse("warmup").is_err());
        assert!(!Condition::Control.consolidate());
        assert!(Condition::Optimized.consolidate());
    }

    #[test]
    fn test_expand_orders_rounds_innermost() {
        let mut config = base_config();
        config.datasets = vec!["100".to_owned(), "200".to_owned()];
        config.test_cases = vec![TestCase::ReifyNConcepts];
        config.params = Some(vec![1, 2]);
        config.rounds = 2;

        let cells = expand_matrix(&config);
        assert_eq!(cells.len(), 16);

        assert_eq!(cells[0].dataset, "100");
        assert_eq!(cells[0].param, 1);
        assert_eq!(cells[0].condition, Condition::Control);
        assert_eq!(cells[0].round, 0);
        assert_eq!(cells[1].round, 1);
        assert_eq!(cells[2].condition, Condition::Optimized);
        assert_eq!(cells[2].round, 0);
        assert_eq!(cells[4].param, 2);
        assert_eq!(cells[8].dataset, "200");
    }

    #[test]
    fn test_expand_uses_per_case_defaults() {
        let mut config = base_config();
        config.test_cases = vec![TestCase::ReifyNSubconceptsAndMerge];
        config.conditions = vec![Condition::Control];

        let cells = expand_matrix(&config);
        let params: Vec<u32> = cells.iter().map(|c| c.param).collect();
        assert_eq!(params, vec![2, 3]);
    }

    #[test]
    fn test_validate_rejects_degenerate_configs() {
        let mut config = base_config();
        config.rounds = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.datasets.clear();
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.params = Some(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disable_teardown_requires_single_cell() {
        let mut config = base_config();
        config.test_cases = vec![TestCase::ReifyNConcepts];
        config.conditions = vec![Condition::Optimized];
        config.params = Some(vec![2]);
        config.disable_teardown = true;
        assert!(config.validate().is_ok());

        config.rounds = 2;
        assert!(config.validate().is_err());

        config.rounds = 1;
        config.params = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cell_display_is_compact() {
        let cell = MatrixCell {
            test_case: TestCase::ReifyNConcepts,
            dataset: "1000".to_owned(),
            param: 2,
            condition: Condition::Optimized,
            round: 0,
        };
        assert_eq!(cell.to_string(), "reify_n_concepts:1000:n2:optimized:r0");
    }
}
