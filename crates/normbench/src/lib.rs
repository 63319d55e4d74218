//! Benchmark suite for schema-normalization operations over synthetic
//! tabular datasets.
//!
//! This crate provides the infrastructure for:
//! - **Dataset generation**: nested, noisy fixtures fabricated from a
//!   column-naming grammar, with probabilistic term mangling
//! - **Matrix execution**: (test case × dataset × parameter × condition ×
//!   round) runs driven against a schema-evolution catalog, each isolated
//!   in a scratch schema and timed on CPU time
//! - **Aggregation**: outlier-trimmed statistics and per-test-case
//!   comparison charts

pub mod cases;
pub mod dataset;
pub mod driver;
pub mod generator;
pub mod mangle;
pub mod matrix;
pub mod naming;
pub mod plot;
pub mod results;
pub mod stats;
pub mod terms;

/// Result type alias used throughout the benchmark suite.
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors that can arise while generating datasets, running the matrix, or
/// aggregating results.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// A configuration problem detected before any run executes.
    #[error("config: {0}")]
    Config(String),

    /// An I/O error from the filesystem or a sink.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A delimited read/write error.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// A session metadata serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// An error propagated unmodified from the catalog collaborator.
    #[error("catalog: {0}")]
    Catalog(#[from] normbench_catalog::error::CatalogError),

    /// An aggregation error (too few samples, malformed dataset name).
    #[error("stats: {0}")]
    Stats(#[from] stats::StatsError),

    /// A chart rendering error.
    #[error("chart: {0}")]
    Chart(String),
}
