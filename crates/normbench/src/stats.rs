//! Summary statistics over result logs.
//!
//! Raw per-round timings are grouped into series (one condition at one
//! parameter value), converted to milliseconds, and reduced to a trimmed
//! mean with a population standard deviation.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::matrix::Condition;
use crate::naming;
use crate::results::ResultRecord;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{got} samples is too few to trim (need at least 3)")]
    TooFewSamples { got: usize },

    #[error("dataset name `{0}` is not a row count")]
    DatasetNotNumeric(String),
}

/// One plotted series: a parameter value under one condition.
pub type SeriesKey = (u32, Condition);

/// Millisecond samples keyed by test case, then series, then row count.
pub type GroupedSamples = BTreeMap<String, BTreeMap<SeriesKey, BTreeMap<u64, Vec<f64>>>>;

/// Trimmed statistics in the same shape as [`GroupedSamples`].
pub type SummaryTable = BTreeMap<String, BTreeMap<SeriesKey, BTreeMap<u64, TrimmedStat>>>;

/// Trimmed mean and population standard deviation of one sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimmedStat {
    pub mean: f64,
    pub std: f64,
}

/// Drops the fastest and slowest sample, then takes the mean and the
/// population standard deviation of what remains.
///
/// # Errors
///
/// Returns [`StatsError::TooFewSamples`] for fewer than three samples,
/// since trimming would leave nothing to summarize.
pub fn trimmed(samples: &[f64]) -> Result<TrimmedStat, StatsError> {
    if samples.len() < 3 {
        return Err(StatsError::TooFewSamples { got: samples.len() });
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let kept = &sorted[1..sorted.len() - 1];

    #[allow(clippy::cast_precision_loss)]
    let len = kept.len() as f64;
    let mean = kept.iter().sum::<f64>() / len;
    let variance = kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len;
    Ok(TrimmedStat {
        mean,
        std: variance.sqrt(),
    })
}

/// Recovers a dataset's row count from its name. Accepts a bare count or
/// a file name with a numeric stem, e.g. `1000.csv`.
///
/// # Errors
///
/// Returns [`StatsError::DatasetNotNumeric`] otherwise.
pub fn parse_dataset_size(name: &str) -> Result<u64, StatsError> {
    let stem = name.strip_suffix(naming::TABLE_EXT).unwrap_or(name);
    stem.parse()
        .map_err(|_| StatsError::DatasetNotNumeric(name.to_owned()))
}

/// Groups raw records into millisecond samples per series point.
///
/// # Errors
///
/// Returns an error when a dataset name does not encode a row count.
pub fn group_by_series(records: &[ResultRecord]) -> Result<GroupedSamples, StatsError> {
    let mut grouped = GroupedSamples::new();
    for record in records {
        let size = parse_dataset_size(&record.dataset)?;
        grouped
            .entry(record.test.clone())
            .or_default()
            .entry((record.param, record.condition))
            .or_default()
            .entry(size)
            .or_default()
            .push(record.time * 1000.0);
    }
    Ok(grouped)
}

/// Reduces grouped samples to trimmed statistics.
///
/// # Errors
///
/// Returns an error when any series point holds fewer than three samples.
pub fn summarize(grouped: &GroupedSamples) -> Result<SummaryTable, StatsError> {
    let mut table = SummaryTable::new();
    for (test, series) in grouped {
        let mut summarized_series = BTreeMap::new();
        for (key, points) in series {
            let mut summarized_points = BTreeMap::new();
            for (size, samples) in points {
                summarized_points.insert(*size, trimmed(samples)?);
            }
            summarized_series.insert(*key, summarized_points);
        }
        table.insert(test.clone(), summarized_series);
    }
    Ok(table)
}
