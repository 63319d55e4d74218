//! Session driver: runs an expanded matrix cell by cell against a
//! delimited-text catalog and appends one result record per cell.
//!
//! Every cell gets a fresh catalog handle with automatic reclamation
//! disabled, so buffer retirement cost never lands inside the timed
//! window; `reclaim` runs explicitly once the cell's record is taken.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use cpu_time::ProcessTime;
use normbench_catalog::delimited::DelimitedCatalog;
use normbench_catalog::Catalog;
use serde::Serialize;
use tracing::{debug, info};

use crate::cases::TestCase;
use crate::matrix::{expand_matrix, Condition, MatrixCell, MatrixConfig};
use crate::results::{ResultRecord, ResultWriter};
use crate::BenchResult;

/// Schema the transformation output is assigned into.
pub const OUTPUT_SCHEMA: &str = "output";

/// Layout identifier for the session metadata document.
pub const SESSION_META_SCHEMA: &str = "normbench.session_meta.v1";

// ── Session metadata ───────────────────────────────────────────────────

/// Sidecar description of a session, written next to file-backed result
/// logs so a log can be interpreted long after the run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub schema: &'static str,
    pub started_unix_ms: u128,
    pub catalog_root: String,
    pub datasets: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub conditions: Vec<Condition>,
    pub params: Option<Vec<u32>>,
    pub rounds: u32,
    pub settle_secs: f64,
    pub disable_teardown: bool,
    pub total_cells: usize,
}

impl SessionMeta {
    #[must_use]
    pub fn from_config(config: &MatrixConfig, total_cells: usize) -> Self {
        let started_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self {
            schema: SESSION_META_SCHEMA,
            started_unix_ms,
            catalog_root: config.catalog_root.to_string_lossy().into_owned(),
            datasets: config.datasets.clone(),
            test_cases: config.test_cases.clone(),
            conditions: config.conditions.clone(),
            params: config.params.clone(),
            rounds: config.rounds,
            settle_secs: config.settle.as_secs_f64(),
            disable_teardown: config.disable_teardown,
            total_cells,
        }
    }
}

/// Writes session metadata as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub fn write_session_meta(meta: &SessionMeta, path: &Path) -> BenchResult<()> {
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(path, json)?;
    Ok(())
}

// ── Session loop ───────────────────────────────────────────────────────

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub total_cells: usize,
    pub completed: usize,
}

/// Runs every cell of the configured matrix, appending one record per
/// cell to `sink`.
///
/// Cells run strictly sequentially; the settle interval elapses after
/// every cell, the last one included. The first failure aborts the
/// session, leaving the records appended so far valid.
///
/// # Errors
///
/// Returns the validation error, or the first cell failure.
pub fn run_session<W: Write>(config: &MatrixConfig, sink: W) -> BenchResult<SessionReport> {
    config.validate()?;
    let cells = expand_matrix(config);
    let total = cells.len();
    let mut writer = ResultWriter::new(sink)?;

    info!(
        cells = total,
        datasets = config.datasets.len(),
        rounds = config.rounds,
        "session start"
    );

    for (ordinal, cell) in cells.iter().enumerate() {
        info!(cell = %cell, ordinal = ordinal + 1, total, "run cell");
        let record = run_cell(config, cell)?;
        writer.append(&record)?;

        debug!(settle_secs = config.settle.as_secs_f64(), "settle");
        thread::sleep(config.settle);
    }

    Ok(SessionReport {
        total_cells: total,
        completed: total,
    })
}

/// Runs one cell: fresh handle, preflight, timed execute, teardown.
///
/// Only the family body is timed. Set-up, the dataset lookup, preflight,
/// and teardown all happen outside the measured window.
///
/// # Errors
///
/// Returns a config error from preflight, or a catalog or I/O failure.
pub fn run_cell(config: &MatrixConfig, cell: &MatrixCell) -> BenchResult<ResultRecord> {
    let output_dir = config.catalog_root.join(OUTPUT_SCHEMA);
    fs::create_dir_all(&output_dir)?;
    debug!(root = %config.catalog_root.display(), "set up");

    let locator = config.catalog_root.to_string_lossy();
    let mut catalog = DelimitedCatalog::connect(&locator)?;
    catalog.set_auto_reclaim(false);

    let table = catalog.table(".", &cell.dataset)?;
    cell.test_case.preflight(&table, cell.param)?;

    let timer = ProcessTime::try_now()?;
    cell.test_case.execute(
        &mut catalog,
        &table,
        OUTPUT_SCHEMA,
        cell.param,
        cell.condition,
    )?;
    let elapsed = timer.try_elapsed()?;

    let record = ResultRecord {
        test: cell.test_case.as_str().to_owned(),
        dataset: cell.dataset.clone(),
        param: cell.param,
        condition: cell.condition,
        round: cell.round,
        time: elapsed.as_secs_f64(),
    };

    if config.disable_teardown {
        debug!("teardown disabled, output retained");
    } else {
        remove_dir_tolerant(&output_dir)?;
        debug!("tear down");
    }
    catalog.reclaim()?;

    Ok(record)
}

/// Removes a directory tree, treating an already-missing path as done.
fn remove_dir_tolerant(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::read_results;
    use std::time::Duration;

    fn seed_catalog() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = csv::Writer::from_path(dir.path().join("100.csv")).unwrap();
        writer
            .write_record(["data:key", "data:term:0", "subc0:key", "subc0:int:0"])
            .unwrap();
        for row in [
            ["0", "alpha", "0", "5"],
            ["1", "beta", "1", "6"],
            ["2", "alpha", "0", "5"],
        ] {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
        dir
    }

    fn config_for(root: &Path) -> MatrixConfig {
        let mut config = MatrixConfig::new(root, vec!["100".to_owned()]);
        config.settle = Duration::ZERO;
        config
    }

    #[test]
    fn test_session_runs_cells_in_matrix_order() {
        let dir = seed_catalog();
        let mut config = config_for(dir.path());
        config.test_cases = vec![TestCase::CreateNDomainsFromNColumns];
        config.params = Some(vec![1]);
        config.rounds = 3;

        let mut buffer = Vec::new();
        let report = run_session(&config, &mut buffer).unwrap();
        assert_eq!(report.total_cells, 6);
        assert_eq!(report.completed, 6);

        let records = read_results(buffer.as_slice()).unwrap();
        assert_eq!(records.len(), 6);
        for record in &records {
            assert_eq!(record.test, "create_n_domains_from_n_columns");
            assert_eq!(record.dataset, "100");
            assert!(record.time >= 0.0);
        }
        assert_eq!(records[0].condition, Condition::Control);
        assert_eq!(records[2].round, 2);
        assert_eq!(records[3].condition, Condition::Optimized);

        // Teardown removed the scratch schema after the last cell.
        assert!(!dir.path().join(OUTPUT_SCHEMA).exists());
    }

    #[test]
    fn test_disable_teardown_retains_output() {
        let dir = seed_catalog();
        let mut config = config_for(dir.path());
        config.test_cases = vec![TestCase::ReifyNConcepts];
        config.conditions = vec![Condition::Optimized];
        config.params = Some(vec![1]);
        config.disable_teardown = true;

        let mut buffer = Vec::new();
        run_session(&config, &mut buffer).unwrap();

        assert!(dir.path().join(OUTPUT_SCHEMA).join("conc0.csv").exists());
        assert!(dir.path().join(OUTPUT_SCHEMA).join("core.csv").exists());
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let dir = seed_catalog();
        let mut config = config_for(dir.path());
        config.rounds = 0;

        let mut buffer = Vec::new();
        assert!(run_session(&config, &mut buffer).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_missing_dataset_aborts_after_header() {
        let dir = seed_catalog();
        let mut config = config_for(dir.path());
        config.datasets = vec!["9999".to_owned()];
        config.test_cases = vec![TestCase::CreateNDomainsFromNColumns];
        config.conditions = vec![Condition::Control];
        config.params = Some(vec![1]);

        let mut buffer = Vec::new();
        assert!(run_session(&config, &mut buffer).is_err());
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "test,dataset,param,condition,round,time\n");
    }

    #[test]
    fn test_session_meta_round_trips_as_json() {
        let dir = seed_catalog();
        let mut config = config_for(dir.path());
        config.params = Some(vec![2]);
        let meta = SessionMeta::from_config(&config, 18);

        let path = dir.path().join("session.meta.json");
        write_session_meta(&meta, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["schema"], SESSION_META_SCHEMA);
        assert_eq!(value["total_cells"], 18);
        assert_eq!(value["datasets"][0], "100");
        assert_eq!(value["params"][0], 2);
    }
}
