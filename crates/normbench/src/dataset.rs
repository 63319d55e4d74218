//! Dataset assembly: binds term pools, subconcept pools, and a top-level
//! entity template together and streams the result as delimited text.

use std::io::Write;

use rand::Rng;

use crate::generator::{EntityTemplate, FlatRecordPool};
use crate::naming::{self, ColumnKind};
use crate::terms::TermPool;
use crate::BenchResult;

/// Label used for the top-level entity when none is given.
pub const DEFAULT_LABEL: &str = "data";

/// Everything needed to produce one dataset file.
///
/// Fields are public and meant to be adjusted after [`DatasetSpec::new`];
/// the `effective_*` accessors resolve the sizing rules that depend on the
/// row count.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub label: String,
    pub kinds: Vec<ColumnKind>,
    pub num_rows: usize,
    pub term_source: Vec<String>,
    pub terms_sample_size: Option<usize>,
    pub num_term_columns: usize,
    pub num_term_list_columns: usize,
    pub max_term_list_choices: usize,
    pub num_subconcepts: usize,
    pub num_subconcept_rows: Option<usize>,
}

impl DatasetSpec {
    #[must_use]
    pub fn new(num_rows: usize, term_source: Vec<String>) -> Self {
        Self {
            label: DEFAULT_LABEL.to_owned(),
            kinds: ColumnKind::ALL.to_vec(),
            num_rows,
            term_source,
            terms_sample_size: None,
            num_term_columns: 1,
            num_term_list_columns: 0,
            max_term_list_choices: 2,
            num_subconcepts: 1,
            num_subconcept_rows: None,
        }
    }

    /// Terms drawn per pool when no explicit size is set: a tenth of the
    /// row count rounded half up, never below ten.
    #[must_use]
    pub fn effective_sample_size(&self) -> usize {
        self.terms_sample_size
            .unwrap_or_else(|| ((self.num_rows + 5) / 10).max(10))
    }

    /// Rows per subconcept pool when no explicit count is set: half the
    /// row count rounded half up, never below ten.
    #[must_use]
    pub fn effective_subconcept_rows(&self) -> usize {
        self.num_subconcept_rows
            .unwrap_or_else(|| ((self.num_rows + 1) / 2).max(10))
    }
}

/// Conventional file name for a generated dataset, e.g. `1000.csv`. The
/// numeric stem is what lets downstream summaries recover the row count.
#[must_use]
pub fn dataset_file_name(num_rows: usize) -> String {
    format!("{num_rows}{}", naming::TABLE_EXT)
}

/// Generates the dataset described by `spec` and writes it to `out` as
/// comma-separated text, header first.
///
/// Term pools are sampled independently per column. Every subconcept
/// shares the parent's pools, so term values overlap across levels the
/// way repeated vocabulary does in real records.
///
/// # Errors
///
/// Returns an error when pool sampling is impossible for the source, when
/// the spec describes an invalid template, or when writing fails.
pub fn write_dataset<W: Write, R: Rng>(
    spec: &DatasetSpec,
    rng: &mut R,
    out: W,
) -> BenchResult<()> {
    let sample_size = spec.effective_sample_size();
    let mut term_pools = Vec::with_capacity(spec.num_term_columns);
    for _ in 0..spec.num_term_columns {
        term_pools.push(TermPool::sample(&spec.term_source, sample_size, &mut *rng)?);
    }
    let mut term_list_pools = Vec::with_capacity(spec.num_term_list_columns);
    for _ in 0..spec.num_term_list_columns {
        term_list_pools.push(TermPool::sample(&spec.term_source, sample_size, &mut *rng)?);
    }
    let term_pool_refs: Vec<&TermPool> = term_pools.iter().collect();
    let term_list_pool_refs: Vec<&TermPool> = term_list_pools.iter().collect();

    let subconcept_rows = spec.effective_subconcept_rows();
    let mut subconcept_pools = Vec::with_capacity(spec.num_subconcepts);
    for i in 0..spec.num_subconcepts {
        let template = EntityTemplate::new(
            naming::subconcept_label(i),
            spec.kinds.clone(),
            term_pool_refs.clone(),
            term_list_pool_refs.clone(),
            spec.max_term_list_choices,
            vec![],
        )?;
        subconcept_pools.push(FlatRecordPool::materialize(
            &template,
            subconcept_rows,
            &mut *rng,
        )?);
    }

    let template = EntityTemplate::new(
        spec.label.clone(),
        spec.kinds.clone(),
        term_pool_refs,
        term_list_pool_refs,
        spec.max_term_list_choices,
        subconcept_pools.iter().collect(),
    )?;

    let mut producer = template.producer(rng);
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(producer.header())?;
    for _ in 0..spec.num_rows {
        writer.write_record(producer.next_row())?;
    }
    writer.flush()?;
    Ok(())
}
