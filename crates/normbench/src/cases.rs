//! Test case families: the schema-normalization workloads a session can
//! measure.
//!
//! Each family builds relation expressions against the dataset table and
//! drives them through one evolution scope, so the condition decides
//! whether assignments materialize one by one or as a consolidated batch.
//! `preflight` checks a parameter against the dataset's columns before
//! anything is timed; `execute` is the timed body.

use normbench_catalog::relation::{Relation, SelectColumn, TableRef};
use normbench_catalog::{Catalog, EvolveGuard};
use serde::{Deserialize, Serialize};

use crate::matrix::Condition;
use crate::naming;
use crate::{BenchError, BenchResult};

/// One benchmarkable workload family, parameterized by `n` at run time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TestCase {
    ReifyNConcepts,
    ReifyNSubconcepts,
    ReifyNSubconceptsAndMerge,
    ReifyConceptAndNSubconcepts,
    CreateNDomainsFromNColumns,
    CreateNVocabulariesFromNColumns,
    CreateNRelationsFromListColumns,
    ReifyAndDeriveSharedDomain,
    CreateVocabularyThenAlignAndTag,
}

impl TestCase {
    pub const ALL: [TestCase; 9] = [
        TestCase::ReifyNConcepts,
        TestCase::ReifyNSubconcepts,
        TestCase::ReifyNSubconceptsAndMerge,
        TestCase::ReifyConceptAndNSubconcepts,
        TestCase::CreateNDomainsFromNColumns,
        TestCase::CreateNVocabulariesFromNColumns,
        TestCase::CreateNRelationsFromListColumns,
        TestCase::ReifyAndDeriveSharedDomain,
        TestCase::CreateVocabularyThenAlignAndTag,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestCase::ReifyNConcepts => "reify_n_concepts",
            TestCase::ReifyNSubconcepts => "reify_n_subconcepts",
            TestCase::ReifyNSubconceptsAndMerge => "reify_n_subconcepts_and_merge",
            TestCase::ReifyConceptAndNSubconcepts => "reify_concept_and_n_subconcepts",
            TestCase::CreateNDomainsFromNColumns => "create_n_domains_from_n_columns",
            TestCase::CreateNVocabulariesFromNColumns => "create_n_vocabularies_from_n_columns",
            TestCase::CreateNRelationsFromListColumns => "create_n_relations_from_list_columns",
            TestCase::ReifyAndDeriveSharedDomain => "reify_and_derive_shared_domain",
            TestCase::CreateVocabularyThenAlignAndTag => "create_vocabulary_then_align_and_tag",
        }
    }

    /// # Errors
    ///
    /// Returns a config error for an unknown test case name.
    pub fn parse(s: &str) -> BenchResult<Self> {
        TestCase::ALL
            .into_iter()
            .find(|case| case.as_str() == s)
            .ok_or_else(|| BenchError::Config(format!("unknown test case `{s}`")))
    }

    /// Parameter values a session runs when no explicit override is given.
    #[must_use]
    pub fn default_params(self) -> &'static [u32] {
        match self {
            TestCase::ReifyNConcepts | TestCase::ReifyNSubconcepts => &[1, 2, 3],
            TestCase::ReifyNSubconceptsAndMerge | TestCase::ReifyAndDeriveSharedDomain => &[2, 3],
            TestCase::ReifyConceptAndNSubconcepts | TestCase::CreateNRelationsFromListColumns => {
                &[1, 2]
            }
            TestCase::CreateNDomainsFromNColumns | TestCase::CreateNVocabulariesFromNColumns => {
                &[1, 2, 4]
            }
            TestCase::CreateVocabularyThenAlignAndTag => &[1],
        }
    }

    /// Checks that the dataset can support this family at `param`. Run
    /// before the timer starts, so misconfiguration never counts as
    /// measured work.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the missing columns or blocks.
    pub fn preflight(self, table: &TableRef, param: u32) -> BenchResult<()> {
        if param == 0 {
            return Err(BenchError::Config(
                "test parameter must be at least 1".to_owned(),
            ));
        }
        let n = param as usize;
        match self {
            TestCase::ReifyNConcepts
            | TestCase::ReifyNSubconcepts
            | TestCase::ReifyNSubconceptsAndMerge => {
                for i in 0..n {
                    subconcept_block(table, i)?;
                }
            }
            TestCase::ReifyConceptAndNSubconcepts => {
                for i in 0..=n {
                    subconcept_block(table, i)?;
                }
            }
            TestCase::CreateNDomainsFromNColumns | TestCase::CreateNVocabulariesFromNColumns => {
                require_plain_term_columns(table, n)?;
            }
            TestCase::CreateNRelationsFromListColumns => {
                require_term_list_columns(table, n)?;
            }
            TestCase::ReifyAndDeriveSharedDomain => {
                for i in 0..n {
                    subconcept_block(table, i)?;
                    subconcept_term_column(table, i)?;
                }
            }
            TestCase::CreateVocabularyThenAlignAndTag => {
                require_plain_term_columns(table, n)?;
                require_term_list_columns(table, 1)?;
            }
        }
        Ok(())
    }

    /// Runs the family body inside one evolution scope and commits it.
    /// This is the region a driver should time.
    ///
    /// # Errors
    ///
    /// Propagates catalog failures; a config error is returned when the
    /// dataset cannot support the parameter (the same checks `preflight`
    /// makes). On error the scope aborts and nothing further is written.
    pub fn execute<C: Catalog>(
        self,
        catalog: &mut C,
        table: &TableRef,
        output_schema: &str,
        param: u32,
        condition: Condition,
    ) -> BenchResult<()> {
        let n = param as usize;
        let mut scope = catalog.evolve(condition.consolidate())?;
        match self {
            TestCase::ReifyNConcepts => reify_n_concepts(&mut scope, table, output_schema, n)?,
            TestCase::ReifyNSubconcepts => {
                reify_n_subconcepts(&mut scope, table, output_schema, n)?;
            }
            TestCase::ReifyNSubconceptsAndMerge => {
                reify_n_subconcepts_and_merge(&mut scope, table, output_schema, n)?;
            }
            TestCase::ReifyConceptAndNSubconcepts => {
                reify_concept_and_n_subconcepts(&mut scope, table, output_schema, n)?;
            }
            TestCase::CreateNDomainsFromNColumns => {
                create_n_domains(&mut scope, table, output_schema, n)?;
            }
            TestCase::CreateNVocabulariesFromNColumns => {
                create_n_vocabularies(&mut scope, table, output_schema, n)?;
            }
            TestCase::CreateNRelationsFromListColumns => {
                create_n_relations_from_list_columns(&mut scope, table, output_schema, n)?;
            }
            TestCase::ReifyAndDeriveSharedDomain => {
                reify_and_derive_shared_domain(&mut scope, table, output_schema, n)?;
            }
            TestCase::CreateVocabularyThenAlignAndTag => {
                create_vocabulary_then_align_and_tag(&mut scope, table, output_schema, n)?;
            }
        }
        scope.commit()?;
        Ok(())
    }
}

impl std::fmt::Display for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Column selection ───────────────────────────────────────────────────

fn subconcept_block(table: &TableRef, index: usize) -> BenchResult<Vec<String>> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| naming::is_subconcept_column(c, index))
        .cloned()
        .collect();
    if columns.is_empty() {
        return Err(BenchError::Config(format!(
            "dataset `{}` has no subconcept block {index}",
            table.name()
        )));
    }
    Ok(columns)
}

fn subconcept_term_column(table: &TableRef, index: usize) -> BenchResult<String> {
    let name = naming::term_column(&naming::subconcept_label(index), 0);
    if !table.columns().iter().any(|c| c == &name) {
        return Err(BenchError::Config(format!(
            "subconcept block {index} of dataset `{}` has no `{name}` column",
            table.name()
        )));
    }
    Ok(name)
}

fn require_plain_term_columns(table: &TableRef, n: usize) -> BenchResult<Vec<String>> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| naming::is_term_column(c))
        .cloned()
        .collect();
    if columns.len() < n {
        return Err(BenchError::Config(format!(
            "dataset `{}` has {} plain term columns, test needs {n}",
            table.name(),
            columns.len()
        )));
    }
    Ok(columns)
}

fn require_term_list_columns(table: &TableRef, n: usize) -> BenchResult<Vec<String>> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| naming::is_term_list_column(c))
        .cloned()
        .collect();
    if columns.len() < n {
        return Err(BenchError::Config(format!(
            "dataset `{}` has {} term-list columns, test needs {n}",
            table.name(),
            columns.len()
        )));
    }
    Ok(columns)
}

// ── Family bodies ──────────────────────────────────────────────────────

/// The original table with the reified columns projected away, written as
/// the new core.
fn assign_altered_core<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    exclude: &[String],
) -> BenchResult<()> {
    let keep = table
        .columns()
        .iter()
        .filter(|c| !exclude.contains(c))
        .map(SelectColumn::plain);
    scope.assign(output_schema, &naming::core_table(), table.select(keep))?;
    Ok(())
}

fn reify_n_concepts<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let mut exclude = Vec::new();
    for i in 0..n {
        let key = naming::key_column(&naming::subconcept_label(i));
        let nonkeys: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| naming::is_subconcept_nonkey_column(c, i))
            .cloned()
            .collect();
        let concept = table.reify([key], nonkeys.iter().cloned());
        scope.assign(output_schema, &naming::concept_table(i), concept)?;
        exclude.extend(nonkeys);
    }
    assign_altered_core(scope, table, output_schema, &exclude)
}

fn reify_n_subconcepts<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let mut exclude = Vec::new();
    for i in 0..n {
        let columns = subconcept_block(table, i)?;
        let subconcept = table.reify_sub(columns.iter().cloned());
        scope.assign(output_schema, &naming::subconcept_table(i), subconcept)?;
        exclude.extend(columns);
    }
    assign_altered_core(scope, table, output_schema, &exclude)
}

fn reify_n_subconcepts_and_merge<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let mut exclude = Vec::new();
    let mut merged: Option<Relation> = None;
    for i in 0..n {
        let columns = subconcept_block(table, i)?;
        let mut subconcept = table.reify_sub(columns.iter().cloned());
        if i > 0 {
            subconcept = subconcept
                .rename_all(naming::subconcept_label(i), naming::subconcept_label(0));
        }
        merged = Some(match merged {
            Some(left) => left.union(subconcept),
            None => subconcept,
        });
        exclude.extend(columns);
    }
    if let Some(merged) = merged {
        scope.assign(output_schema, &naming::subconcept_table(0), merged)?;
    }
    assign_altered_core(scope, table, output_schema, &exclude)
}

fn reify_concept_and_n_subconcepts<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let mut exclude = Vec::new();

    // Block 0 becomes a concept; its key stays behind in the core.
    let key = naming::key_column(&naming::subconcept_label(0));
    let nonkeys: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| naming::is_subconcept_nonkey_column(c, 0))
        .cloned()
        .collect();
    let concept = table.reify([key], nonkeys.iter().cloned());
    scope.assign(output_schema, &naming::concept_table(0), concept)?;
    exclude.extend(nonkeys);

    for i in 1..=n {
        let columns = subconcept_block(table, i)?;
        let subconcept = table.reify_sub(columns.iter().cloned());
        scope.assign(output_schema, &naming::subconcept_table(i), subconcept)?;
        exclude.extend(columns);
    }
    assign_altered_core(scope, table, output_schema, &exclude)
}

fn create_n_domains<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let term_columns = require_plain_term_columns(table, n)?;
    for (i, name) in term_columns.iter().take(n).enumerate() {
        let domain = table.column(name)?.to_domain();
        scope.assign(output_schema, &naming::term_table(i), domain)?;
    }
    Ok(())
}

fn create_n_vocabularies<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let term_columns = require_plain_term_columns(table, n)?;
    for (i, name) in term_columns.iter().take(n).enumerate() {
        let vocabulary = table.column(name)?.to_vocabulary();
        scope.assign(output_schema, &naming::term_table(i), vocabulary)?;
    }
    Ok(())
}

fn create_n_relations_from_list_columns<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let list_columns = require_term_list_columns(table, n)?;
    for (i, name) in list_columns.iter().take(n).enumerate() {
        let atoms = table.column(name)?.to_atoms(naming::LIST_DELIMITER);
        scope.assign(output_schema, &naming::term_list_table(i), atoms)?;
    }
    Ok(())
}

fn reify_and_derive_shared_domain<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let mut exclude = Vec::new();
    let mut domain_sources = Vec::with_capacity(n);
    for i in 0..n {
        let columns = subconcept_block(table, i)?;
        let subconcept = table.reify_sub(columns.iter().cloned());
        scope.assign(output_schema, &naming::subconcept_table(i), subconcept)?;
        domain_sources.push(table.column(&subconcept_term_column(table, i)?)?);
        exclude.extend(columns);
    }
    let domain = Relation::domain_of(domain_sources)?;
    scope.assign(output_schema, &naming::term_table(0), domain)?;
    assign_altered_core(scope, table, output_schema, &exclude)
}

fn create_vocabulary_then_align_and_tag<C: Catalog + ?Sized>(
    scope: &mut EvolveGuard<'_, C>,
    table: &TableRef,
    output_schema: &str,
    n: usize,
) -> BenchResult<()> {
    let term_columns = require_plain_term_columns(table, n)?;
    let list_columns = require_term_list_columns(table, 1)?;
    let list_column = table.column(&list_columns[0])?;
    for (i, name) in term_columns.iter().take(n).enumerate() {
        let vocabulary = table.column(name)?.to_vocabulary();
        scope.assign(output_schema, &naming::term_table(i), vocabulary.clone())?;
        let tags = list_column.to_tags(vocabulary, naming::LIST_DELIMITER);
        scope.assign(output_schema, &naming::tags_table(i), tags)?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────
