//! Delimited-text reference backend.
//!
//! A catalog root is a directory. A schema is a subdirectory (`.` names the
//! root itself), and a table is a delimited-text file with a header row.
//! Relation evaluation is deliberately shallow: it projects, de-duplicates
//! and derives over full in-memory reads, which is enough to move realistic
//! byte volumes through an evolution scope without owning any normalization
//! semantics of its own.
//!
//! With auto reclamation disabled, buffers evaluated during a scope are
//! retained in a retirement list until [`Catalog::reclaim`] releases them.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Catalog;
use crate::error::{CatalogError, CatalogResult};
use crate::relation::{ColumnRef, Relation, TableRef};

/// Locator prefix accepted by [`DelimitedCatalog::connect`].
pub const FILE_SCHEME: &str = "file://";

/// Extension tried when a bare table name does not resolve directly.
pub const TABLE_EXT: &str = ".csv";

// ── Handle ─────────────────────────────────────────────────────────────

/// In-memory evaluation of one relation.
#[derive(Debug, Clone)]
struct Materialized {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One staged assignment inside a consolidated scope.
#[derive(Debug)]
struct PendingAssign {
    schema: String,
    name: String,
    relation: Relation,
}

#[derive(Debug)]
struct EvolveState {
    consolidate: bool,
    pending: Vec<PendingAssign>,
}

/// Catalog handle over a directory of delimited-text tables.
#[derive(Debug)]
pub struct DelimitedCatalog {
    root: PathBuf,
    auto_reclaim: bool,
    evolve: Option<EvolveState>,
    retired: Vec<Materialized>,
}

impl DelimitedCatalog {
    /// Opens a handle on `locator`, either a `file://` URL or a bare
    /// directory path.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidLocator`] when the locator does not
    /// name an existing directory.
    pub fn connect(locator: &str) -> CatalogResult<Self> {
        let path = locator.strip_prefix(FILE_SCHEME).unwrap_or(locator);
        if path.is_empty() {
            return Err(CatalogError::InvalidLocator {
                locator: locator.to_owned(),
                reason: "empty path".to_owned(),
            });
        }
        let root = PathBuf::from(path);
        if !root.is_dir() {
            return Err(CatalogError::InvalidLocator {
                locator: locator.to_owned(),
                reason: "not a directory".to_owned(),
            });
        }
        debug!(root = %root.display(), "connected delimited catalog");
        Ok(Self {
            root,
            auto_reclaim: true,
            evolve: None,
            retired: Vec::new(),
        })
    }

    /// Number of evaluated buffers currently awaiting reclamation.
    #[must_use]
    pub fn retired_buffers(&self) -> usize {
        self.retired.len()
    }

    fn schema_dir(&self, schema: &str) -> PathBuf {
        if schema == "." {
            self.root.clone()
        } else {
            self.root.join(schema)
        }
    }

    fn resolve_table_file(&self, schema: &str, name: &str) -> CatalogResult<PathBuf> {
        let dir = self.schema_dir(schema);
        if !dir.is_dir() {
            return Err(CatalogError::SchemaNotFound(schema.to_owned()));
        }
        let direct = dir.join(name);
        if direct.is_file() {
            return Ok(direct);
        }
        let with_ext = dir.join(format!("{name}{TABLE_EXT}"));
        if with_ext.is_file() {
            return Ok(with_ext);
        }
        Err(CatalogError::TableNotFound {
            schema: schema.to_owned(),
            name: name.to_owned(),
        })
    }

    fn read_materialized(path: &Path) -> CatalogResult<Materialized> {
        let mut reader = csv::Reader::from_path(path)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(Materialized { header, rows })
    }

    fn read_table(&self, schema: &str, name: &str) -> CatalogResult<Materialized> {
        let path = self.resolve_table_file(schema, name)?;
        Self::read_materialized(&path)
    }

    fn read_column(&self, column: &ColumnRef) -> CatalogResult<Vec<String>> {
        let table = self.read_table(column.schema(), column.table())?;
        let pos = column_position(&table.header, column.name(), column.table())?;
        Ok(table.rows.into_iter().map(|mut r| r.swap_remove(pos)).collect())
    }

    fn write_table(&self, schema: &str, name: &str, table: &Materialized) -> CatalogResult<()> {
        let dir = self.schema_dir(schema);
        if !dir.is_dir() {
            return Err(CatalogError::SchemaNotFound(schema.to_owned()));
        }
        let mut writer = csv::Writer::from_path(dir.join(name))?;
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn retire(&mut self, buffer: Materialized) {
        if self.auto_reclaim {
            return;
        }
        self.retired.push(buffer);
        debug!(retired = self.retired.len(), "buffer retired");
    }

    // ── Relation evaluation ────────────────────────────────────────────

    fn evaluate(&self, relation: &Relation) -> CatalogResult<Materialized> {
        let out = match relation {
            Relation::Select { source, columns } => {
                if columns.is_empty() {
                    return Err(CatalogError::EmptyRelation);
                }
                let table = self.read_table(source.schema(), source.name())?;
                let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
                let positions = column_positions(&table.header, &names, source.name())?;
                let header = columns
                    .iter()
                    .map(|c| c.alias.clone().unwrap_or_else(|| c.name.clone()))
                    .collect();
                let rows = project(&table.rows, &positions);
                Materialized { header, rows }
            }

            Relation::Reify {
                source,
                key_columns,
                nonkey_columns,
            } => {
                if key_columns.is_empty() && nonkey_columns.is_empty() {
                    return Err(CatalogError::EmptyRelation);
                }
                let table = self.read_table(source.schema(), source.name())?;
                let mut names = key_columns.clone();
                names.extend(nonkey_columns.iter().cloned());
                let positions = column_positions(&table.header, &names, source.name())?;
                let projected = project(&table.rows, &positions);
                // One entity per distinct key tuple; first occurrence wins.
                let key_len = key_columns.len();
                let mut seen = HashSet::new();
                let rows = projected
                    .into_iter()
                    .filter(|row| seen.insert(row[..key_len].to_vec()))
                    .collect();
                Materialized {
                    header: names,
                    rows,
                }
            }

            Relation::ReifySub { source, columns } => {
                if columns.is_empty() {
                    return Err(CatalogError::EmptyRelation);
                }
                let table = self.read_table(source.schema(), source.name())?;
                let positions = column_positions(&table.header, columns, source.name())?;
                let rows = distinct(project(&table.rows, &positions));
                Materialized {
                    header: columns.clone(),
                    rows,
                }
            }

            Relation::RenameAll {
                source,
                from_label,
                to_label,
            } => {
                let mut table = self.evaluate(source)?;
                for name in &mut table.header {
                    *name = name.replace(from_label.as_str(), to_label.as_str());
                }
                table
            }

            Relation::Union { left, right } => {
                let mut lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                if lhs.header.len() != rhs.header.len() {
                    return Err(CatalogError::IncompatibleUnion {
                        left: lhs.header.len(),
                        right: rhs.header.len(),
                    });
                }
                lhs.rows.extend(rhs.rows);
                lhs
            }

            Relation::Domain { sources } => {
                let Some(first) = sources.first() else {
                    return Err(CatalogError::EmptyRelation);
                };
                let mut values = Vec::new();
                for source in sources {
                    values.extend(self.read_column(source)?);
                }
                let rows = distinct(values.into_iter().map(|v| vec![v]).collect());
                Materialized {
                    header: vec![first.name().to_owned()],
                    rows,
                }
            }

            Relation::Vocabulary { source } => {
                let values = self.read_column(source)?;
                let rows = distinct(values.into_iter().map(|v| vec![v]).collect())
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut row)| vec![format!("v{i:06}"), row.swap_remove(0)])
                    .collect();
                Materialized {
                    header: vec!["id".to_owned(), source.name().to_owned()],
                    rows,
                }
            }

            Relation::Atoms { source, delimiter } => {
                let values = self.read_column(source)?;
                let mut rows = Vec::new();
                for value in &values {
                    for atom in split_atoms(value, *delimiter) {
                        rows.push(vec![atom]);
                    }
                }
                Materialized {
                    header: vec![source.name().to_owned()],
                    rows,
                }
            }

            Relation::Tags {
                source,
                vocabulary,
                delimiter,
            } => {
                let vocab = self.evaluate(vocabulary)?;
                if vocab.header.len() < 2 {
                    return Err(CatalogError::EmptyRelation);
                }
                // First column is the identifier, second the aligned value.
                let mut by_value: HashMap<String, String> = HashMap::new();
                for row in &vocab.rows {
                    by_value
                        .entry(normalize(&row[1]))
                        .or_insert_with(|| row[0].clone());
                }
                let values = self.read_column(source)?;
                let mut rows = Vec::new();
                for value in &values {
                    for atom in split_atoms(value, *delimiter) {
                        let id = by_value.get(&normalize(&atom)).cloned().unwrap_or_default();
                        rows.push(vec![atom, id]);
                    }
                }
                Materialized {
                    header: vec![source.name().to_owned(), "id".to_owned()],
                    rows,
                }
            }
        };

        debug!(
            kind = relation_kind(relation),
            rows = out.rows.len(),
            "evaluated relation"
        );
        Ok(out)
    }
}

impl Catalog for DelimitedCatalog {
    fn table(&self, schema: &str, name: &str) -> CatalogResult<TableRef> {
        let path = self.resolve_table_file(schema, name)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| CatalogError::TableNotFound {
                schema: schema.to_owned(),
                name: name.to_owned(),
            })?;
        let mut reader = csv::Reader::from_path(&path)?;
        let columns = reader.headers()?.iter().map(str::to_owned).collect();
        Ok(TableRef::new(schema, file_name, columns))
    }

    fn set_auto_reclaim(&mut self, enabled: bool) {
        self.auto_reclaim = enabled;
        if enabled {
            self.retired.clear();
        }
    }

    fn reclaim(&mut self) -> CatalogResult<()> {
        let released = self.retired.len();
        self.retired.clear();
        debug!(released, "reclaimed retired buffers");
        Ok(())
    }

    fn begin_evolve(&mut self, consolidate: bool) -> CatalogResult<()> {
        if self.evolve.is_some() {
            return Err(CatalogError::EvolutionAlreadyOpen);
        }
        self.evolve = Some(EvolveState {
            consolidate,
            pending: Vec::new(),
        });
        Ok(())
    }

    fn assign(&mut self, schema: &str, name: &str, relation: Relation) -> CatalogResult<()> {
        let consolidate = match &self.evolve {
            Some(state) => state.consolidate,
            None => return Err(CatalogError::NoOpenEvolution),
        };
        if consolidate {
            if let Some(state) = self.evolve.as_mut() {
                state.pending.push(PendingAssign {
                    schema: schema.to_owned(),
                    name: name.to_owned(),
                    relation,
                });
            }
            return Ok(());
        }
        let evaluated = self.evaluate(&relation)?;
        self.write_table(schema, name, &evaluated)?;
        self.retire(evaluated);
        Ok(())
    }

    fn commit_evolve(&mut self) -> CatalogResult<()> {
        let Some(state) = self.evolve.take() else {
            return Err(CatalogError::NoOpenEvolution);
        };
        for staged in state.pending {
            let evaluated = self.evaluate(&staged.relation)?;
            self.write_table(&staged.schema, &staged.name, &evaluated)?;
            self.retire(evaluated);
        }
        Ok(())
    }

    fn abort_evolve(&mut self) {
        if self.evolve.take().is_some() {
            debug!("evolution scope aborted");
        }
    }
}

// ── Evaluation helpers ─────────────────────────────────────────────────

fn column_position(header: &[String], name: &str, table: &str) -> CatalogResult<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CatalogError::ColumnNotFound {
            table: table.to_owned(),
            column: name.to_owned(),
        })
}

fn column_positions(header: &[String], names: &[String], table: &str) -> CatalogResult<Vec<usize>> {
    names
        .iter()
        .map(|name| column_position(header, name, table))
        .collect()
}

fn project(rows: &[Vec<String>], positions: &[usize]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
        .collect()
}

/// Removes duplicate rows, keeping first occurrences in order.
fn distinct(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}

/// Splits a delimited list value; elements are trimmed and empty elements
/// dropped, so an empty list value yields no atoms.
fn split_atoms(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Alignment key: trimmed, case-folded.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn relation_kind(relation: &Relation) -> &'static str {
    match relation {
        Relation::Select { .. } => "select",
        Relation::Reify { .. } => "reify",
        Relation::ReifySub { .. } => "reify_sub",
        Relation::RenameAll { .. } => "rename_all",
        Relation::Union { .. } => "union",
        Relation::Domain { .. } => "domain",
        Relation::Vocabulary { .. } => "vocabulary",
        Relation::Atoms { .. } => "atoms",
        Relation::Tags { .. } => "tags",
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
