//! Deferred relation expressions.
//!
//! Callers build [`Relation`] values against table metadata and hand them to
//! an evolution scope for materialization. Expressions are pure data: nothing
//! is read or written until the backend evaluates them, which is what lets a
//! consolidated scope batch several assignments into one pass.

use crate::error::{CatalogError, CatalogResult};

// ── Table and column references ────────────────────────────────────────

/// Metadata snapshot of a stored table: where it lives and its column names,
/// in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: String,
    name: String,
    columns: Vec<String>,
}

impl TableRef {
    /// Builds a reference from resolved metadata. Backends call this from
    /// their `table` lookup; harness code should not need to.
    #[must_use]
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in on-disk order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Resolves one column by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ColumnNotFound`] if the table has no column
    /// with that name.
    pub fn column(&self, name: &str) -> CatalogResult<ColumnRef> {
        if !self.columns.iter().any(|c| c == name) {
            return Err(CatalogError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_owned(),
            });
        }
        Ok(ColumnRef {
            schema: self.schema.clone(),
            table: self.name.clone(),
            column: name.to_owned(),
        })
    }

    /// Entity extraction: `key_columns` identify the new concept, which
    /// carries `nonkey_columns` as attributes. One output row per distinct
    /// key tuple.
    #[must_use]
    pub fn reify<K, N>(&self, key_columns: K, nonkey_columns: N) -> Relation
    where
        K: IntoIterator,
        K::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Relation::Reify {
            source: self.clone(),
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            nonkey_columns: nonkey_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Subconcept extraction: the projected columns become a child table,
    /// with duplicate rows collapsed.
    #[must_use]
    pub fn reify_sub<I>(&self, columns: I) -> Relation
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Relation::ReifySub {
            source: self.clone(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Plain projection, optionally aliasing output columns.
    #[must_use]
    pub fn select<I>(&self, columns: I) -> Relation
    where
        I: IntoIterator<Item = SelectColumn>,
    {
        Relation::Select {
            source: self.clone(),
            columns: columns.into_iter().collect(),
        }
    }
}

/// A column of a stored table, fully qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    schema: String,
    table: String,
    column: String,
}

impl ColumnRef {
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.column
    }

    /// Distinct values of this column as a single-column domain table.
    #[must_use]
    pub fn to_domain(&self) -> Relation {
        Relation::Domain {
            sources: vec![self.clone()],
        }
    }

    /// Distinct values paired with synthetic identifiers.
    #[must_use]
    pub fn to_vocabulary(&self) -> Relation {
        Relation::Vocabulary {
            source: self.clone(),
        }
    }

    /// Unnests a delimited list column into one value per row.
    #[must_use]
    pub fn to_atoms(&self, delimiter: char) -> Relation {
        Relation::Atoms {
            source: self.clone(),
            delimiter,
        }
    }

    /// Unnests a delimited list column and aligns each value against a
    /// vocabulary, pairing it with the matching identifier.
    #[must_use]
    pub fn to_tags(&self, vocabulary: Relation, delimiter: char) -> Relation {
        Relation::Tags {
            source: self.clone(),
            vocabulary: Box::new(vocabulary),
            delimiter,
        }
    }
}

/// One projected column with an optional output alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    pub name: String,
    pub alias: Option<String>,
}

impl SelectColumn {
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

// ── Relation expressions ───────────────────────────────────────────────

/// A deferred schema-normalization expression over stored tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Projection of named source columns, with per-column aliasing.
    Select {
        source: TableRef,
        columns: Vec<SelectColumn>,
    },

    /// Entity extraction keyed by `key_columns`, carrying `nonkey_columns`.
    Reify {
        source: TableRef,
        key_columns: Vec<String>,
        nonkey_columns: Vec<String>,
    },

    /// Subconcept extraction: distinct projection of the named columns.
    ReifySub {
        source: TableRef,
        columns: Vec<String>,
    },

    /// Substring rename applied to every output column name of `source`.
    RenameAll {
        source: Box<Relation>,
        from_label: String,
        to_label: String,
    },

    /// Concatenation of two union-compatible relations.
    Union {
        left: Box<Relation>,
        right: Box<Relation>,
    },

    /// Distinct values drawn from one or more source columns.
    Domain { sources: Vec<ColumnRef> },

    /// Distinct values paired with synthetic identifiers.
    Vocabulary { source: ColumnRef },

    /// One row per delimited list element.
    Atoms { source: ColumnRef, delimiter: char },

    /// List elements aligned against a vocabulary relation.
    Tags {
        source: ColumnRef,
        vocabulary: Box<Relation>,
        delimiter: char,
    },
}

impl Relation {
    /// Shared domain over several source columns, which may come from
    /// different tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyRelation`] when `sources` is empty.
    pub fn domain_of(sources: Vec<ColumnRef>) -> CatalogResult<Self> {
        if sources.is_empty() {
            return Err(CatalogError::EmptyRelation);
        }
        Ok(Relation::Domain { sources })
    }

    /// Replaces `from_label` with `to_label` in every output column name.
    #[must_use]
    pub fn rename_all(self, from_label: impl Into<String>, to_label: impl Into<String>) -> Self {
        Relation::RenameAll {
            source: Box::new(self),
            from_label: from_label.into(),
            to_label: to_label.into(),
        }
    }

    /// Concatenates `self` with `other`. Width compatibility is checked at
    /// evaluation time.
    #[must_use]
    pub fn union(self, other: Relation) -> Self {
        Relation::Union {
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableRef {
        TableRef::new(
            ".",
            "1000.csv",
            vec![
                "data:key".to_owned(),
                "data:int:0".to_owned(),
                "data:term:0".to_owned(),
            ],
        )
    }

    #[test]
    fn test_column_lookup_validates_name() {
        let t = sample_table();
        let col = t.column("data:term:0").unwrap();
        assert_eq!(col.name(), "data:term:0");
        assert_eq!(col.table(), "1000.csv");

        let err = t.column("data:term:9").unwrap_err();
        assert!(matches!(err, CatalogError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_reify_captures_key_and_nonkey() {
        let t = sample_table();
        let rel = t.reify(["data:key"], ["data:int:0", "data:term:0"]);
        match rel {
            Relation::Reify {
                key_columns,
                nonkey_columns,
                ..
            } => {
                assert_eq!(key_columns, vec!["data:key"]);
                assert_eq!(nonkey_columns.len(), 2);
            }
            other => panic!("expected Reify, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_of_rejects_empty_sources() {
        let err = Relation::domain_of(Vec::new()).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyRelation));
    }

    #[test]
    fn test_rename_then_union_composes() {
        let t = sample_table();
        let left = t.reify_sub(["data:term:0"]);
        let right = t.reify_sub(["data:term:0"]).rename_all("data", "subc0");
        let merged = left.union(right);
        assert!(matches!(merged, Relation::Union { .. }));
    }
}
