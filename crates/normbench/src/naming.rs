//! Column-naming grammar and classification filters.
//!
//! Generated datasets encode column roles in their names
//! (`data:key`, `data:int:0`, `subc1:term:0`, …) and the harness recovers
//! those roles by string filtering. The filters are a compatibility
//! contract with existing fixtures, so every name construction and every
//! classification lives here and nowhere else.

use serde::{Deserialize, Serialize};

/// Altered-original output table stem.
pub const CORE: &str = "core";
/// Reified-concept output table stem.
pub const CONCEPT: &str = "conc";
/// Subconcept label and output table stem.
pub const SUBCONCEPT: &str = "subc";
/// Plain term column tag.
pub const TERM: &str = "term";
/// Term-list column tag.
pub const TERM_LIST: &str = "termlist";
/// Key column tag.
pub const KEY: &str = "key";
/// Extension of stored tables.
pub const TABLE_EXT: &str = ".csv";
/// Separator between the label, the role tag, and the index.
pub const COLUMN_SEP: char = ':';
/// Delimiter joining the elements of a term-list value.
pub const LIST_DELIMITER: char = ';';

// ── Column kinds ───────────────────────────────────────────────────────

/// Simple (non-term) column kinds supported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    /// All kinds, in the default generation order.
    pub const ALL: [ColumnKind; 3] = [ColumnKind::Text, ColumnKind::Int, ColumnKind::Float];

    /// Canonical name used inside column names and on the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
        }
    }

    /// Parses a canonical kind name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Name construction ──────────────────────────────────────────────────

/// `{label}:key`
#[must_use]
pub fn key_column(label: &str) -> String {
    format!("{label}{COLUMN_SEP}{KEY}")
}

/// `{label}:{kind}:{index}`
#[must_use]
pub fn typed_column(label: &str, kind: ColumnKind, index: usize) -> String {
    format!("{label}{COLUMN_SEP}{kind}{COLUMN_SEP}{index}")
}

/// `{label}:term:{index}`
#[must_use]
pub fn term_column(label: &str, index: usize) -> String {
    format!("{label}{COLUMN_SEP}{TERM}{COLUMN_SEP}{index}")
}

/// `{label}:termlist:{index}`
#[must_use]
pub fn term_list_column(label: &str, index: usize) -> String {
    format!("{label}{COLUMN_SEP}{TERM_LIST}{COLUMN_SEP}{index}")
}

/// `subc{index}`
#[must_use]
pub fn subconcept_label(index: usize) -> String {
    format!("{SUBCONCEPT}{index}")
}

/// `core.csv`
#[must_use]
pub fn core_table() -> String {
    format!("{CORE}{TABLE_EXT}")
}

/// `conc{index}.csv`
#[must_use]
pub fn concept_table(index: usize) -> String {
    format!("{CONCEPT}{index}{TABLE_EXT}")
}

/// `subc{index}.csv`
#[must_use]
pub fn subconcept_table(index: usize) -> String {
    format!("{SUBCONCEPT}{index}{TABLE_EXT}")
}

/// `term{index}.csv`
#[must_use]
pub fn term_table(index: usize) -> String {
    format!("{TERM}{index}{TABLE_EXT}")
}

/// `termlist{index}.csv`
#[must_use]
pub fn term_list_table(index: usize) -> String {
    format!("{TERM_LIST}{index}{TABLE_EXT}")
}

/// `tags{index}.csv`
#[must_use]
pub fn tags_table(index: usize) -> String {
    format!("tags{index}{TABLE_EXT}")
}

// ── Classification ─────────────────────────────────────────────────────

/// Any column of the `subc{index}` block. The trailing separator keeps
/// `subc1:` from matching `subc10:` columns.
#[must_use]
pub fn is_subconcept_column(name: &str, index: usize) -> bool {
    let prefix = format!("{SUBCONCEPT}{index}{COLUMN_SEP}");
    name.starts_with(&prefix)
}

/// A `subc{index}` column that is not a key. Key detection is a substring
/// check on the whole name, matching how fixtures have always been
/// classified.
#[must_use]
pub fn is_subconcept_nonkey_column(name: &str, index: usize) -> bool {
    is_subconcept_column(name, index) && !name.contains(KEY)
}

/// A plain term column: mentions `term` anywhere but not `termlist`. Any
/// new column family embedding `term` in its tag must keep `termlist` out
/// of plain-term matches.
#[must_use]
pub fn is_term_column(name: &str) -> bool {
    name.contains(TERM) && !name.contains(TERM_LIST)
}

/// A term-list column: mentions `termlist` anywhere.
#[must_use]
pub fn is_term_list_column(name: &str) -> bool {
    name.contains(TERM_LIST)
}

// ── Tests ──────────────────────────────────────────────────────────────
