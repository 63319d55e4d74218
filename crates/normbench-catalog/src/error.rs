//! Error types for catalog operations.

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalog handles and relation evaluation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    // === Connection ===
    /// The locator string could not be resolved to a catalog root.
    #[error("invalid catalog locator `{locator}`: {reason}")]
    InvalidLocator { locator: String, reason: String },

    // === Name resolution ===
    /// The named schema does not exist under the catalog root.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// The named table does not exist in the schema.
    #[error("table not found: {schema}/{name}")]
    TableNotFound { schema: String, name: String },

    /// The named column does not exist in the table.
    #[error("column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    // === Relation evaluation ===
    /// A relation expression resolved to zero output columns.
    #[error("relation produced no columns")]
    EmptyRelation,

    /// Union arms do not have the same column count.
    #[error("union arms have incompatible widths ({left} vs {right})")]
    IncompatibleUnion { left: usize, right: usize },

    // === Evolution scope misuse ===
    /// An assignment or commit was attempted with no open evolution scope.
    #[error("no open evolution scope")]
    NoOpenEvolution,

    /// `begin_evolve` was called while a scope was already open.
    #[error("evolution scope already open")]
    EvolutionAlreadyOpen,

    // === I/O ===
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}
