//! Typed seam between the benchmark harness and a schema-evolution catalog.
//!
//! This crate defines the interface the harness drives and one reference
//! backend:
//!
//! - [`Catalog`]: handle operations (table lookup, evolution scopes, buffer
//!   reclamation)
//! - [`relation`]: deferred relation expressions built by callers and
//!   evaluated by backends at materialization time
//! - [`delimited`]: a reference backend over a directory of delimited-text
//!   tables
//! - [`error`]: structured error types
//!
//! Transformation semantics (what reifying a concept or deriving a
//! vocabulary means for the stored model) belong to backends. Callers only
//! build expressions, assign them inside an evolution scope, and observe
//! the resulting tables.

pub mod delimited;
pub mod error;
pub mod relation;

use crate::error::CatalogResult;
use crate::relation::{Relation, TableRef};

// ── Catalog handle ─────────────────────────────────────────────────────

/// An open catalog handle.
///
/// Evolution scopes are opened with [`Catalog::evolve`], which returns an
/// RAII guard. The `begin_evolve` / `assign` / `commit_evolve` /
/// `abort_evolve` methods are the raw hooks the guard drives; backends must
/// implement them, callers should not invoke them directly.
pub trait Catalog {
    /// Resolves table metadata in the given schema.
    ///
    /// # Errors
    ///
    /// Returns [`error::CatalogError::SchemaNotFound`] or
    /// [`error::CatalogError::TableNotFound`] when resolution fails.
    fn table(&self, schema: &str, name: &str) -> CatalogResult<TableRef>;

    /// Controls whether retired buffers are released automatically at the
    /// end of each evolution scope. Disabled handles retain them until
    /// [`Catalog::reclaim`] runs.
    fn set_auto_reclaim(&mut self, enabled: bool);

    /// Synchronously releases all retired buffers.
    ///
    /// # Errors
    ///
    /// Backend-specific; the delimited backend never fails here.
    fn reclaim(&mut self) -> CatalogResult<()>;

    /// Opens an evolution scope. See [`Catalog::evolve`].
    ///
    /// # Errors
    ///
    /// Returns [`error::CatalogError::EvolutionAlreadyOpen`] if a scope is
    /// already open on this handle.
    fn begin_evolve(&mut self, consolidate: bool) -> CatalogResult<()>;

    /// Materializes (or stages, in a consolidated scope) `relation` as the
    /// named table.
    ///
    /// # Errors
    ///
    /// Returns [`error::CatalogError::NoOpenEvolution`] outside a scope, or
    /// any evaluation error for an immediate materialization.
    fn assign(&mut self, schema: &str, name: &str, relation: Relation) -> CatalogResult<()>;

    /// Closes the open scope, evaluating staged assignments.
    ///
    /// # Errors
    ///
    /// Returns [`error::CatalogError::NoOpenEvolution`] outside a scope, or
    /// any evaluation error from staged assignments.
    fn commit_evolve(&mut self) -> CatalogResult<()>;

    /// Discards the open scope and any staged assignments. Idempotent.
    fn abort_evolve(&mut self);

    /// Opens a scoped evolution transaction.
    ///
    /// With `consolidate` unset, each assignment is evaluated and written
    /// immediately. With it set, assignments are staged and evaluated in
    /// one pass at [`EvolveGuard::commit`]. Dropping the guard without
    /// committing discards staged work.
    ///
    /// # Errors
    ///
    /// Returns [`error::CatalogError::EvolutionAlreadyOpen`] if a scope is
    /// already open on this handle.
    fn evolve(&mut self, consolidate: bool) -> CatalogResult<EvolveGuard<'_, Self>>
    where
        Self: Sized,
    {
        self.begin_evolve(consolidate)?;
        Ok(EvolveGuard {
            catalog: self,
            committed: false,
        })
    }
}

// ── Evolution scope guard ──────────────────────────────────────────────

/// RAII guard for an open evolution scope. Dropping without
/// [`EvolveGuard::commit`] aborts the scope.
#[must_use = "dropping an evolution scope without commit discards staged assignments"]
pub struct EvolveGuard<'c, C: Catalog + ?Sized> {
    catalog: &'c mut C,
    committed: bool,
}

impl<C: Catalog + ?Sized> EvolveGuard<'_, C> {
    /// Assigns `relation` to `schema`/`name` within this scope.
    ///
    /// # Errors
    ///
    /// Propagates evaluation or write errors from the backend.
    pub fn assign(&mut self, schema: &str, name: &str, relation: Relation) -> CatalogResult<()> {
        self.catalog.assign(schema, name, relation)
    }

    /// Commits the scope. In a consolidated scope this evaluates and writes
    /// every staged assignment.
    ///
    /// # Errors
    ///
    /// Propagates evaluation or write errors; the backend discards its
    /// scope state either way.
    pub fn commit(mut self) -> CatalogResult<()> {
        // Mark first so a failed commit is not followed by an abort of a
        // scope the backend already closed.
        self.committed = true;
        self.catalog.commit_evolve()
    }
}

impl<C: Catalog + ?Sized> Drop for EvolveGuard<'_, C> {
    fn drop(&mut self) {
        if !self.committed {
            self.catalog.abort_evolve();
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    /// Records scope transitions so guard behavior can be pinned without a
    /// real store.
    #[derive(Default)]
    struct ScopeRecorder {
        open: bool,
        assigned: Vec<String>,
        commits: usize,
        aborts: usize,
    }

    impl Catalog for ScopeRecorder {
        fn table(&self, schema: &str, name: &str) -> CatalogResult<TableRef> {
            Err(CatalogError::TableNotFound {
                schema: schema.to_owned(),
                name: name.to_owned(),
            })
        }

        fn set_auto_reclaim(&mut self, _enabled: bool) {}

        fn reclaim(&mut self) -> CatalogResult<()> {
            Ok(())
        }

        fn begin_evolve(&mut self, _consolidate: bool) -> CatalogResult<()> {
            if self.open {
                return Err(CatalogError::EvolutionAlreadyOpen);
            }
            self.open = true;
            Ok(())
        }

        fn assign(&mut self, _schema: &str, name: &str, _relation: Relation) -> CatalogResult<()> {
            if !self.open {
                return Err(CatalogError::NoOpenEvolution);
            }
            self.assigned.push(name.to_owned());
            Ok(())
        }

        fn commit_evolve(&mut self) -> CatalogResult<()> {
            if !self.open {
                return Err(CatalogError::NoOpenEvolution);
            }
            self.open = false;
            self.commits += 1;
            Ok(())
        }

        fn abort_evolve(&mut self) {
            self.open = false;
            self.aborts += 1;
        }
    }

    fn noop_relation() -> Relation {
        TableRef::new(".", "t.csv", vec!["data:key".to_owned()]).reify_sub(["data:key"])
    }

    #[test]
    fn test_commit_closes_scope_without_abort() {
        let mut cat = ScopeRecorder::default();
        let mut guard = cat.evolve(true).unwrap();
        guard.assign("output", "subc0.csv", noop_relation()).unwrap();
        guard.commit().unwrap();

        assert_eq!(cat.commits, 1);
        assert_eq!(cat.aborts, 0);
        assert_eq!(cat.assigned, vec!["subc0.csv"]);
    }

    #[test]
    fn test_dropped_guard_aborts_scope() {
        let mut cat = ScopeRecorder::default();
        {
            let mut guard = cat.evolve(true).unwrap();
            guard.assign("output", "subc0.csv", noop_relation()).unwrap();
            // No commit.
        }
        assert_eq!(cat.commits, 0);
        assert_eq!(cat.aborts, 1);
    }

    #[test]
    fn test_nested_evolve_rejected() {
        let mut cat = ScopeRecorder::default();
        cat.begin_evolve(false).unwrap();
        let err = cat.begin_evolve(false).unwrap_err();
        assert!(matches!(err, CatalogError::EvolutionAlreadyOpen));
    }

    #[test]
    fn test_assign_outside_scope_rejected() {
        let mut cat = ScopeRecorder::default();
        let err = cat
            .assign("output", "subc0.csv", noop_relation())
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoOpenEvolution));
    }
}
