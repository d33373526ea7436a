// src/wrapper.rs - Decorators applied around every migration step
//
// A wrapper receives the step for one migration and returns a new step that
// does extra work before and/or after delegating. The manager composes them
// in registration order, so the first registered wrapper runs outermost.
// Wrapped steps execute inside the step's transaction.

use std::sync::Arc;

use rusqlite::Connection;
use tracing::debug;

use crate::db;
use crate::infra::errors::{ForeignKeyError, Result};
use crate::migration::Step;

pub trait Wrapper: Send + Sync {
    fn wrap(&self, inner: Arc<dyn Step>) -> Arc<dyn Step>;
}

impl<F> Wrapper for F
where
    F: Fn(Arc<dyn Step>) -> Arc<dyn Step> + Send + Sync,
{
    fn wrap(&self, inner: Arc<dyn Step>) -> Arc<dyn Step> {
        self(inner)
    }
}

/// Compose `wrappers` around `step`, first wrapper outermost.
pub fn compose(wrappers: &[Arc<dyn Wrapper>], step: Arc<dyn Step>) -> Arc<dyn Step> {
    wrappers
        .iter()
        .rev()
        .fold(step, |inner, wrapper| wrapper.wrap(inner))
}

// ---------------------------------------------------------------------------
// CheckForeignKeys
// ---------------------------------------------------------------------------

/// Runs `PRAGMA foreign_key_check` after each step and fails the step if any
/// rows come back, so the offending step is rolled back with its transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckForeignKeys;

impl Wrapper for CheckForeignKeys {
    fn wrap(&self, inner: Arc<dyn Step>) -> Arc<dyn Step> {
        Arc::new(ForeignKeyChecked { inner })
    }
}

struct ForeignKeyChecked {
    inner: Arc<dyn Step>,
}

impl Step for ForeignKeyChecked {
    fn apply(&self, conn: &Connection) -> Result<()> {
        self.inner.apply(conn)?;

        let violations = db::foreign_key_check(conn)?;
        if !violations.is_empty() {
            debug!(count = violations.len(), "foreign key check failed");
            return Err(ForeignKeyError::new(violations).into());
        }
        Ok(())
    }
}
