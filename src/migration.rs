// src/migration.rs - A single schema step from one version to the next

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rusqlite::Connection;

use crate::infra::errors::Result;

/// The transformation a migration performs.
///
/// Implemented for any `Fn(&Connection) -> Result<()>`, so plain functions and
/// closures can be registered directly. The connection handed in is the open
/// transaction for this step.
pub trait Step: Send + Sync {
    fn apply(&self, conn: &Connection) -> Result<()>;
}

impl<F> Step for F
where
    F: Fn(&Connection) -> Result<()> + Send + Sync,
{
    fn apply(&self, conn: &Connection) -> Result<()> {
        self(conn)
    }
}

/// A step that runs a fixed batch of SQL, e.g. from `include_str!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sql(pub &'static str);

impl Step for Sql {
    fn apply(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(self.0)?;
        Ok(())
    }
}

/// An immutable migration from `from_version` to `to_version`.
///
/// Nothing is validated here; `MigrationManager::register_migration` rejects
/// steps that do not move forward.
#[derive(Clone)]
pub struct Migration {
    pub from_version: u32,
    pub to_version: u32,
    name: Cow<'static, str>,
    step: Arc<dyn Step>,
}

impl Migration {
    pub fn new(from_version: u32, to_version: u32, step: impl Step + 'static) -> Self {
        Self::from_arc(from_version, to_version, Arc::new(step))
    }

    /// Build from a step that is already shared elsewhere.
    pub fn from_arc(from_version: u32, to_version: u32, step: Arc<dyn Step>) -> Self {
        Self {
            from_version,
            to_version,
            name: Cow::Owned(format!("v{from_version}_to_v{to_version}")),
            step,
        }
    }

    /// Shorthand for a migration whose step is a SQL batch.
    pub fn sql(from_version: u32, to_version: u32, sql: &'static str) -> Self {
        Self::new(from_version, to_version, Sql(sql))
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self) -> &Arc<dyn Step> {
        &self.step
    }

    /// Run the bare step, without wrappers or a transaction.
    pub fn apply(&self, conn: &Connection) -> Result<()> {
        self.step.apply(conn)
    }
}

impl PartialEq for Migration {
    fn eq(&self, other: &Self) -> bool {
        self.from_version == other.from_version
            && self.to_version == other.to_version
            && self.name == other.name
    }
}

impl Eq for Migration {}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Migration({}, {})", self.from_version, self.to_version)
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: v{} -> v{}",
            self.name, self.from_version, self.to_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_conn: &Connection) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_default_name() {
        let m = Migration::new(0, 1, noop);
        assert_eq!(m.name(), "v0_to_v1");
        assert_eq!(m.to_string(), "v0_to_v1: v0 -> v1");
    }

    #[test]
    fn test_with_name() {
        let m = Migration::new(2, 5, noop).with_name("add_index");
        assert_eq!(m.name(), "add_index");
        assert_eq!(format!("{m:?}"), "Migration(2, 5)");
    }

    #[test]
    fn test_equality_ignores_step() {
        let a = Migration::new(0, 1, noop);
        let b = Migration::sql(0, 1, "SELECT 1");
        assert_eq!(a, b);
        assert_ne!(a, Migration::new(0, 2, noop));
    }

    #[test]
    fn test_clone_shares_step() {
        let a = Migration::new(0, 1, noop);
        let b = a.clone();
        assert!(Arc::ptr_eq(a.step(), b.step()));
    }

    #[test]
    fn test_sql_step_executes_batch() {
        let conn = Connection::open_in_memory().unwrap();
        Migration::sql(0, 1, "CREATE TABLE a (x); CREATE TABLE b (y);")
            .apply(&conn)
            .unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_closure_step() {
        let conn = Connection::open_in_memory().unwrap();
        let m = Migration::new(0, 1, |conn: &Connection| -> Result<()> {
            conn.execute("CREATE TABLE foo (bar)", [])?;
            Ok(())
        });
        m.apply(&conn).unwrap();
        conn.execute("INSERT INTO foo (bar) VALUES (1)", []).unwrap();
    }
}
