// src/lib.rs - Library root for sqlite3m
//
// Schema migrations for SQLite. The schema version lives in
// `PRAGMA user_version`; a `MigrationManager` walks registered steps from the
// current version to its final version, one transaction per step.

pub mod db;
pub mod infra;
pub mod manager;
pub mod migration;
pub mod wrapper;

pub use infra::config::Config;
pub use infra::errors::{Error, ForeignKeyError, ForeignKeyViolation, Result};
pub use manager::MigrationManager;
pub use migration::{Migration, Sql, Step};
pub use wrapper::{CheckForeignKeys, Wrapper};
