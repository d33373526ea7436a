// src/infra/errors.rs - Error types for sqlite3m

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Registration errors (raised before anything touches the database)
    #[error("Invalid migration {from} -> {to}: {reason}")]
    Registration { from: u32, to: u32, reason: String },

    // Chain errors
    #[error("No migration registered from version {version} (target {target})")]
    MissingMigration { version: u32, target: u32 },

    #[error("Schema version {version} does not fit in PRAGMA user_version")]
    VersionOutOfRange { version: u32 },

    #[error(transparent)]
    ForeignKey(#[from] ForeignKeyError),

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// The version the chain got stuck at, for `MissingMigration`.
    pub fn stranded_version(&self) -> Option<u32> {
        match self {
            Error::MissingMigration { version, .. } => Some(*version),
            _ => None,
        }
    }
}

/// One row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
    pub fk_index: i64,
}

impl fmt::Display for ForeignKeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rowid {
            Some(rowid) => write!(
                f,
                "{} row {} -> {} (fk {})",
                self.table, rowid, self.parent, self.fk_index
            ),
            None => write!(f, "{} -> {} (fk {})", self.table, self.parent, self.fk_index),
        }
    }
}

/// Violations found after a migration step ran.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyError {
    pub violations: Vec<ForeignKeyViolation>,
}

impl ForeignKeyError {
    pub fn new(violations: Vec<ForeignKeyViolation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ForeignKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Foreign key check found errors: [")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{v}'")?;
        }
        write!(f, "]")
    }
}
