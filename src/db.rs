// src/db.rs - SQLite accessors the migration engine depends on
//
// The schema version lives in the database header (`PRAGMA user_version`),
// so it is written inside whatever transaction is open on the connection.

use rusqlite::Connection;

use crate::infra::errors::{Error, ForeignKeyViolation, Result};

/// Largest version `user_version` can hold; SQLite stores it as a signed
/// 32-bit integer.
pub const MAX_VERSION: u32 = i32::MAX as u32;

/// Read the persisted schema version. A fresh database reports 0.
pub fn get_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Persist the schema version. Durable once the enclosing transaction commits.
pub fn set_version(conn: &Connection, version: u32) -> Result<()> {
    if version > MAX_VERSION {
        return Err(Error::VersionOutOfRange { version });
    }
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Whether foreign key enforcement is on.
pub fn foreign_keys(conn: &Connection) -> Result<bool> {
    let enabled: bool = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
    Ok(enabled)
}

/// Toggle foreign key enforcement. SQLite ignores this inside a transaction.
pub fn set_foreign_keys(conn: &Connection, enabled: bool) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", enabled)?;
    Ok(())
}

/// Run `PRAGMA foreign_key_check` and collect every reported row.
pub fn foreign_key_check(conn: &Connection) -> Result<Vec<ForeignKeyViolation>> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let rows = stmt.query_map([], |row| {
        Ok(ForeignKeyViolation {
            table: row.get(0)?,
            rowid: row.get(1)?,
            parent: row.get(2)?,
            fk_index: row.get(3)?,
        })
    })?;

    let mut violations = Vec::new();
    for row in rows {
        violations.push(row?);
    }
    Ok(violations)
}
