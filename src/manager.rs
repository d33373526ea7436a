// src/manager.rs - Migration registry and execution engine
//
// Migrations are keyed by the version they start from, so the chain from any
// version is walked one lookup at a time. The registry is append-only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db;
use crate::infra::config::Config;
use crate::infra::errors::{Error, Result};
use crate::migration::{Migration, Step};
use crate::wrapper::{self, CheckForeignKeys, Wrapper};

pub struct MigrationManager {
    migrations: BTreeMap<u32, Migration>,
    final_version: u32,
    wrappers: Vec<Arc<dyn Wrapper>>,
    foreign_keys: Option<bool>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationManager {
    /// An empty manager: no migrations, no wrappers, final version 0.
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
            final_version: 0,
            wrappers: Vec::new(),
            foreign_keys: None,
        }
    }

    /// An empty manager set up from the `[migrate]` config section.
    pub fn with_config(config: &Config) -> Self {
        let mut manager = Self::new();
        manager.foreign_keys = config.migrate.foreign_keys;
        if config.migrate.check_foreign_keys {
            manager.register_wrapper(CheckForeignKeys);
        }
        manager
    }

    pub fn final_version(&self) -> u32 {
        self.final_version
    }

    pub fn migrations(&self) -> &BTreeMap<u32, Migration> {
        &self.migrations
    }

    pub fn get(&self, from_version: u32) -> Option<&Migration> {
        self.migrations.get(&from_version)
    }

    // -- Registration --

    /// Add a migration to the registry.
    ///
    /// Rejects migrations that do not move forward, migrations whose
    /// `from_version` is already taken, and destinations `user_version` cannot
    /// hold. On failure the registry is unchanged.
    pub fn register_migration(&mut self, migration: Migration) -> Result<()> {
        let (from, to) = (migration.from_version, migration.to_version);

        if to > db::MAX_VERSION {
            return Err(Error::Registration {
                from,
                to,
                reason: format!("destination version exceeds {}", db::MAX_VERSION),
            });
        }
        if to <= from {
            return Err(Error::Registration {
                from,
                to,
                reason: "destination version must be greater than origin".into(),
            });
        }
        if let Some(existing) = self.migrations.get(&from) {
            return Err(Error::Registration {
                from,
                to,
                reason: format!(
                    "version {from} already migrates to {}",
                    existing.to_version
                ),
            });
        }

        debug!(name = migration.name(), from, to, "registered migration");
        self.migrations.insert(from, migration);
        self.final_version = self.final_version.max(to);
        Ok(())
    }

    /// Register `step` as the migration `from -> to`.
    ///
    /// Returns a shared handle to the step so it can still be called on its
    /// own, e.g. from tests.
    pub fn migration<F>(&mut self, from: u32, to: u32, step: F) -> Result<Arc<F>>
    where
        F: Step + 'static,
    {
        let step = Arc::new(step);
        self.register_migration(Migration::from_arc(from, to, step.clone()))?;
        Ok(step)
    }

    /// Append a wrapper. The first registered wrapper runs outermost.
    pub fn register_wrapper(&mut self, wrapper: impl Wrapper + 'static) {
        self.wrappers.push(Arc::new(wrapper));
    }

    // -- Resolution --

    /// The chain of migrations from `from` up to the final version.
    pub fn resolve(&self, from: u32) -> Result<Vec<&Migration>> {
        let mut chain = Vec::new();
        let mut current = from;

        while current != self.final_version {
            let migration = self.next_from(current)?;
            chain.push(migration);
            current = migration.to_version;
        }
        Ok(chain)
    }

    /// Migrations `migrate` would run on `conn`, without running them.
    pub fn plan(&self, conn: &Connection) -> Result<Vec<&Migration>> {
        self.resolve(db::get_version(conn)?)
    }

    /// Whether `conn` is behind (or ahead of) the final version.
    pub fn pending(&self, conn: &Connection) -> Result<bool> {
        Ok(db::get_version(conn)? != self.final_version)
    }

    fn next_from(&self, current: u32) -> Result<&Migration> {
        self.migrations
            .get(&current)
            .ok_or(Error::MissingMigration {
                version: current,
                target: self.final_version,
            })
    }

    // -- Execution --

    /// Bring `conn` up to the final version.
    ///
    /// Each step commits in its own transaction together with the new
    /// `user_version`, so a failure leaves the database at the last version
    /// that committed. A database ahead of the final version is never
    /// downgraded: that fails with `MissingMigration` at its current version.
    pub fn migrate(&self, conn: &Connection) -> Result<()> {
        let current = db::get_version(conn)?;

        if current == self.final_version {
            debug!(version = current, "schema up to date");
            return Ok(());
        }
        if current > self.final_version {
            warn!(
                version = current,
                final_version = self.final_version,
                "database is newer than registered migrations"
            );
            return Err(Error::MissingMigration {
                version: current,
                target: self.final_version,
            });
        }

        // The caller's foreign key setting is restored on every exit path.
        let Some(enabled) = self.foreign_keys else {
            return self.run_chain(conn, current);
        };
        let previous = db::foreign_keys(conn)?;
        db::set_foreign_keys(conn, enabled)?;

        let result = self.run_chain(conn, current);
        let restored = db::set_foreign_keys(conn, previous);
        result.and(restored)
    }

    fn run_chain(&self, conn: &Connection, mut current: u32) -> Result<()> {
        info!(
            from = current,
            to = self.final_version,
            "starting migrations"
        );

        while current != self.final_version {
            let migration = self.next_from(current)?;

            if let Err(e) = self.apply_one(conn, migration) {
                warn!(
                    name = migration.name(),
                    from = migration.from_version,
                    to = migration.to_version,
                    error = %e,
                    "migration failed, rolled back"
                );
                return Err(e);
            }
            current = migration.to_version;
        }

        info!(version = current, "completed migrations");
        Ok(())
    }

    fn apply_one(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        info!(
            name = migration.name(),
            from = migration.from_version,
            to = migration.to_version,
            "applying migration"
        );

        let step = wrapper::compose(&self.wrappers, migration.step().clone());

        let tx = conn.unchecked_transaction()?;
        step.apply(&tx)?;
        db::set_version(&tx, migration.to_version)?;
        tx.commit()?;
        Ok(())
    }
}

impl fmt::Debug for MigrationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<MigrationManager with migrations={:?}, final_ver={}>",
            self.migrations, self.final_version
        )
    }
}

impl fmt::Display for MigrationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
