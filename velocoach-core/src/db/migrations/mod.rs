//! Named schema migrations and the runner that applies them.
//!
//! Every migration is listed explicitly in [`builtin`], in the order it must
//! run. Names carry a zero-padded numeric prefix and the runner refuses a list
//! that is not strictly ascending, so the list is the single source of truth
//! for ordering.
//!
//! Each pending migration runs inside its own `IMMEDIATE` transaction together
//! with the insert into `schema_migrations`. A failure rolls back both and
//! stops the run; later migrations are never attempted.

mod m001_initial_schema;
mod m002_add_race_type;
mod m003_training_plans;
mod m004_user_preferences;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Table holding one row per applied migration.
pub const RECORDS_TABLE: &str = "schema_migrations";

const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// A single unit of schema change.
///
/// `apply` must be idempotent at the schema level: running it against a
/// database that already has its effect must succeed without changing
/// anything.
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn revert(&self, conn: &Connection) -> rusqlite::Result<()>;
}

/// A migration expressed as two SQL batches.
#[derive(Debug, Clone, Copy)]
pub struct SqlMigration {
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

impl Migration for SqlMigration {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(self.up)
    }

    fn revert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(self.down)
    }
}

/// The migrations shipped with this build, oldest first.
pub fn builtin() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(m001_initial_schema::MIGRATION),
        Box::new(m002_add_race_type::AddRaceType),
        Box::new(m003_training_plans::MIGRATION),
        Box::new(m004_user_preferences::MIGRATION),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Applied state of one known migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migrations applied by this run, in order.
    pub applied: Vec<String>,
    /// Pending migrations that another runner recorded first.
    pub skipped: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration list is out of order: {previous} must sort before {next}")]
    OutOfOrder { previous: String, next: String },

    #[error("duplicate migration name: {0}")]
    Duplicate(String),

    #[error("migration records store unavailable: {0}")]
    RecordsStore(#[source] rusqlite::Error),

    #[error("migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("unknown migration: {0}")]
    Unknown(String),

    #[error("migration {0} has not been applied")]
    NotApplied(String),

    #[error("only the latest applied migration ({latest}) can be reverted, not {requested}")]
    NotLatest { requested: String, latest: String },

    #[error("revert of {name} failed: {source}")]
    RevertFailed {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Applies an ordered list of migrations against a connection.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(builtin())
    }
}

impl Migrator {
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { migrations }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.migrations.iter().map(|m| m.name())
    }

    /// Checks that names are unique and strictly ascending.
    pub fn validate(&self) -> Result<(), MigrationError> {
        let mut seen = HashSet::new();
        let mut previous: Option<&str> = None;
        for name in self.names() {
            if !seen.insert(name) {
                return Err(MigrationError::Duplicate(name.to_string()));
            }
            if let Some(prev) = previous {
                if prev >= name {
                    return Err(MigrationError::OutOfOrder {
                        previous: prev.to_string(),
                        next: name.to_string(),
                    });
                }
            }
            previous = Some(name);
        }
        Ok(())
    }

    /// Applies every pending migration in order, halting at the first failure.
    pub fn run(&self, conn: &mut Connection) -> Result<MigrationReport, MigrationError> {
        self.validate()?;
        ensure_records_store(conn)?;

        let already: HashSet<String> = applied(conn)?.into_iter().map(|r| r.name).collect();
        let mut report = MigrationReport::default();

        for migration in &self.migrations {
            let name = migration.name();
            if already.contains(name) {
                continue;
            }

            tracing::info!(migration = name, "applying migration");
            match apply_one(conn, migration.as_ref()) {
                Ok(true) => report.applied.push(name.to_string()),
                Ok(false) => {
                    tracing::warn!(migration = name, "migration recorded by another runner, skipping");
                    report.skipped.push(name.to_string());
                }
                Err(source) => {
                    tracing::error!(migration = name, error = %source, "migration failed, halting");
                    return Err(MigrationError::Failed {
                        name: name.to_string(),
                        source,
                    });
                }
            }
        }

        if report.is_noop() {
            tracing::debug!("schema is up to date");
        }
        Ok(report)
    }

    /// Names of known migrations that have no record yet.
    pub fn pending(&self, conn: &Connection) -> Result<Vec<String>, MigrationError> {
        Ok(self
            .status(conn)?
            .into_iter()
            .filter(|s| s.applied_at.is_none())
            .map(|s| s.name)
            .collect())
    }

    pub fn status(&self, conn: &Connection) -> Result<Vec<MigrationState>, MigrationError> {
        ensure_records_store(conn)?;
        let records = applied(conn)?;

        let known: HashSet<&str> = self.names().collect();
        for record in records.iter().filter(|r| !known.contains(r.name.as_str())) {
            tracing::warn!(migration = %record.name, "applied migration is unknown to this build");
        }

        Ok(self
            .names()
            .map(|name| MigrationState {
                name: name.to_string(),
                applied_at: records
                    .iter()
                    .find(|r| r.name == name)
                    .map(|r| r.applied_at),
            })
            .collect())
    }

    /// Reverts the most recently applied migration, which must be `name`.
    ///
    /// The revert operation and the removal of its record share one
    /// transaction. This is an operator action; [`Migrator::run`] never
    /// calls it.
    pub fn revert(&self, conn: &mut Connection, name: &str) -> Result<(), MigrationError> {
        let migration = self
            .migrations
            .iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| MigrationError::Unknown(name.to_string()))?;
        ensure_records_store(conn)?;

        let revert_failed = |source| MigrationError::RevertFailed {
            name: name.to_string(),
            source,
        };

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(revert_failed)?;

        let latest: Option<String> = tx
            .query_row(
                "SELECT name FROM schema_migrations ORDER BY name DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(revert_failed)?;

        match latest {
            Some(latest) if latest == name => {}
            Some(latest) if is_recorded(&tx, name).map_err(revert_failed)? => {
                return Err(MigrationError::NotLatest {
                    requested: name.to_string(),
                    latest,
                });
            }
            _ => return Err(MigrationError::NotApplied(name.to_string())),
        }

        migration.revert(&tx).map_err(revert_failed)?;
        tx.execute("DELETE FROM schema_migrations WHERE name = ?1", [name])
            .map_err(revert_failed)?;
        tx.commit().map_err(revert_failed)?;

        tracing::info!(migration = name, "migration reverted");
        Ok(())
    }
}

pub fn ensure_records_store(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(CREATE_RECORDS_TABLE)
        .map_err(MigrationError::RecordsStore)
}

/// Every record in the store, ordered by name.
pub fn applied(conn: &Connection) -> Result<Vec<MigrationRecord>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT name, applied_at FROM schema_migrations ORDER BY name")
        .map_err(MigrationError::RecordsStore)?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let applied_at: String = row.get(1)?;
            Ok((name, applied_at))
        })
        .map_err(MigrationError::RecordsStore)?;

    let mut records = Vec::new();
    for row in rows {
        let (name, applied_at) = row.map_err(MigrationError::RecordsStore)?;
        let applied_at = DateTime::parse_from_rfc3339(&applied_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                MigrationError::RecordsStore(rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                ))
            })?;
        records.push(MigrationRecord { name, applied_at });
    }
    Ok(records)
}

fn is_recorded(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM schema_migrations WHERE name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

/// Returns `Ok(false)` when the migration was recorded by someone else
/// between listing and taking the write lock.
fn apply_one(conn: &mut Connection, migration: &dyn Migration) -> rusqlite::Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if is_recorded(&tx, migration.name())? {
        return Ok(false);
    }

    migration.apply(&tx)?;
    tx.execute(
        "INSERT INTO schema_migrations(name, applied_at) VALUES (?1, ?2)",
        params![migration.name(), Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(true)
}
