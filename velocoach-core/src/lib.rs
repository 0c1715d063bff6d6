//! Core library for VeloCoach.
//!
//! This crate provides the domain models, database operations and schema
//! migrations for VeloCoach, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use velocoach_core::db::Database;
//!
//! let db = Database::open("data/velocoach.db")?;
//! let report = db.migrate()?;
//! println!("applied {} migrations", report.applied.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod models;

// Re-export commonly used types at crate root
pub use db::migrations::{MigrationError, MigrationReport, Migrator};
pub use db::Database;
