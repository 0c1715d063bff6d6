//! VeloCoach server: the HTTP API and the race-plan pipeline on top of
//! [`velocoach_core`].

pub mod api;
pub mod coach;
pub mod config;

pub use velocoach_core::{db, models};
