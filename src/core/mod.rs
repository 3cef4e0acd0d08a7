//! Core types for os-tips.
//!
//! This module contains the versioned tip/result schema, the read-only athlete
//! roster, and the scoring rules.

pub mod athletes;
pub mod schema;
pub mod scoring;

// Re-export key types for convenience
pub use athletes::{AthleteRecord, AthleteRoster};
pub use schema::{Medal, ResultEntry, SCHEMA_VERSION, TipEntry, TipKey, TipValue};
pub use scoring::{ScoreRow, Scoreboard, score_pick};
