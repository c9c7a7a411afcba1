#![forbid(unsafe_code)]

//! Core domain model and business logic for the liftxp system.
//!
//! This crate provides:
//! - Domain types (workout logs, avatars, XP gains)
//! - XP award rules and the level curve
//! - Reconciliation engine for log create/edit/delete
//! - Persistence (database file, XP ledger, CSV export)
//! - Consistency checks

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod rules;
pub mod level;
pub mod store;
pub mod engine;
pub mod ledger;
pub mod consistency;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, LoggingConfig, XpRules};
pub use rules::{award, XpAward};
pub use level::{level_for_xp, LevelChange};
pub use store::{AvatarStore, Database, LogFilter, WeeklyCounter, WorkoutLogStore};
pub use engine::{delete_workout, edit_workout, log_workout, select_avatar, Deletion, Outcome};
pub use ledger::{EventSink, JsonlLedger, XpEvent};
pub use consistency::check_avatar;
pub use export::export_logs_csv;
