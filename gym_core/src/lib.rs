#![forbid(unsafe_code)]

//! Core domain model and business logic for the Micro-Gym sprint tracker.
//!
//! This crate provides:
//! - Domain types (slots, counters, days, badges)
//! - Schedule generation with linear progression
//! - Progress store and derived statistics
//! - Gamification engine (XP, levels, badges, quests, stickers)
//! - Persistence (document store, JSON/CSV export)
//! - Session controller tying it together

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod document;
pub mod schedule;
pub mod progress;
pub mod stats;
pub mod gamify;
pub mod store;
pub mod csv_export;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, RulesConfig};
pub use document::{merge_config, parse_date, Document, SprintConfig, SprintConfigPatch};
pub use schedule::build_days;
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use session::{DayView, Outcome, Session, Snapshot};
