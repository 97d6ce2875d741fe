#![forbid(unsafe_code)]

//! Core domain model and business logic for fitlog.
//!
//! This crate provides:
//! - Domain types (foods, meal logs, targets, daily log streams)
//! - Food catalog
//! - Nutrition ledger and macro target calculator
//! - Per-date aggregation of the log streams
//! - Persistence (`LogStore` with JSON file and in-memory adapters, CSV export)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod targets;
pub mod aggregate;
pub mod wellness;
pub mod document;
pub mod journal;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, Catalog};
pub use config::Config;
pub use ledger::{parse_quantity, NutritionService};
pub use targets::{compute_targets, CustomTargetEditor};
pub use aggregate::{build_combined_log, within_window};
pub use store::{open_store, JsonStore, LogStore, MemoryStore};
pub use export::export_combined_csv;
