// src/models/mod.rs

//! Domain models for the tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod department;
mod identity;
mod report;

// Re-export all public types
pub use config::{
    ClientConfig, Config, DelayRange, LANG_PLACEHOLDER, OutputConfig, PacingConfig,
    expand_endpoint,
};
pub use department::{Department, Language, default_departments};
pub use identity::{IdentityProfile, default_identities};
pub use report::{DepartmentResult, DepartmentTally, LanguageCounts, QueryOutcome, ScanReport};
