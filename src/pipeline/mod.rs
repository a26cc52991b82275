//! Pipeline entry points for tracker operations.
//!
//! - `Scanner`: query every department in every language
//! - `ScanSummary`: totals, language shares and ranking of a finished scan
//! - `run_tracker`: scan, export and summarize in one go

pub mod run;
pub mod scan;
pub mod summary;

pub use run::{RunOptions, RunOutcome, run_tracker, run_with};
pub use scan::Scanner;
pub use summary::{LanguageShare, ScanSummary};
