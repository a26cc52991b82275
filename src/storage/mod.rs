//! Sinks for scan results.
//!
//! Every sink receives the same fixed column layout:
//!
//! ```text
//! date │ department │ he │ ar │ en │ es │ fr │ ru │ total │ department id
//! ```
//!
//! Rows arrive ranked by total, highest first. A spreadsheet uploader would
//! implement [`ResultSink`] the same way [`CsvSink`] does.

pub mod csv;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DepartmentResult, Language, ScanReport};

// Re-export for convenience
pub use csv::CsvSink;

/// How measurement dates are rendered, e.g. `October 19, 2026`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// Header label of the measurement date column.
pub const DATE_COLUMN: &str = "תאריך_מדידה";
/// Header label of the department name column.
pub const NAME_COLUMN: &str = "שם_המשרד";
/// Header label of the total column.
pub const TOTAL_COLUMN: &str = "סה_כ";
/// Header label of the department id column.
pub const ID_COLUMN: &str = "מזהה_משרד";

/// Header row in export order.
pub fn header_row() -> Vec<String> {
    let mut row = vec![DATE_COLUMN.to_string(), NAME_COLUMN.to_string()];
    row.extend(Language::ALL.iter().map(|lang| lang.label().to_string()));
    row.push(TOTAL_COLUMN.to_string());
    row.push(ID_COLUMN.to_string());
    row
}

/// One result as a row in export order.
pub fn record_row(result: &DepartmentResult) -> Vec<String> {
    let mut row = vec![
        result.measurement_date().format(DATE_FORMAT).to_string(),
        result.department().name.clone(),
    ];
    row.extend(result.counts().iter().map(|(_, count)| count.to_string()));
    row.push(result.total().to_string());
    row.push(result.department().id.clone());
    row
}

/// What a sink did with a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    /// Where the rows went (a path for files)
    pub location: String,
    /// Data rows written, header excluded
    pub rows_written: usize,
    /// False when rows were appended to existing data
    pub created: bool,
}

/// Destination for a finished scan. Failures here are fatal for the run.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn export(&self, report: &ScanReport) -> Result<ExportReceipt>;
}
