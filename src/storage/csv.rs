//! CSV file sink.
//!
//! Fresh files get a UTF-8 byte order mark and a header row so spreadsheet
//! tools pick the right encoding. In append mode rows are added after the
//! existing content of a non-empty file, without a second header.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ScanReport;
use crate::storage::{ExportReceipt, ResultSink, header_row, record_row};

/// UTF-8 signature written at the start of fresh files.
pub const BOM: &str = "\u{feff}";

/// Delimited-file sink.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    append: bool,
}

impl CsvSink {
    /// Sink that replaces `path` on every export.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }

    /// Sink that appends to `path` when it already holds data.
    pub fn appending(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Whether the target already holds data to append to.
    async fn has_data(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn replace(&self, bytes: &[u8]) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn append_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    async fn export(&self, report: &ScanReport) -> Result<ExportReceipt> {
        let location = self.path.display().to_string();
        let created = !(self.append && self.has_data().await?);

        let text = render(report, created);
        let written = async {
            self.ensure_dir().await?;
            if created {
                self.replace(text.as_bytes()).await
            } else {
                self.append_bytes(text.as_bytes()).await
            }
        }
        .await;
        written.map_err(|e| AppError::export(&location, e))?;

        log::debug!(
            "{} {} rows to {}",
            if created { "wrote" } else { "appended" },
            report.len(),
            location
        );

        Ok(ExportReceipt {
            location,
            rows_written: report.len(),
            created,
        })
    }
}

/// Render a report as CSV text, ranked by total.
///
/// With `fresh` the text starts with the BOM and the header row.
pub fn render(report: &ScanReport, fresh: bool) -> String {
    let mut out = String::new();
    if fresh {
        out.push_str(BOM);
        push_row(&mut out, &header_row());
    }
    for result in report.ranked() {
        push_row(&mut out, &record_row(result));
    }
    out
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}
