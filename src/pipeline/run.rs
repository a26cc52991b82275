// src/pipeline/run.rs

//! Full run: scan, export, summarize.

use std::path::PathBuf;

use chrono::{Local, Utc};

use crate::error::Result;
use crate::models::{Config, Department, ScanReport};
use crate::pipeline::{ScanSummary, Scanner};
use crate::services::{
    CountTransport, HttpTransport, IdentityPool, Jitter, Pacer, RetryingFetcher, Sleeper,
    TokioSleeper,
};
use crate::storage::{CsvSink, ExportReceipt, ResultSink};
use crate::utils::console;

/// Per-invocation overrides.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output file; a timestamped name in `output.dir` when absent
    pub output: Option<PathBuf>,
    /// Only scan the first N departments
    pub sample_size: Option<usize>,
    /// Skip the summary block
    pub quiet: bool,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: ScanReport,
    pub summary: ScanSummary,
    /// `None` when there was nothing to export
    pub receipt: Option<ExportReceipt>,
}

/// Run against the live portal with the given configuration.
pub async fn run_tracker(config: &Config, options: &RunOptions) -> Result<RunOutcome> {
    config.validate()?;

    let transport = HttpTransport::new(&config.client)?;
    let pool = IdentityPool::new(config.identities.clone())?;
    let pacer = Pacer::new(
        TokioSleeper,
        Jitter::from_seed(config.seed),
        config.pacing.clone(),
    );
    log::info!("{} identities in rotation", pool.len());

    let fetcher = RetryingFetcher::new(transport, pool, pacer, config.client.clone())?;
    let mut scanner = Scanner::new(fetcher);

    let path = options
        .output
        .clone()
        .unwrap_or_else(|| config.output.default_path(Local::now()));
    let sink = if config.output.append {
        CsvSink::appending(path)
    } else {
        CsvSink::new(path)
    };

    run_with(&mut scanner, &sink, &config.departments, options).await
}

/// Scan `departments` with `scanner` and hand the report to `sink`.
pub async fn run_with<T, S>(
    scanner: &mut Scanner<T, S>,
    sink: &dyn ResultSink,
    departments: &[Department],
    options: &RunOptions,
) -> Result<RunOutcome>
where
    T: CountTransport,
    S: Sleeper,
{
    let start_time = Utc::now();
    console::header("gov.il service page tracker");
    log::info!("Started {}", Local::now().format("%d/%m/%Y %H:%M"));
    log::info!("{} departments listed", departments.len());

    let report = scanner.scan(departments, options.sample_size).await;
    let summary = ScanSummary::from_report(&report);

    let receipt = if report.is_empty() {
        log::warn!("No results to export");
        None
    } else {
        let receipt = sink.export(&report).await?;
        log::info!(
            "Saved {} rows to {}{}",
            receipt.rows_written,
            receipt.location,
            if receipt.created { "" } else { " (appended)" }
        );
        Some(receipt)
    };

    if !options.quiet {
        summary.log();
    }

    let elapsed = Utc::now() - start_time;
    log::info!("Done in {}s", elapsed.num_seconds());

    Ok(RunOutcome {
        report,
        summary,
        receipt,
    })
}
