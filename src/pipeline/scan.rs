// src/pipeline/scan.rs

//! Sequential department × language scan.

use chrono::{Local, NaiveDate};

use crate::models::{Department, DepartmentResult, DepartmentTally, Language, ScanReport};
use crate::services::{CountTransport, Pause, RetryingFetcher, Sleeper};
use crate::utils::console;

/// Drives the fetcher over every department and language, one request at a time.
pub struct Scanner<T, S> {
    fetcher: RetryingFetcher<T, S>,
    measurement_date: Option<NaiveDate>,
}

impl<T: CountTransport, S: Sleeper> Scanner<T, S> {
    pub fn new(fetcher: RetryingFetcher<T, S>) -> Self {
        Self {
            fetcher,
            measurement_date: None,
        }
    }

    /// Stamp every result with `date` instead of today's date.
    pub fn with_measurement_date(mut self, date: NaiveDate) -> Self {
        self.measurement_date = Some(date);
        self
    }

    /// Scan `departments`, or only the first `sample_size` of them.
    ///
    /// Results come back in input order; ranking is left to the sinks.
    pub async fn scan(
        &mut self,
        departments: &[Department],
        sample_size: Option<usize>,
    ) -> ScanReport {
        let selected = match sample_size {
            Some(k) => &departments[..k.min(departments.len())],
            None => departments,
        };

        match sample_size {
            Some(_) => log::info!("Sampling the first {} departments", selected.len()),
            None => log::info!("Scanning all {} departments", selected.len()),
        }
        console::separator();

        let mut report = ScanReport::default();
        for (i, department) in selected.iter().enumerate() {
            log::info!("[{:2}/{}] {}", i + 1, selected.len(), department.name);
            log::debug!("  id: {}", department.id);

            let result = self.scan_department(department).await;
            log_department(&result);
            report.push(result);

            if i + 1 < selected.len() {
                let waited = self
                    .fetcher
                    .pacer_mut()
                    .pause(Pause::BetweenDepartments)
                    .await;
                log::debug!("waited {:.1}s before next department", waited.as_secs_f64());
            }
        }
        report
    }

    /// Query all languages of one department in canonical order.
    pub async fn scan_department(&mut self, department: &Department) -> DepartmentResult {
        let date = self
            .measurement_date
            .unwrap_or_else(|| Local::now().date_naive());
        let mut tally = DepartmentTally::new(date, department.clone());

        for language in Language::ALL {
            log::debug!("  {} ({})...", language.english_name(), language);
            let outcome = self.fetcher.fetch(&department.id, language).await;
            tally.record(language, outcome);
        }
        tally.finish()
    }
}

fn log_department(result: &DepartmentResult) {
    if result.total() == 0 {
        log::info!("  no services found");
    } else {
        let breakdown: Vec<_> = result
            .counts()
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(lang, count)| format!("{}: {}", lang.english_name(), count))
            .collect();
        log::info!("  total: {} pages", result.total());
        log::info!("  breakdown: {}", breakdown.join(", "));
    }
    if !result.exhausted().is_empty() {
        let langs: Vec<_> = result.exhausted().iter().map(|l| l.code()).collect();
        log::warn!("  unresolved (reported as 0): {}", langs.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientConfig, PacingConfig, default_departments, default_identities};
    use crate::services::testing::{RecordingSleeper, ScriptedTransport, ok, status};
    use crate::services::{IdentityPool, Jitter, Pacer};

    fn scanner(
        transport: ScriptedTransport,
        sleeper: RecordingSleeper,
    ) -> Scanner<ScriptedTransport, RecordingSleeper> {
        let fetcher = RetryingFetcher::new(
            transport,
            IdentityPool::new(default_identities()).unwrap(),
            Pacer::new(sleeper, Jitter::seeded(21), PacingConfig::default()),
            ClientConfig::default(),
        )
        .unwrap();
        Scanner::new(fetcher).with_measurement_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn lang_of(url: &str) -> &str {
        url.split('/').nth(3).unwrap()
    }

    #[tokio::test]
    async fn test_sample_queries_prefix_in_canonical_order() {
        let transport = ScriptedTransport::responding(|_| Ok(ok(1)));
        let sleeper = RecordingSleeper::default();
        let mut scanner = scanner(transport.clone(), sleeper.clone());
        let departments = default_departments();

        let report = scanner.scan(&departments, Some(2)).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.results()[0].department(), &departments[0]);
        assert_eq!(report.results()[1].department(), &departments[1]);
        assert!(report.results().iter().all(|r| r.total() == 6));

        let requests = transport.requests();
        assert_eq!(requests.len(), 12);
        for (chunk, dept) in requests.chunks(6).zip(&departments) {
            let langs: Vec<_> = chunk.iter().map(|r| lang_of(&r.url)).collect();
            assert_eq!(langs, ["he", "ar", "en", "es", "fr", "ru"]);
            assert!(chunk.iter().all(|r| r.param("OfficeTaxonomy") == Some(dept.id.as_str())));
        }

        // one gap between the two departments, none after the last
        assert_eq!(sleeper.pauses_of(Pause::BetweenDepartments).len(), 1);
    }

    #[tokio::test]
    async fn test_calls_bounded_under_total_failure() {
        let transport = ScriptedTransport::responding(|_| Ok(status(503, "")));
        let mut scanner = scanner(transport.clone(), RecordingSleeper::default());

        let report = scanner.scan(&default_departments(), Some(3)).await;

        assert_eq!(transport.calls(), 3 * 6 * 3);
        assert!(report.results().iter().all(|r| r.total() == 0));
        assert_eq!(report.exhausted_queries(), 18);
    }

    #[tokio::test]
    async fn test_counts_routed_to_matching_language() {
        let departments = vec![
            Department::new("dept-a", "A"),
            Department::new("dept-b", "B"),
        ];
        let transport = ScriptedTransport::responding(|req| {
            let count = match (req.param("OfficeTaxonomy"), lang_of(&req.url)) {
                (Some("dept-a"), "he") => 10,
                (Some("dept-b"), "en") => 5,
                (Some("dept-b"), "ar") => 3,
                _ => 0,
            };
            Ok(ok(count))
        });
        let mut scanner = scanner(transport, RecordingSleeper::default());

        let report = scanner.scan(&departments, None).await;

        let a = &report.results()[0];
        let b = &report.results()[1];
        assert_eq!(a.count(Language::He), 10);
        assert_eq!(a.total(), 10);
        assert_eq!(b.count(Language::En), 5);
        assert_eq!(b.count(Language::Ar), 3);
        assert_eq!(b.total(), 8);
        assert_eq!(report.exhausted_queries(), 0);
    }

    #[tokio::test]
    async fn test_sample_larger_than_list_scans_everything() {
        let transport = ScriptedTransport::responding(|_| Ok(ok(0)));
        let mut scanner = scanner(transport, RecordingSleeper::default());

        let report = scanner.scan(&default_departments(), Some(50)).await;
        assert_eq!(report.len(), 7);
    }
}
