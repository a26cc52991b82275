// src/pipeline/summary.rs

//! End-of-run statistics.

use crate::models::{Language, ScanReport};
use crate::utils::{console, percentage};

/// Pages found in one language across all departments.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub language: Language,
    pub total: u64,
    /// Share of the grand total, 0–100
    pub percent: f64,
}

/// Aggregate view of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub departments_checked: usize,
    pub departments_with_services: usize,
    pub grand_total: u64,
    /// In canonical language order
    pub languages: Vec<LanguageShare>,
    /// Departments with a nonzero total, highest first
    pub ranking: Vec<(String, u64)>,
    pub exhausted_queries: usize,
}

impl ScanSummary {
    pub fn from_report(report: &ScanReport) -> Self {
        let ranked: Vec<_> = report
            .ranked()
            .into_iter()
            .filter(|r| r.total() > 0)
            .collect();
        let grand_total: u64 = ranked.iter().map(|r| r.total()).sum();

        let languages = Language::ALL
            .into_iter()
            .map(|language| {
                let total = ranked.iter().map(|r| r.count(language)).sum();
                LanguageShare {
                    language,
                    total,
                    percent: percentage(total, grand_total),
                }
            })
            .collect();

        Self {
            departments_checked: report.len(),
            departments_with_services: ranked.len(),
            grand_total,
            languages,
            ranking: ranked
                .iter()
                .map(|r| (r.department().name.clone(), r.total()))
                .collect(),
            exhausted_queries: report.exhausted_queries(),
        }
    }

    pub fn share(&self, language: Language) -> &LanguageShare {
        &self.languages[language.index()]
    }

    /// Write the summary block to the log.
    pub fn log(&self) {
        console::header("Summary");
        console::summary(
            "Scan",
            &[
                ("Departments checked", self.departments_checked.to_string()),
                ("With services", self.departments_with_services.to_string()),
                ("Total service pages", self.grand_total.to_string()),
                ("Unresolved queries", self.exhausted_queries.to_string()),
            ],
        );

        if self.grand_total == 0 {
            return;
        }

        let by_language: Vec<_> = self
            .languages
            .iter()
            .map(|share| {
                (
                    share.language.english_name(),
                    format!("{} ({:.1}%)", share.total, share.percent),
                )
            })
            .collect();
        console::summary("By language", &by_language);

        console::summary("Top departments", &[]);
        for (i, (name, total)) in self.ranking.iter().enumerate() {
            console::sub_item(&format!("{:2}. {}: {} pages", i + 1, name, total));
        }
    }
}
