// src/models/report.rs

//! Query outcomes and the per-department records built from them.

use chrono::NaiveDate;

use crate::models::{Department, Language};

/// Result of one (department, language) query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Reported page count; 0 when nothing was found or every attempt failed
    pub count: u64,

    /// Remote calls consumed
    pub attempts: u32,

    /// True when the attempt budget ran out without a usable answer
    pub exhausted: bool,
}

impl QueryOutcome {
    pub fn success(count: u64, attempts: u32) -> Self {
        Self {
            count,
            attempts,
            exhausted: false,
        }
    }

    pub fn exhausted(attempts: u32) -> Self {
        Self {
            count: 0,
            attempts,
            exhausted: true,
        }
    }
}

/// Page counts keyed by language, stored in canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageCounts([u64; 6]);

impl LanguageCounts {
    pub fn get(&self, language: Language) -> u64 {
        self.0[language.index()]
    }

    pub fn set(&mut self, language: Language, count: u64) {
        self.0[language.index()] = count;
    }

    /// Iterate `(language, count)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Language, u64)> + '_ {
        Language::ALL.into_iter().map(|lang| (lang, self.get(lang)))
    }

    pub fn sum(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl<const N: usize> From<[(Language, u64); N]> for LanguageCounts {
    fn from(pairs: [(Language, u64); N]) -> Self {
        let mut counts = Self::default();
        for (lang, count) in pairs {
            counts.set(lang, count);
        }
        counts
    }
}

/// Mutable accumulator used while a department's languages are queried.
#[derive(Debug)]
pub struct DepartmentTally {
    measurement_date: NaiveDate,
    department: Department,
    counts: LanguageCounts,
    exhausted: Vec<Language>,
}

impl DepartmentTally {
    pub fn new(measurement_date: NaiveDate, department: Department) -> Self {
        Self {
            measurement_date,
            department,
            counts: LanguageCounts::default(),
            exhausted: Vec::new(),
        }
    }

    /// Fold one query outcome into the tally.
    pub fn record(&mut self, language: Language, outcome: QueryOutcome) {
        self.counts.set(language, outcome.count);
        if outcome.exhausted {
            self.exhausted.push(language);
        }
    }

    /// Freeze the tally into an immutable result.
    pub fn finish(self) -> DepartmentResult {
        let mut result = DepartmentResult::new(self.measurement_date, self.department, self.counts);
        result.exhausted = self.exhausted;
        result
    }
}

/// Frozen per-department record. `total` always equals the sum of `counts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentResult {
    measurement_date: NaiveDate,
    department: Department,
    counts: LanguageCounts,
    total: u64,
    exhausted: Vec<Language>,
}

impl DepartmentResult {
    pub fn new(
        measurement_date: NaiveDate,
        department: Department,
        counts: LanguageCounts,
    ) -> Self {
        Self {
            measurement_date,
            department,
            total: counts.sum(),
            counts,
            exhausted: Vec::new(),
        }
    }

    pub fn measurement_date(&self) -> NaiveDate {
        self.measurement_date
    }

    pub fn department(&self) -> &Department {
        &self.department
    }

    pub fn counts(&self) -> &LanguageCounts {
        &self.counts
    }

    pub fn count(&self, language: Language) -> u64 {
        self.counts.get(language)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Languages whose query gave up; their counts read as 0.
    pub fn exhausted(&self) -> &[Language] {
        &self.exhausted
    }
}

/// All department results of one run, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    results: Vec<DepartmentResult>,
}

impl ScanReport {
    pub fn new(results: Vec<DepartmentResult>) -> Self {
        Self { results }
    }

    pub fn push(&mut self, result: DepartmentResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[DepartmentResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results by total, highest first. Ties keep scan order.
    pub fn ranked(&self) -> Vec<&DepartmentResult> {
        let mut ranked: Vec<_> = self.results.iter().collect();
        ranked.sort_by(|a, b| b.total.cmp(&a.total));
        ranked
    }

    /// Number of queries that ended exhausted across the whole run.
    pub fn exhausted_queries(&self) -> usize {
        self.results.iter().map(|r| r.exhausted.len()).sum()
    }
}
