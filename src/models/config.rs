//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Department, IdentityProfile, Language};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint and retry settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Politeness delays and backoffs
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Header profiles rotated across requests
    #[serde(default = "defaults::identities")]
    pub identities: Vec<IdentityProfile>,

    /// Departments to scan, in canonical order
    #[serde(default = "defaults::departments")]
    pub departments: Vec<Department>,

    /// Export settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Fixed seed for the jitter source; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `path`, falling back to defaults only when
    /// the file is absent and was not explicitly requested.
    ///
    /// A file that exists but cannot be read or parsed is always an error.
    pub fn load_or_default(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if !required && !path.exists() {
            log::warn!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        if self.client.max_attempts == 0 {
            return Err(AppError::validation("client.max_attempts must be > 0"));
        }
        if self.client.endpoints.is_empty() {
            return Err(AppError::validation("client.endpoints is empty"));
        }
        for template in &self.client.endpoints {
            if !template.contains(LANG_PLACEHOLDER) {
                return Err(AppError::validation(format!(
                    "endpoint '{template}' has no {LANG_PLACEHOLDER} placeholder"
                )));
            }
            url::Url::parse(&expand_endpoint(template, Language::He))?;
        }
        if self.client.model_name.trim().is_empty() {
            return Err(AppError::validation("client.model_name is empty"));
        }

        for (name, range) in self.pacing.named_ranges() {
            if range.min_ms > range.max_ms {
                return Err(AppError::validation(format!(
                    "pacing.{name}: min_ms {} > max_ms {}",
                    range.min_ms, range.max_ms
                )));
            }
        }

        if self.identities.is_empty() {
            return Err(AppError::validation("No identities defined"));
        }
        if self.identities.iter().any(|i| i.user_agent.trim().is_empty()) {
            return Err(AppError::validation("identity with empty user_agent"));
        }

        if self.departments.is_empty() {
            return Err(AppError::validation("No departments defined"));
        }
        let mut seen = HashSet::new();
        for dept in &self.departments {
            if dept.id.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "department '{}' has an empty id",
                    dept.name
                )));
            }
            if !seen.insert(dept.id.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate department id {}",
                    dept.id
                )));
            }
        }

        if self.output.file_prefix.trim().is_empty() {
            return Err(AppError::validation("output.file_prefix is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            pacing: PacingConfig::default(),
            identities: defaults::identities(),
            departments: defaults::departments(),
            output: OutputConfig::default(),
            seed: None,
        }
    }
}

/// Placeholder substituted with the language code in endpoint templates.
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Expand an endpoint template for one language.
pub fn expand_endpoint(template: &str, language: Language) -> String {
    template.replace(LANG_PLACEHOLDER, language.code())
}

/// Remote endpoint and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Remote calls allowed per (department, language) query
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Interchangeable endpoint templates, alternated across attempts
    #[serde(default = "defaults::endpoints")]
    pub endpoints: Vec<String>,

    /// `ModelName` query parameter
    #[serde(default = "defaults::model_name")]
    pub model_name: String,

    /// `PageSize` query parameter
    #[serde(default = "defaults::page")]
    pub page_size: u32,

    /// `PageNumber` query parameter
    #[serde(default = "defaults::page")]
    pub page_number: u32,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            endpoints: defaults::endpoints(),
            model_name: defaults::model_name(),
            page_size: defaults::page(),
            page_number: defaults::page(),
        }
    }
}

/// Inclusive millisecond range a jittered delay is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn contains(&self, duration: Duration) -> bool {
        let ms = duration.as_millis();
        ms >= u128::from(self.min_ms) && ms <= u128::from(self.max_ms)
    }
}

/// Politeness delays and failure backoffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Slept before every request
    #[serde(default = "defaults::request_delay")]
    pub request_delay: DelayRange,

    /// Extra wait after HTTP 403
    #[serde(default = "defaults::forbidden_backoff")]
    pub forbidden_backoff: DelayRange,

    /// Extra wait after HTTP 429
    #[serde(default = "defaults::rate_limited_backoff")]
    pub rate_limited_backoff: DelayRange,

    /// Extra wait after a connection failure
    #[serde(default = "defaults::connect_backoff")]
    pub connect_backoff: DelayRange,

    /// Slept between two departments
    #[serde(default = "defaults::department_delay")]
    pub department_delay: DelayRange,
}

impl PacingConfig {
    /// All ranges with their config keys.
    pub fn named_ranges(&self) -> [(&'static str, DelayRange); 5] {
        [
            ("request_delay", self.request_delay),
            ("forbidden_backoff", self.forbidden_backoff),
            ("rate_limited_backoff", self.rate_limited_backoff),
            ("connect_backoff", self.connect_backoff),
            ("department_delay", self.department_delay),
        ]
    }

    /// Zero-length delays everywhere. Useful for dry runs against a local stub.
    pub fn immediate() -> Self {
        let zero = DelayRange::new(0, 0);
        Self {
            request_delay: zero,
            forbidden_backoff: zero,
            rate_limited_backoff: zero,
            connect_backoff: zero,
            department_delay: zero,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_delay: defaults::request_delay(),
            forbidden_backoff: defaults::forbidden_backoff(),
            rate_limited_backoff: defaults::rate_limited_backoff(),
            connect_backoff: defaults::connect_backoff(),
            department_delay: defaults::department_delay(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated file names are placed in
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,

    /// Prefix of generated file names
    #[serde(default = "defaults::file_prefix")]
    pub file_prefix: String,

    /// Append rows to an existing file instead of replacing it
    #[serde(default)]
    pub append: bool,
}

impl OutputConfig {
    /// Timestamped output path, e.g. `./govil_robust_20261019_1430.csv`.
    pub fn default_path(&self, now: DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.csv",
            self.file_prefix,
            now.format("%Y%m%d_%H%M")
        ))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            file_prefix: defaults::file_prefix(),
            append: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::DelayRange;
    use crate::models::{Department, IdentityProfile};

    // Client defaults
    pub fn timeout() -> u64 {
        45
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn endpoints() -> Vec<String> {
        vec![
            "https://www.gov.il/{lang}/api/GeneralApi/GetModel".into(),
            "https://gov.il/{lang}/api/GeneralApi/GetModel".into(),
        ]
    }
    pub fn model_name() -> String {
        "Service".into()
    }
    pub fn page() -> u32 {
        1
    }

    // Pacing defaults
    pub fn request_delay() -> DelayRange {
        DelayRange::new(500, 2_000)
    }
    pub fn forbidden_backoff() -> DelayRange {
        DelayRange::new(2_000, 5_000)
    }
    pub fn rate_limited_backoff() -> DelayRange {
        DelayRange::new(5_000, 10_000)
    }
    pub fn connect_backoff() -> DelayRange {
        DelayRange::new(3_000, 6_000)
    }
    pub fn department_delay() -> DelayRange {
        DelayRange::new(2_000, 5_000)
    }

    // Data defaults
    pub fn identities() -> Vec<IdentityProfile> {
        crate::models::default_identities()
    }
    pub fn departments() -> Vec<Department> {
        crate::models::default_departments()
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn file_prefix() -> String {
        "govil_robust".into()
    }
}
