// src/models/identity.rs

//! Browser-like header profiles presented to the portal.

use serde::{Deserialize, Serialize};

/// One simulated client: a User-Agent plus the headers a browser would send with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityProfile {
    /// Client signature sent as `User-Agent`
    pub user_agent: String,

    #[serde(default = "defaults::accept")]
    pub accept: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    #[serde(default = "defaults::referer")]
    pub referer: String,

    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// Sent as both `Cache-Control` and `Pragma`
    #[serde(default = "defaults::no_cache")]
    pub cache_control: String,
}

impl IdentityProfile {
    /// Profile with the default browser header bundle.
    pub fn browser(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            referer: defaults::referer(),
            origin: defaults::origin(),
            cache_control: defaults::no_cache(),
        }
    }

    /// Header name/value pairs for this profile.
    ///
    /// `Accept-Encoding` and `Connection` are left to the HTTP client.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user-agent", self.user_agent.clone()),
            ("accept", self.accept.clone()),
            ("accept-language", self.accept_language.clone()),
            ("dnt", "1".into()),
            ("upgrade-insecure-requests", "1".into()),
            ("sec-fetch-dest", "empty".into()),
            ("sec-fetch-mode", "cors".into()),
            ("sec-fetch-site", "same-origin".into()),
            ("referer", self.referer.clone()),
            ("origin", self.origin.clone()),
            ("cache-control", self.cache_control.clone()),
            ("pragma", self.cache_control.clone()),
        ]
    }
}

/// The five desktop browser signatures rotated by default.
pub fn default_identities() -> Vec<IdentityProfile> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/121.0",
    ]
    .into_iter()
    .map(IdentityProfile::browser)
    .collect()
}

mod defaults {
    pub fn accept() -> String {
        "application/json, text/plain, */*".into()
    }
    pub fn accept_language() -> String {
        "he-IL,he;q=0.9,en;q=0.8,en-US;q=0.7".into()
    }
    pub fn referer() -> String {
        "https://www.gov.il/".into()
    }
    pub fn origin() -> String {
        "https://www.gov.il".into()
    }
    pub fn no_cache() -> String {
        "no-cache".into()
    }
}
