// src/services/transport.rs

//! The single HTTP call the fetcher makes per attempt.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::error::Result;
use crate::models::ClientConfig;
use crate::utils::http;

/// A fully prepared count query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl CountRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Network-level failure, before any usable response arrived.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Issues count queries against the portal.
#[async_trait]
pub trait CountTransport: Send + Sync {
    async fn get(&self, request: &CountRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// reqwest-backed transport with the configured per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }
}

#[async_trait]
impl CountTransport for HttpTransport {
    async fn get(
        &self,
        request: &CountRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CountRequest {
        CountRequest {
            url: "https://www.gov.il/he/api/GeneralApi/GetModel".into(),
            query: vec![("ModelName", "Service".into())],
            headers: vec![("user-agent", "UA".into())],
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        assert_eq!(request().header("User-Agent"), Some("UA"));
        assert_eq!(request().header("referer"), None);
    }

    #[test]
    fn test_param_lookup() {
        assert_eq!(request().param("ModelName"), Some("Service"));
        assert_eq!(request().param("PageSize"), None);
    }

    #[test]
    fn test_http_transport_builds_from_defaults() {
        assert!(HttpTransport::new(&ClientConfig::default()).is_ok());
    }
}
