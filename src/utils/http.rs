// src/utils/http.rs

//! HTTP client utilities.

use reqwest::redirect::Policy;

use crate::error::Result;
use crate::models::ClientConfig;

/// Create a configured asynchronous HTTP client.
///
/// No default User-Agent: every request carries the one of its identity.
pub fn create_async_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .redirect(Policy::limited(5))
        .build()?;
    Ok(client)
}
