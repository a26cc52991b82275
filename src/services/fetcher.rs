// src/services/fetcher.rs

//! Retrying count fetcher.
//!
//! One [`RetryingFetcher::fetch`] call resolves a single (department, language)
//! pair. Each attempt picks a fresh identity, alternates the endpoint host,
//! waits a jittered politeness delay and issues one GET. The response is
//! classified into a [`Verdict`] that either ends the loop or decides the
//! backoff before the next attempt. When the attempt budget runs out the
//! count is reported as 0.

use serde_json::{Number, Value};

use crate::error::{AppError, Result};
use crate::models::{ClientConfig, Language, QueryOutcome, expand_endpoint};
use crate::services::{
    CountRequest, CountTransport, IdentityPool, Pacer, Pause, RawResponse, Sleeper,
    SpoofedOrigin, TransportError,
};
use crate::utils::truncate_chars;

/// Longest body excerpt written to the log.
const BODY_EXCERPT: usize = 100;

/// Classification of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 200 with a usable `totalResults`
    Success(u64),
    /// 200 with a body that is not the expected JSON shape
    Malformed,
    /// 403
    Forbidden,
    /// 429
    RateLimited,
    /// Any other status
    Status(u16),
    /// The request timed out
    Timeout,
    /// The connection could not be established
    ConnectFailure,
    /// Other transport failure
    Failed,
}

impl Verdict {
    /// Extra wait before the next attempt, on top of the regular request delay.
    pub fn backoff(&self) -> Option<Pause> {
        match self {
            Verdict::Forbidden => Some(Pause::Forbidden),
            Verdict::RateLimited => Some(Pause::RateLimited),
            Verdict::ConnectFailure => Some(Pause::ConnectFailure),
            _ => None,
        }
    }
}

/// Classify the result of a single request.
pub fn classify(result: &std::result::Result<RawResponse, TransportError>) -> Verdict {
    match result {
        Ok(response) => match response.status {
            200 => parse_total(&response.body).map_or(Verdict::Malformed, Verdict::Success),
            403 => Verdict::Forbidden,
            429 => Verdict::RateLimited,
            status => Verdict::Status(status),
        },
        Err(TransportError::Timeout) => Verdict::Timeout,
        Err(TransportError::Connect(_)) => Verdict::ConnectFailure,
        Err(TransportError::Other(_)) => Verdict::Failed,
    }
}

/// Extract `totalResults` from a response body.
///
/// `None` when the body is not a JSON object or the field is not a number.
/// A missing field counts as 0; negatives clamp to 0; fractions truncate.
pub fn parse_total(body: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.as_object()?.get("totalResults") {
        None => Some(0),
        Some(Value::Number(n)) => Some(coerce_count(n)),
        Some(_) => None,
    }
}

fn coerce_count(n: &Number) -> u64 {
    if let Some(count) = n.as_u64() {
        return count;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

/// Fetches one count with bounded retries. Never fails: exhaustion yields 0.
pub struct RetryingFetcher<T, S> {
    transport: T,
    pool: IdentityPool,
    pacer: Pacer<S>,
    client: ClientConfig,
}

impl<T: CountTransport, S: Sleeper> RetryingFetcher<T, S> {
    /// Build a fetcher; needs at least one endpoint template.
    pub fn new(
        transport: T,
        pool: IdentityPool,
        pacer: Pacer<S>,
        client: ClientConfig,
    ) -> Result<Self> {
        if client.endpoints.is_empty() {
            return Err(AppError::config("client.endpoints is empty"));
        }
        Ok(Self {
            transport,
            pool,
            pacer,
            client,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.client.max_attempts
    }

    /// Endpoint for a zero-based attempt; consecutive attempts alternate hosts.
    pub fn endpoint(&self, attempt: u32, language: Language) -> String {
        let templates = &self.client.endpoints;
        let template = &templates[attempt as usize % templates.len()];
        expand_endpoint(template, language)
    }

    /// Assemble the request for one attempt with a freshly chosen identity.
    pub fn build_request(
        &mut self,
        department_id: &str,
        language: Language,
        attempt: u32,
    ) -> CountRequest {
        let jitter = self.pacer.jitter_mut();
        let mut headers = self.pool.select(jitter).headers();
        headers.extend(SpoofedOrigin::random(jitter).headers());

        CountRequest {
            url: self.endpoint(attempt, language),
            query: vec![
                ("ModelName", self.client.model_name.clone()),
                ("OfficeTaxonomy", department_id.to_string()),
                ("PageSize", self.client.page_size.to_string()),
                ("PageNumber", self.client.page_number.to_string()),
            ],
            headers,
        }
    }

    /// Resolve the page count for `department_id` in `language`.
    pub async fn fetch(&mut self, department_id: &str, language: Language) -> QueryOutcome {
        let max_attempts = self.client.max_attempts;

        for attempt in 0..max_attempts {
            let request = self.build_request(department_id, language, attempt);
            self.pacer.pause(Pause::BeforeRequest).await;

            let result = self.transport.get(&request).await;
            let verdict = classify(&result);
            log::debug!(
                "attempt {}/{} {} [{}]: {:?}",
                attempt + 1,
                max_attempts,
                request.url,
                department_id,
                verdict
            );

            match &verdict {
                Verdict::Success(count) => {
                    if *count > 0 {
                        log::debug!("found {count} results ({language})");
                    }
                    return QueryOutcome::success(*count, attempt + 1);
                }
                Verdict::Malformed | Verdict::Status(_) => {
                    if let Ok(response) = &result {
                        log::debug!(
                            "unusable response {}: {}",
                            response.status,
                            truncate_chars(&response.body, BODY_EXCERPT)
                        );
                    }
                }
                Verdict::Failed => {
                    if let Err(err) = &result {
                        log::debug!("request error: {err}");
                    }
                }
                _ => {}
            }

            if let Some(pause) = verdict.backoff() {
                let waited = self.pacer.pause(pause).await;
                log::warn!(
                    "{:?} for {} ({}), {} of {:.1}s",
                    verdict,
                    department_id,
                    language,
                    pause,
                    waited.as_secs_f64()
                );
            }
        }

        log::warn!("gave up after {max_attempts} attempts for {department_id} ({language})");
        QueryOutcome::exhausted(max_attempts)
    }

    pub fn pacer_mut(&mut self) -> &mut Pacer<S> {
        &mut self.pacer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DelayRange, PacingConfig, default_identities};
    use crate::services::Jitter;
    use crate::services::testing::{RecordingSleeper, ScriptedTransport, ok, status};

    const DEPT: &str = "104cb0f4-d65a-4692-b590-94af928c19c0";

    fn fetcher(
        transport: ScriptedTransport,
        sleeper: RecordingSleeper,
    ) -> RetryingFetcher<ScriptedTransport, RecordingSleeper> {
        RetryingFetcher::new(
            transport,
            IdentityPool::new(default_identities()).unwrap(),
            Pacer::new(sleeper, Jitter::seeded(7), PacingConfig::default()),
            ClientConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_endpoint_list_rejected() {
        let client = ClientConfig {
            endpoints: Vec::new(),
            ..ClientConfig::default()
        };
        let result = RetryingFetcher::new(
            ScriptedTransport::new(Vec::new()),
            IdentityPool::new(default_identities()).unwrap(),
            Pacer::new(RecordingSleeper::default(), Jitter::seeded(1), PacingConfig::default()),
            client,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total(r#"{"totalResults": 42, "results": []}"#), Some(42));
        assert_eq!(parse_total(r#"{"totalResults": -3}"#), Some(0));
        assert_eq!(parse_total(r#"{"totalResults": 7.9}"#), Some(7));
        assert_eq!(parse_total(r#"{"results": []}"#), Some(0));
        assert_eq!(parse_total(r#"{"totalResults": "5"}"#), None);
        assert_eq!(parse_total(r#"[1, 2]"#), None);
        assert_eq!(parse_total("<html>blocked</html>"), None);
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(classify(&Ok(ok(3))), Verdict::Success(3));
        assert_eq!(classify(&Ok(status(200, "oops"))), Verdict::Malformed);
        assert_eq!(classify(&Ok(status(403, ""))), Verdict::Forbidden);
        assert_eq!(classify(&Ok(status(429, ""))), Verdict::RateLimited);
        assert_eq!(classify(&Ok(status(503, ""))), Verdict::Status(503));
        assert_eq!(classify(&Err(TransportError::Timeout)), Verdict::Timeout);
        assert_eq!(
            classify(&Err(TransportError::Connect("refused".into()))),
            Verdict::ConnectFailure
        );
        assert_eq!(classify(&Err(TransportError::Other("tls".into()))), Verdict::Failed);
    }

    #[test]
    fn test_backoff_only_for_block_limit_and_connect() {
        assert_eq!(Verdict::Forbidden.backoff(), Some(Pause::Forbidden));
        assert_eq!(Verdict::RateLimited.backoff(), Some(Pause::RateLimited));
        assert_eq!(Verdict::ConnectFailure.backoff(), Some(Pause::ConnectFailure));
        assert_eq!(Verdict::Timeout.backoff(), None);
        assert_eq!(Verdict::Malformed.backoff(), None);
        assert_eq!(Verdict::Status(500).backoff(), None);
    }

    #[tokio::test]
    async fn test_first_valid_response_wins() {
        let transport = ScriptedTransport::new(vec![Ok(ok(17)), Ok(ok(99))]);
        let sleeper = RecordingSleeper::default();
        let mut fetcher = fetcher(transport.clone(), sleeper.clone());

        let outcome = fetcher.fetch(DEPT, Language::He).await;

        assert_eq!(outcome, QueryOutcome::success(17, 1));
        assert_eq!(transport.calls(), 1);
        assert_eq!(sleeper.pauses_of(Pause::BeforeRequest).len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_until_exhausted() {
        let transport = ScriptedTransport::new(vec![
            Ok(status(429, "")),
            Ok(status(429, "")),
            Ok(status(429, "")),
        ]);
        let sleeper = RecordingSleeper::default();
        let mut fetcher = fetcher(transport.clone(), sleeper.clone());

        let outcome = fetcher.fetch(DEPT, Language::Ar).await;

        assert_eq!(outcome, QueryOutcome::exhausted(3));
        assert_eq!(outcome.count, 0);
        assert_eq!(transport.calls(), 3);

        let backoffs = sleeper.pauses_of(Pause::RateLimited);
        assert_eq!(backoffs.len(), 3);
        let range = DelayRange::new(5_000, 10_000);
        assert!(backoffs.iter().all(|d| range.contains(*d)));
    }

    #[tokio::test]
    async fn test_never_exceeds_attempt_budget() {
        let failures = vec![
            Ok(status(500, "")),
            Err(TransportError::Timeout),
            Ok(status(200, "not json")),
            Err(TransportError::Connect("reset".into())),
            Ok(status(403, "")),
            Ok(ok(5)),
        ];
        let transport = ScriptedTransport::new(failures);
        let mut fetcher = fetcher(transport.clone(), RecordingSleeper::default());

        let outcome = fetcher.fetch(DEPT, Language::En).await;

        assert!(outcome.exhausted);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_block() {
        let transport = ScriptedTransport::new(vec![Ok(status(403, "")), Ok(ok(8))]);
        let sleeper = RecordingSleeper::default();
        let mut fetcher = fetcher(transport.clone(), sleeper.clone());

        let outcome = fetcher.fetch(DEPT, Language::Ru).await;

        assert_eq!(outcome, QueryOutcome::success(8, 2));
        let blocked = sleeper.pauses_of(Pause::Forbidden);
        assert_eq!(blocked.len(), 1);
        assert!(DelayRange::new(2_000, 5_000).contains(blocked[0]));
    }

    #[tokio::test]
    async fn test_connect_failure_backs_off_timeout_does_not() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Connect("refused".into())),
            Ok(ok(1)),
        ]);
        let sleeper = RecordingSleeper::default();
        let mut fetcher = fetcher(transport.clone(), sleeper.clone());

        let outcome = fetcher.fetch(DEPT, Language::Fr).await;

        assert_eq!(outcome, QueryOutcome::success(1, 3));
        assert_eq!(sleeper.pauses_of(Pause::ConnectFailure).len(), 1);
        assert_eq!(sleeper.pauses_of(Pause::BeforeRequest).len(), 3);
        assert_eq!(sleeper.pauses().len(), 4);
    }

    #[tokio::test]
    async fn test_attempts_alternate_endpoints() {
        let transport = ScriptedTransport::new(vec![
            Ok(status(502, "")),
            Ok(status(502, "")),
            Ok(ok(2)),
        ]);
        let mut fetcher = fetcher(transport.clone(), RecordingSleeper::default());

        fetcher.fetch(DEPT, Language::Es).await;

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            [
                "https://www.gov.il/es/api/GeneralApi/GetModel",
                "https://gov.il/es/api/GeneralApi/GetModel",
                "https://www.gov.il/es/api/GeneralApi/GetModel",
            ]
        );
    }

    #[tokio::test]
    async fn test_request_carries_query_and_identity() {
        let transport = ScriptedTransport::new(vec![Ok(ok(0))]);
        let mut fetcher = fetcher(transport.clone(), RecordingSleeper::default());

        fetcher.fetch(DEPT, Language::He).await;

        let request = &transport.requests()[0];
        assert_eq!(request.param("ModelName"), Some("Service"));
        assert_eq!(request.param("OfficeTaxonomy"), Some(DEPT));
        assert_eq!(request.param("PageSize"), Some("1"));
        assert_eq!(request.param("PageNumber"), Some("1"));

        let user_agent = request.header("user-agent").unwrap();
        assert!(default_identities().iter().any(|i| i.user_agent == user_agent));
        assert!(request.header("x-forwarded-for").is_some());
        assert!(request.header("cf-connecting-ip").is_some());
    }
}
