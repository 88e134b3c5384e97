//! Per-site DAU retrieval with bounded retries and exponential backoff

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::io::HttpClient;
use crate::DauMonitorError;

/// Path appended to every site to reach its daily analytics endpoint
pub const ANALYTICS_PATH: &str = "/api/analytics/daily";

/// Field carrying the visitor count in the analytics response
const VISITOR_FIELD: &str = "unique_visitors";

/// Longest body excerpt kept in a failure reason
const BODY_SNIPPET_CHARS: usize = 200;

/// How many times to try a site and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per site; zero is treated as one
    pub max_retries: u32,
    /// Timeout applied to each attempt on its own
    pub timeout: Duration,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(10),
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after failed attempt `attempt` (0-based): `2^attempt` backoff units
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }
}

/// Either the visitor count or why it could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(u64),
    Failure(String),
}

/// Result of polling one site
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub site: String,
    pub result: FetchResult,
    pub attempts: u32,
    pub observed_at: DateTime<Utc>,
}

impl FetchOutcome {
    pub fn success(site: impl Into<String>, value: u64, attempts: u32) -> Self {
        Self {
            site: site.into(),
            result: FetchResult::Success(value),
            attempts,
            observed_at: Utc::now(),
        }
    }

    pub fn failure(site: impl Into<String>, reason: impl Into<String>, attempts: u32) -> Self {
        Self {
            site: site.into(),
            result: FetchResult::Failure(reason.into()),
            attempts,
            observed_at: Utc::now(),
        }
    }

    pub fn value(&self) -> Option<u64> {
        match &self.result {
            FetchResult::Success(value) => Some(*value),
            FetchResult::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.result {
            FetchResult::Success(_) => None,
            FetchResult::Failure(reason) => Some(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, FetchResult::Success(_))
    }
}

/// Build the analytics endpoint for a site
pub fn analytics_url(site: &str) -> String {
    format!("{}{}", site.trim_end_matches('/'), ANALYTICS_PATH)
}

/// Extract the visitor count from an analytics response body.
///
/// A missing or null field counts as zero visitors.
pub fn parse_visitor_count(body: &str) -> crate::Result<u64> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| DauMonitorError::MalformedResponse(e.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(DauMonitorError::MalformedResponse("expected a JSON object".to_string()));
    };

    match object.get(VISITOR_FIELD) {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(count) => count.as_u64().ok_or_else(|| {
            DauMonitorError::MalformedResponse(format!(
                "{} is not a non-negative integer: {}",
                VISITOR_FIELD, count
            ))
        }),
    }
}

/// Truncate a response body for inclusion in an error message
pub(crate) fn body_snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

/// Polls analytics endpoints through an [`HttpClient`]
#[derive(Clone)]
pub struct Fetcher {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Fetch the DAU count for `site`, retrying failed attempts per `policy`
    pub async fn fetch(&self, site: &str, policy: &RetryPolicy) -> FetchOutcome {
        let url = analytics_url(site);
        let attempts = policy.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            tracing::debug!(
                "Fetching DAU from {} (attempt {}/{})",
                url,
                attempt + 1,
                attempts
            );
            let started = Instant::now();
            let result = self.attempt(&url, policy.timeout).await;
            let elapsed = started.elapsed();

            match result {
                Ok(count) => {
                    tracing::info!(
                        "Fetched DAU from {}: {} unique visitors ({:.2}s)",
                        site,
                        count,
                        elapsed.as_secs_f64()
                    );
                    return FetchOutcome::success(site, count, attempt + 1);
                }
                Err(e) => {
                    tracing::warn!(
                        "DAU fetch from {} failed on attempt {}/{} after {:.2}s: {}",
                        site,
                        attempt + 1,
                        attempts,
                        elapsed.as_secs_f64(),
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                let delay = policy.backoff_delay(attempt);
                tracing::debug!("Retrying {} in {:?}", site, delay);
                tokio::time::sleep(delay).await;
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        FetchOutcome::failure(site, reason, attempts)
    }

    async fn attempt(&self, url: &str, timeout: Duration) -> crate::Result<u64> {
        let response = self.http.get(url, timeout).await?;
        if response.status != 200 {
            return Err(DauMonitorError::Remote {
                status: response.status,
                body: body_snippet(&response.body),
            });
        }
        parse_visitor_count(&response.body)
    }
}
