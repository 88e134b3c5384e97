//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::DauMonitorError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request, giving up after `timeout`
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body, giving up after `timeout`
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn transport_error(method: &str, url: &str, e: reqwest::Error) -> DauMonitorError {
    if e.is_timeout() {
        DauMonitorError::Timeout
    } else {
        DauMonitorError::Http(format!("{} {} failed: {}", method, url, e))
    }
}

async fn into_response(
    method: &str,
    url: &str,
    response: reqwest::Response,
) -> crate::Result<HttpResponse> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            DauMonitorError::Timeout
        } else {
            DauMonitorError::Http(format!("Reading response body: {}", e))
        }
    })?;

    tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
    Ok(HttpResponse { status, body })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error("GET", url, e))?;

        into_response("GET", url, response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error("POST", url, e))?;

        into_response("POST", url, response).await
    }
}
