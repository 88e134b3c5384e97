//! Orchestrator: fans out fetches, assembles the report and delivers it

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::fetcher::{body_snippet, FetchOutcome, Fetcher, RetryPolicy};
use crate::io::HttpClient;
use crate::report::Report;
use crate::request::MonitoringRequest;
use crate::DauMonitorError;

/// Runs one polling-and-delivery cycle per monitoring request
pub struct Orchestrator {
    fetcher: Fetcher,
    http: Arc<dyn HttpClient>,
    policy: RetryPolicy,
    delivery_timeout: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("policy", &self.policy)
            .field("delivery_timeout", &self.delivery_timeout)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(http: Arc<dyn HttpClient>, config: &Config) -> Self {
        Self::with_policy(http, config.retry_policy(), config.delivery_timeout())
    }

    pub fn with_policy(
        http: Arc<dyn HttpClient>,
        policy: RetryPolicy,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(Arc::clone(&http)),
            http,
            policy,
            delivery_timeout,
        }
    }

    /// Poll every target concurrently and build the report.
    ///
    /// Waits for all sites; lines follow target order, not completion order.
    pub async fn collect(&self, request: &MonitoringRequest) -> Report {
        let handles: Vec<JoinHandle<FetchOutcome>> = request
            .targets
            .iter()
            .map(|target| {
                let fetcher = self.fetcher.clone();
                let policy = self.policy;
                let site = target.site.clone();
                tokio::spawn(async move { fetcher.fetch(&site, &policy).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (target, handle) in request.targets.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Fetch task for {} failed: {}", target.site, e);
                    FetchOutcome::failure(&target.site, format!("fetch task failed: {}", e), 0)
                }
            };
            outcomes.push(outcome);
        }

        let report = Report::from_outcomes(&request.targets, &outcomes);
        tracing::debug!(
            "Report for channel {} ({}):\n{}",
            request.channel_id,
            report.status,
            report.message()
        );
        report
    }

    /// POST the report to `callback_url` exactly once
    pub async fn deliver(&self, callback_url: &str, report: &Report) -> crate::Result<()> {
        let payload = serde_json::to_value(report.to_payload())?;

        tracing::debug!("Sending report to {}", callback_url);
        let response = self
            .http
            .post_json(callback_url, &payload, self.delivery_timeout)
            .await
            .map_err(|e| DauMonitorError::Delivery(e.to_string()))?;

        if !response.is_success() {
            return Err(DauMonitorError::Delivery(format!(
                "callback returned status {}: {}",
                response.status,
                body_snippet(&response.body)
            )));
        }

        tracing::info!(
            "Report delivered to {} (status {})",
            callback_url,
            response.status
        );
        Ok(())
    }

    /// Run one full cycle. Failures are logged, never returned.
    pub async fn run(&self, request: MonitoringRequest) {
        tracing::info!(
            "Starting DAU run for channel {} ({} sites, interval {})",
            request.channel_id,
            request.targets.len(),
            request.interval.as_deref().unwrap_or("unset")
        );

        let report = self.collect(&request).await;

        if report.is_empty() {
            tracing::warn!(
                "Channel {} has no targets; skipping delivery",
                request.channel_id
            );
            return;
        }

        if let Err(e) = self.deliver(&request.callback_url, &report).await {
            tracing::error!(
                "Failed to deliver report for channel {} to {}: {}",
                request.channel_id,
                request.callback_url,
                e
            );
            return;
        }

        tracing::info!(
            "DAU run for channel {} finished with status {}",
            request.channel_id,
            report.status
        );
    }

    /// Detach a run onto the runtime. The returned handle completes once the
    /// run has finished; a panic inside the run is logged.
    pub fn spawn(self: Arc<Self>, request: MonitoringRequest) -> JoinHandle<()> {
        let channel_id = request.channel_id.clone();
        let inner = tokio::spawn(async move { self.run(request).await });

        tokio::spawn(async move {
            if let Err(e) = inner.await {
                tracing::error!("DAU run for channel {} aborted: {}", channel_id, e);
            }
        })
    }
}
