//! Report assembly and the delivery payload

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::fetcher::{FetchOutcome, FetchResult};
use crate::request::Target;

pub const REPORT_USERNAME: &str = "DAU Monitor";
pub const REPORT_EVENT_NAME: &str = "Daily Active Users Report";

/// Binary status of a report: every site succeeded, or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Error,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "success"),
            ReportStatus::Error => write!(f, "error"),
        }
    }
}

/// Aggregated result of one run
#[derive(Debug, Clone)]
pub struct Report {
    pub lines: Vec<String>,
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
}

/// JSON body POSTed to the callback URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPayload {
    pub message: String,
    pub username: String,
    pub event_name: String,
    pub status: ReportStatus,
    pub timestamp: String,
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render the text block for one site
pub fn render_line(target: &Target, outcome: &FetchOutcome) -> String {
    let detail = match &outcome.result {
        FetchResult::Success(count) => format!("Daily active users: {}", count),
        FetchResult::Failure(reason) => format!("Error: {}", reason),
    };
    format!(
        "Site: {}\nFrontend: {}\n{}\nChecked at: {}",
        outcome.site,
        target.label(),
        detail,
        format_timestamp(&outcome.observed_at)
    )
}

impl Report {
    /// Build a report from outcomes given in the same order as `targets`
    pub fn from_outcomes(targets: &[Target], outcomes: &[FetchOutcome]) -> Self {
        debug_assert_eq!(targets.len(), outcomes.len());

        let lines = targets
            .iter()
            .zip(outcomes)
            .map(|(target, outcome)| render_line(target, outcome))
            .collect();

        // Empty batches report as errors
        let status = if !outcomes.is_empty() && outcomes.iter().all(FetchOutcome::is_success) {
            ReportStatus::Success
        } else {
            ReportStatus::Error
        };

        Self {
            lines,
            status,
            generated_at: Utc::now(),
        }
    }

    /// The per-site blocks separated by blank lines
    pub fn message(&self) -> String {
        self.lines.join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_payload(&self) -> DeliveryPayload {
        DeliveryPayload {
            message: self.message(),
            username: REPORT_USERNAME.to_string(),
            event_name: REPORT_EVENT_NAME.to_string(),
            status: self.status,
            timestamp: format_timestamp(&self.generated_at),
        }
    }
}
