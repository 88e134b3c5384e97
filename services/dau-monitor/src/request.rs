//! Trigger payload and the monitoring request derived from it

use serde::{Deserialize, Serialize};

use crate::DauMonitorError;

/// Label used when a site has no matching `frontend-` setting
pub const DEFAULT_DISPLAY_LABEL: &str = "N/A";

const SITE_PREFIX: &str = "site-";
const FRONTEND_PREFIX: &str = "frontend-";
const INTERVAL_LABEL: &str = "interval";

/// One entry of the caller-supplied settings list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub default: String,
}

/// Body of a `POST /tick` trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorPayload {
    pub channel_id: String,
    pub return_url: String,
    pub settings: Vec<Setting>,
}

/// A site to poll and the label shown next to it in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub site: String,
    pub display_label: Option<String>,
}

impl Target {
    pub fn new(site: impl Into<String>, display_label: Option<String>) -> Self {
        Self {
            site: site.into(),
            display_label,
        }
    }

    pub fn label(&self) -> &str {
        self.display_label.as_deref().unwrap_or(DEFAULT_DISPLAY_LABEL)
    }
}

/// Input to one orchestration run
#[derive(Debug, Clone)]
pub struct MonitoringRequest {
    pub channel_id: String,
    pub callback_url: String,
    pub targets: Vec<Target>,
    /// Advisory cadence such as `@hourly`; not acted upon
    pub interval: Option<String>,
}

impl MonitoringRequest {
    /// Build a request from a trigger payload, enforcing the request invariants
    pub fn from_payload(payload: MonitorPayload) -> crate::Result<Self> {
        let sites: Vec<String> = payload
            .settings
            .iter()
            .filter(|s| s.label.starts_with(SITE_PREFIX))
            .map(|s| s.default.trim().to_string())
            .collect();
        let frontends: Vec<String> = payload
            .settings
            .iter()
            .filter(|s| s.label.starts_with(FRONTEND_PREFIX))
            .map(|s| s.default.trim().to_string())
            .collect();
        let interval = payload
            .settings
            .iter()
            .find(|s| s.label == INTERVAL_LABEL)
            .map(|s| s.default.clone());

        if sites.is_empty() {
            return Err(DauMonitorError::Validation(
                "at least one site- setting is required".to_string(),
            ));
        }
        if frontends.len() > sites.len() {
            return Err(DauMonitorError::Validation(format!(
                "{} frontend- settings given for {} sites",
                frontends.len(),
                sites.len()
            )));
        }
        validate_callback_url(&payload.return_url)?;

        let mut frontends = frontends.into_iter();
        let targets = sites
            .into_iter()
            .map(|site| {
                let label = frontends.next().filter(|l| !l.is_empty());
                Target::new(site, label)
            })
            .collect();

        Ok(Self {
            channel_id: payload.channel_id,
            callback_url: payload.return_url,
            targets,
            interval,
        })
    }
}

fn validate_callback_url(url: &str) -> crate::Result<()> {
    let parsed = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            let reason = format!("return_url {:?}: {}", url, e);
            return Err(DauMonitorError::Validation(reason));
        }
    };
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(DauMonitorError::Validation(format!(
            "return_url {:?} is not an http(s) URL",
            url
        )));
    }
    Ok(())
}
