//! HTTP trigger surface: tick endpoint, integration metadata and health

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::fetcher::ANALYTICS_PATH;
use crate::orchestrator::Orchestrator;
use crate::request::{MonitorPayload, MonitoringRequest};

/// Site whose analytics endpoint is advertised as the integration's target
const DEFAULT_TARGET_SITE: &str = "https://portfolio-wahz.onrender.com";

/// Project homepage advertised in the integration descriptions
const APP_URL: &str = "https://project-it.onrender.com";

/// Router application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Base URL used for `tick_url`; falls back to the request's Host header
    pub public_url: Option<String>,
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tick", post(tick_handler))
        .route("/integration.json", get(integration_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn tick_handler(
    State(app): State<AppState>,
    Json(payload): Json<MonitorPayload>,
) -> Response {
    tracing::info!("Received tick request for channel: {}", payload.channel_id);
    tracing::debug!(
        "Tick payload: return_url={}, settings_count={}",
        payload.return_url,
        payload.settings.len()
    );

    match MonitoringRequest::from_payload(payload) {
        Ok(request) => {
            // Detached: the caller is acknowledged before any site is polled
            drop(Arc::clone(&app.orchestrator).spawn(request));
            let body = Json(json!({ "status": "accepted" }));
            (StatusCode::ACCEPTED, body).into_response()
        }
        Err(e) => {
            tracing::warn!("Rejected tick request: {}", e);
            let body = Json(json!({ "detail": e.to_string() }));
            (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
        }
    }
}

fn base_url(app: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &app.public_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}

async fn integration_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let base_url = base_url(&app, &headers);
    tracing::debug!("Serving integration.json with base URL {}", base_url);

    Json(json!({
        "data": {
            "author": "Blackfox",
            "date": {
                "created_at": "2025-02-13",
                "updated_at": "2025-02-13"
            },
            "descriptions": {
                "app_description": "A bot that monitors the number of daily active users (DAU) on a platform.",
                "app_logo": "https://img.icons8.com/?size=100&id=37410&format=png&color=000000",
                "app_name": "Telex DAU Monitor",
                "app_url": APP_URL,
                "background_color": "#ffffff"
            },
            "integration_category": "Analytics & Monitoring",
            "integration_type": "interval",
            "is_active": true,
            "key_features": [
                "Receive messages from Telex channels.",
                "Fetch daily active users (DAU) from website analytics.",
                "Format messages based on predefined templates or logic.",
                "Send DAU reports back to the Telex channel.",
                "Log DAU tracking activity for auditing purposes."
            ],
            "permissions": {
                "events": [
                    "Receive messages from Telex channels.",
                    "Fetch DAU metrics from website analytics API.",
                    "Format DAU reports.",
                    "Send DAU updates back to the channel.",
                    "Log DAU tracking activity for auditing purposes."
                ]
            },
            "settings": [
                { "label": "site-1", "type": "text", "required": true, "default": "" },
                { "label": "interval", "type": "text", "required": true, "default": "@hourly" }
            ],
            "target_url": format!("{}{}", DEFAULT_TARGET_SITE, ANALYTICS_PATH),
            "tick_url": format!("{}/tick", base_url)
        }
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{} {} completed in {:.2}s - Status: {}",
        method,
        path,
        started.elapsed().as_secs_f64(),
        response.status().as_u16()
    );
    response
}
