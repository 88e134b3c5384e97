//! DAU Monitor - daily active user polling and reporting service
//!
//! On each tick, polls a list of sites for their daily active user count,
//! aggregates the results into one report and posts it to the caller's
//! callback URL.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod server;

pub use config::{load_config, Config};
pub use error::{DauMonitorError, Result};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::ReqwestHttpClient;
use crate::orchestrator::Orchestrator;
use crate::server::AppState;

/// Run the DAU monitor service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new());
    let orchestrator = Arc::new(Orchestrator::new(http, &config));
    tracing::debug!("Built {:?}", orchestrator);

    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    let router = server::build_router(AppState {
        orchestrator,
        public_url: config.server.public_url.clone(),
    });

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            let reason = format!("Failed to bind {}: {}", addr, e);
            return Err(DauMonitorError::Config(reason));
        }
    };
    tracing::info!("DAU monitor listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    tracing::info!("DAU monitor stopped");
    Ok(())
}
