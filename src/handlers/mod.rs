//! HTTP request handlers for the Liora API

use crate::config::{Config, Credentials};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id::request_id_middleware;
use crate::services::Services;
use crate::tools::ToolRegistry;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod catalog;
pub mod health;
pub mod metrics;
pub mod resolve;
pub mod tools;

/// Application state shared across all handlers
///
/// All fields are Arc'd (or Arc-backed) for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Metrics,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    /// Build metrics, collaborators and tools from configuration
    ///
    /// # Errors
    ///
    /// - [`AppError::MissingConfig`] when enabled services lack credentials
    /// - [`AppError::Internal`] when metrics or the HTTP client cannot be created
    pub fn new(config: Arc<Config>, credentials: &Credentials) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("failed to initialize metrics: {}", e)))?;
        let services = Services::from_config(&config, credentials, metrics.clone())?;
        Ok(Self::from_services(config, services, metrics))
    }

    /// Wire already-built collaborators
    pub fn from_services(config: Arc<Config>, services: Services, metrics: Metrics) -> Self {
        let tools = Arc::new(ToolRegistry::with_services(&services, metrics.clone()));
        Self {
            config,
            metrics,
            tools,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }
}

/// Full application router, including request ids and HTTP tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/v1/catalog", get(catalog::handler))
        .route("/v1/resolve", post(resolve::handler))
        .route("/v1/tools", get(tools::list_handler))
        .route("/v1/tools/{name}", post(tools::execute_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::str::FromStr;

    pub const OFFLINE_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000

[services]
offline = true
"#;

    pub fn offline_state() -> AppState {
        let config = Config::from_str(OFFLINE_CONFIG).unwrap();
        let metrics = Metrics::new().unwrap();
        AppState::from_services(
            Arc::new(config),
            Services::offline(metrics.clone()),
            metrics,
        )
    }
}
