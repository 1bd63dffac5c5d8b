//! Upstream collaborators
//!
//! Each collaborator sits behind a trait with a live (reqwest) and a mock
//! implementation. [`Services::from_config`] picks between them once at
//! startup.

use crate::config::{Config, Credentials, Service};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::shared::retry::RetryPolicy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub mod best_practice;
pub mod fal;
pub mod genai;
pub mod notion;
pub mod payment;

pub use best_practice::BestPracticeService;
pub use fal::{FalClient, GenerationBackend, GenerationResult, MockGenerationBackend};
pub use genai::{GenAiService, Generation, GenerationRequest};
pub use notion::{
    BestPractice, BestPracticeRepository, MockBestPracticeRepository, NotionRepository, OutputKind,
};
pub use payment::{CoralPaymentClient, MockPaymentService, PaymentClaim, PaymentService};

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Collaborators wired for one process
#[derive(Clone)]
pub struct Services {
    pub generation: Arc<dyn GenerationBackend>,
    pub genai: Arc<GenAiService>,
    pub best_practices: Arc<BestPracticeService>,
}

impl Services {
    /// Build live or mock collaborators as the configuration dictates
    ///
    /// # Errors
    ///
    /// - [`AppError::MissingConfig`] listing every absent credential
    /// - [`AppError::Internal`] if the HTTP client cannot be built
    pub fn from_config(
        config: &Config,
        credentials: &Credentials,
        metrics: Metrics,
    ) -> AppResult<Self> {
        credentials.validate(&config.required_services())?;

        if config.services.offline() {
            tracing::info!("Offline mode: using mock collaborators");
            return Ok(Self::offline(metrics));
        }

        let http = http_client(Duration::from_secs(config.server.request_timeout_seconds))?;
        let retry = RetryPolicy::from(&config.retry);

        let generation: Arc<dyn GenerationBackend> = Arc::new(
            FalClient::new(
                http.clone(),
                config.fal.queue_url(),
                credentials.require("FAL_KEY")?,
            )
            .with_polling(
                Duration::from_millis(config.fal.poll_interval_ms()),
                config.fal.max_poll_attempts(),
            )
            .with_retry(retry),
        );

        let repository: Arc<dyn BestPracticeRepository> = if config.notion.use_mock() {
            tracing::info!("Notion mock enabled: serving built-in best practices");
            Arc::new(MockBestPracticeRepository)
        } else {
            Arc::new(
                NotionRepository::from_config(
                    http.clone(),
                    &config.notion,
                    credentials.require("NOTION_API_TOKEN")?,
                    credentials.require("NOTION_BEST_PRACTICES_DB_ID")?,
                )
                .with_retry(retry),
            )
        };

        let mut genai = GenAiService::new(generation.clone(), metrics.clone());
        if config.payment.enabled() {
            let payment = CoralPaymentClient::new(
                http,
                credentials.require("CORAL_API_URL")?,
                credentials.require("CORAL_SESSION_ID")?,
            );
            genai = genai.with_payment(Arc::new(payment), config.payment.claim_amount());
        }

        tracing::info!(
            fal_queue_url = %config.fal.queue_url(),
            notion_mock = config.notion.use_mock(),
            payment_enabled = config.payment.enabled(),
            "Live collaborators configured"
        );

        Ok(Self {
            generation,
            genai: Arc::new(genai),
            best_practices: Arc::new(BestPracticeService::new(repository)),
        })
    }

    /// Mock collaborators only; no network access
    pub fn offline(metrics: Metrics) -> Self {
        let generation: Arc<dyn GenerationBackend> = Arc::new(MockGenerationBackend);
        Self {
            genai: Arc::new(GenAiService::new(generation.clone(), metrics)),
            generation,
            best_practices: Arc::new(BestPracticeService::new(Arc::new(
                MockBestPracticeRepository,
            ))),
        }
    }
}

/// Shared reqwest client with a per-request timeout
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("liora/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Send a request and decode a JSON body
///
/// Transport failures become [`AppError::UpstreamRequest`], non-2xx
/// statuses [`AppError::UpstreamStatus`], undecodable bodies
/// [`AppError::ResponseShape`]. An empty 2xx body decodes as `{}`.
pub(crate) async fn send_json(request: reqwest::RequestBuilder, service: Service) -> AppResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::UpstreamRequest {
            service,
            reason: e.to_string(),
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| AppError::UpstreamRequest {
        service,
        reason: format!("failed to read response body: {}", e),
    })?;

    if !status.is_success() {
        return Err(AppError::UpstreamStatus {
            service,
            status: status.as_u16(),
            body: truncate(&text),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_str(&text).map_err(|e| AppError::ResponseShape {
        service,
        reason: format!("body is not valid JSON: {}", e),
    })
}

/// Required string field of a JSON object
pub(crate) fn required_str(value: &Value, field: &str, service: Service) -> AppResult<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AppError::ResponseShape {
            service,
            reason: format!("missing string field '{}'", field),
        })
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}
