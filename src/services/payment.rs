//! Coral payment claims
//!
//! A claim debits the session budget before a paid generation runs.
//! Claims are not idempotent and are never retried.

use crate::config::Service;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Budget state after a successful claim
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentClaim {
    pub remaining_budget: f64,
    pub coral_usd_price: f64,
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Claim `amount` coral from the session budget
    async fn claim(&self, amount: f64) -> AppResult<PaymentClaim>;
}

#[derive(Debug, Deserialize)]
struct ClaimErrorBody {
    message: String,
    #[serde(default, rename = "stackTrace")]
    stack_trace: Option<Vec<String>>,
}

/// Live client for `POST /api/v1/internal/claim/{session}`
#[derive(Clone)]
pub struct CoralPaymentClient {
    http: reqwest::Client,
    api_url: String,
    session_id: String,
}

impl CoralPaymentClient {
    pub fn new(http: reqwest::Client, api_url: &str, session_id: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// Claim URL with the session id percent-encoded as one path segment
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `CORAL_API_URL` is not a valid base URL.
    pub fn claim_url(&self) -> AppResult<reqwest::Url> {
        let base = format!("{}/api/v1/internal/claim", self.api_url);
        let mut url = reqwest::Url::parse(&base)
            .map_err(|e| AppError::Config(format!("Invalid CORAL_API_URL '{}': {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("CORAL_API_URL '{}' cannot be a base URL", self.api_url)))?
            .push(&self.session_id);
        Ok(url)
    }
}

#[async_trait]
impl PaymentService for CoralPaymentClient {
    async fn claim(&self, amount: f64) -> AppResult<PaymentClaim> {
        let url = self.claim_url()?;
        tracing::info!(amount, "Claiming Coral payment");

        let response = self
            .http
            .post(url)
            .json(&json!({ "amount": { "type": "coral", "amount": amount } }))
            .send()
            .await
            .map_err(|e| AppError::UpstreamRequest {
                service: Service::Payment,
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AppError::UpstreamRequest {
            service: Service::Payment,
            reason: format!("failed to read response body: {}", e),
        })?;
        let body: Option<Value> = if text.trim().is_empty() {
            Some(json!({}))
        } else {
            serde_json::from_str(&text).ok()
        };

        if status.is_success() {
            let claim = body
                .and_then(|value| serde_json::from_value::<PaymentClaim>(value).ok())
                .ok_or_else(|| AppError::ResponseShape {
                    service: Service::Payment,
                    reason: format!("Invalid success payload shape (status {})", status.as_u16()),
                })?;
            tracing::info!(
                remaining_budget = claim.remaining_budget,
                coral_usd_price = claim.coral_usd_price,
                "Coral payment claimed"
            );
            return Ok(claim);
        }

        let parsed = body.and_then(|value| serde_json::from_value::<ClaimErrorBody>(value).ok());
        let message = match parsed {
            Some(error) => {
                if let Some(trace) = &error.stack_trace {
                    tracing::debug!(frames = trace.len(), "Payment API returned a stack trace");
                }
                error.message
            }
            None => format!("HTTP {}", status.as_u16()),
        };

        tracing::warn!(status = status.as_u16(), message = %message, "Coral payment claim rejected");
        Err(AppError::PaymentClaim {
            message,
            status: status.as_u16(),
        })
    }
}

/// Offline payment service with a fixed budget answer
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPaymentService;

#[async_trait]
impl PaymentService for MockPaymentService {
    async fn claim(&self, amount: f64) -> AppResult<PaymentClaim> {
        tracing::debug!(amount, "Mock payment claim");
        Ok(PaymentClaim {
            remaining_budget: 100.0,
            coral_usd_price: 1.0,
        })
    }
}
