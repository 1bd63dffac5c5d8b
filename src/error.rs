//! Error types for Liora
//!
//! All errors implement `IntoResponse` for Axum handlers. Tools never surface
//! an `AppError` directly; they render it with [`AppError::tool_message`].

use crate::config::Service;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more required credentials are absent, blank or placeholders
    #[error("Missing config: {}", missing.join(", "))]
    MissingConfig { missing: Vec<String> },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{service} request failed: {reason}")]
    UpstreamRequest { service: Service, reason: String },

    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamStatus {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("Unexpected {service} response: {reason}")]
    ResponseShape { service: Service, reason: String },

    /// The payment API refused the claim
    #[error("{message} (status {status})")]
    PaymentClaim { message: String, status: u16 },

    #[error("{service} did not finish within {waited_ms} ms")]
    Timeout { service: Service, waited_ms: u64 },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Bracketed classification used in tool outcomes, e.g. `FalRequestError`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Config(_)
            | Self::MissingConfig { .. } => "ConfigurationError",
            Self::Validation(_) => "ValidationError",
            Self::UpstreamRequest { service, .. }
            | Self::UpstreamStatus { service, .. }
            | Self::Timeout { service, .. } => service.request_error_tag(),
            Self::ResponseShape { .. } => "ResponseShapeError",
            Self::PaymentClaim { .. } => "PaymentClaimError",
            Self::UnknownTool(_) => "UnknownToolError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// `[Tag] message`, the form returned to agents by tools
    pub fn tool_message(&self) -> String {
        format!("[{}] {}", self.tag(), self)
    }

    /// Whether repeating the same call could plausibly succeed
    ///
    /// Transport failures, timeouts, 5xx and 429 responses are retryable.
    /// Everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamRequest { .. } | Self::Timeout { .. } => true,
            Self::UpstreamStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Upstream service this error originated from, if any
    pub fn service(&self) -> Option<Service> {
        match self {
            Self::UpstreamRequest { service, .. }
            | Self::UpstreamStatus { service, .. }
            | Self::ResponseShape { service, .. }
            | Self::Timeout { service, .. } => Some(*service),
            Self::PaymentClaim { .. } => Some(Service::Payment),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnknownTool(_) => StatusCode::NOT_FOUND,
            Self::PaymentClaim { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::UpstreamRequest { .. }
            | Self::UpstreamStatus { .. }
            | Self::ResponseShape { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Config(_)
            | Self::MissingConfig { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.tool_message(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_lists_every_name() {
        let err = AppError::MissingConfig {
            missing: vec!["FAL_KEY".to_string(), "NOTION_API_TOKEN".to_string()],
        };
        assert_eq!(err.to_string(), "Missing config: FAL_KEY, NOTION_API_TOKEN");
        assert_eq!(
            err.tool_message(),
            "[ConfigurationError] Missing config: FAL_KEY, NOTION_API_TOKEN"
        );
    }

    #[test]
    fn test_tags_follow_service() {
        let fal = AppError::UpstreamRequest {
            service: Service::Fal,
            reason: "connection reset".to_string(),
        };
        assert_eq!(fal.tag(), "FalRequestError");

        let notion = AppError::UpstreamStatus {
            service: Service::Notion,
            status: 400,
            body: "bad filter".to_string(),
        };
        assert_eq!(notion.tag(), "NotionQueryError");

        let payment = AppError::UpstreamRequest {
            service: Service::Payment,
            reason: "dns".to_string(),
        };
        assert_eq!(payment.tag(), "PaymentClaimRequestError");

        let claim = AppError::PaymentClaim {
            message: "Budget exhausted".to_string(),
            status: 402,
        };
        assert_eq!(
            claim.tool_message(),
            "[PaymentClaimError] Budget exhausted (status 402)"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let status = |status| AppError::UpstreamStatus {
            service: Service::Fal,
            status,
            body: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());

        assert!(
            AppError::UpstreamRequest {
                service: Service::Notion,
                reason: "timeout".to_string()
            }
            .is_retryable()
        );
        assert!(
            !AppError::ResponseShape {
                service: Service::Fal,
                reason: "missing request_id".to_string()
            }
            .is_retryable()
        );
        assert!(!AppError::MissingConfig { missing: vec![] }.is_retryable());
    }

    #[test]
    fn test_validation_error_response_status() {
        let response = AppError::Validation("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_tool_response_status() {
        let response = AppError::UnknownTool("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        let bad_gateway = AppError::ResponseShape {
            service: Service::Fal,
            reason: "x".to_string(),
        }
        .into_response();
        assert_eq!(bad_gateway.status(), StatusCode::BAD_GATEWAY);

        let timeout = AppError::Timeout {
            service: Service::Fal,
            waited_ms: 1000,
        }
        .into_response();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_config_error_response_status() {
        let response = AppError::Config("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_attribution() {
        assert_eq!(
            AppError::PaymentClaim {
                message: "x".to_string(),
                status: 400
            }
            .service(),
            Some(Service::Payment)
        );
        assert_eq!(AppError::Internal("x".to_string()).service(), None);
    }
}
