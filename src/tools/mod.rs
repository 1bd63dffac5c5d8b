//! Agent-callable tools
//!
//! Every tool takes a JSON input and returns a JSON outcome. Tools never
//! fail: invalid input and service errors come back as
//! `{ "error": "[Tag] message" }`.

use crate::error::AppError;
use crate::metrics::Metrics;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub mod best_practice;
pub mod fal_generate;
pub mod genai_execute;
pub mod registry;

pub use best_practice::BestPracticeTool;
pub use fal_generate::FalGenerateTool;
pub use genai_execute::GenAiExecuteTool;
pub use registry::ToolRegistry;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier, e.g. `genai-execute`
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the accepted input
    fn input_schema(&self) -> Value;

    /// Run the tool; failures are reported inside the returned JSON
    async fn execute(&self, input: Value) -> Value;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

/// Public description of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// True when a tool outcome carries an `error` field
pub fn is_error_outcome(outcome: &Value) -> bool {
    outcome.get("error").is_some()
}

/// Deserialize tool input, reporting problems as a validation error
pub(crate) fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, AppError> {
    serde_json::from_value(input)
        .map_err(|e| AppError::Validation(format!("{} input is invalid: {}", tool, e)))
}

/// Reject blank required strings
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

/// Log a failure, count it against its upstream service, and render it
pub(crate) fn failure(tool: &'static str, metrics: &Metrics, err: &AppError) -> Value {
    if let Some(service) = err.service() {
        metrics.upstream_failure(service);
    }
    tracing::warn!(tool, tag = err.tag(), error = %err, "Tool execution failed");
    json!({ "error": err.tool_message() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Service;

    #[test]
    fn test_failure_renders_tagged_message_and_counts_service() {
        let metrics = Metrics::new().unwrap();
        let err = AppError::UpstreamStatus {
            service: Service::Fal,
            status: 500,
            body: "boom".to_string(),
        };
        let outcome = failure("fal-generate", &metrics, &err);
        assert_eq!(outcome["error"], "[FalRequestError] fal returned HTTP 500: boom");
        assert!(is_error_outcome(&outcome));
        assert_eq!(metrics.upstream_failure_count(Service::Fal), 1);
    }

    #[test]
    fn test_validation_failures_are_not_upstream() {
        let metrics = Metrics::new().unwrap();
        let err = AppError::Validation("'prompt' must not be empty".to_string());
        let outcome = failure("genai-execute", &metrics, &err);
        assert_eq!(
            outcome["error"],
            "[ValidationError] Invalid request: 'prompt' must not be empty"
        );
        for service in [Service::Fal, Service::Notion, Service::Payment] {
            assert_eq!(metrics.upstream_failure_count(service), 0);
        }
    }

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank("model", "  ").is_err());
        assert!(require_non_blank("model", "flux").is_ok());
    }
}
