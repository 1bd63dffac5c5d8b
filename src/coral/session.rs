//! Transport and responder seams for the mention loop

use crate::coral::mention::Reply;
use crate::error::{AppError, AppResult};
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Connection to a Coral session
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// Block for up to `timeout` and return the raw mentions payload
    async fn wait_for_mentions(&self, timeout: Duration) -> AppResult<Value>;

    async fn send_message(&self, reply: &Reply) -> AppResult<()>;
}

/// Produces the answer to a mention
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, content: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    tool: String,
    #[serde(default)]
    input: Option<Value>,
}

/// Answers mentions of the form `{ "tool": name, "input": {...} }` by running
/// the named tool and replying with its JSON outcome
pub struct ToolCallResponder {
    registry: Arc<ToolRegistry>,
}

impl ToolCallResponder {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Responder for ToolCallResponder {
    async fn respond(&self, content: &str) -> AppResult<String> {
        let call: ToolCall = serde_json::from_str(content.trim()).map_err(|e| {
            AppError::Validation(format!(
                "expected a tool call like {{\"tool\": \"genai-execute\", \"input\": {{...}}}}: {}",
                e
            ))
        })?;

        let input = call.input.unwrap_or_else(|| json!({}));
        let outcome = self.registry.execute(&call.tool, input).await?;

        serde_json::to_string(&outcome)
            .map_err(|e| AppError::Internal(format!("failed to serialize tool outcome: {}", e)))
    }
}
