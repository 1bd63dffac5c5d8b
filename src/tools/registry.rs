//! Name-indexed tool dispatch

use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, ToolOutcome};
use crate::services::Services;
use crate::tools::{
    BestPracticeTool, FalGenerateTool, GenAiExecuteTool, Tool, ToolDescriptor, is_error_outcome,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registered tools, listed in name order
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Arc<dyn Tool>>,
    metrics: Metrics,
}

impl ToolRegistry {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            tools: BTreeMap::new(),
            metrics,
        }
    }

    /// The three Liora tools wired to `services`
    pub fn with_services(services: &Services, metrics: Metrics) -> Self {
        let mut registry = Self::new(metrics.clone());
        registry.register(Arc::new(BestPracticeTool::new(
            services.best_practices.clone(),
            metrics.clone(),
        )));
        registry.register(Arc::new(GenAiExecuteTool::new(
            services.genai.clone(),
            metrics.clone(),
        )));
        registry.register(Arc::new(FalGenerateTool::new(
            services.generation.clone(),
            metrics,
        )));
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.tools.insert(tool.name(), tool.clone()).is_some() {
            tracing::warn!(tool = tool.name(), "Replaced previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.descriptor()).collect()
    }

    /// Run tool `name` on `input`
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownTool`] if no tool is registered under `name`. Tool
    /// failures are not errors; they come back as `{ "error": ... }`.
    pub async fn execute(&self, name: &str, input: Value) -> AppResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AppError::UnknownTool(name.to_string()))?;

        tracing::debug!(tool = tool.name(), "Executing tool");
        let outcome = tool.execute(input).await;

        let label = if is_error_outcome(&outcome) {
            ToolOutcome::Error
        } else {
            ToolOutcome::Ok
        };
        if let Err(e) = self.metrics.record_tool_invocation(tool.name(), label) {
            self.metrics
                .metrics_recording_failure("record_tool_invocation");
            tracing::error!(
                error = %e,
                tool = tool.name(),
                "Metrics recording failed. Observability degraded but request continues."
            );
        }

        Ok(outcome)
    }
}
