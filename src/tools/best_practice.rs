//! `get-best-practices`

use crate::metrics::Metrics;
use crate::services::BestPracticeService;
use crate::tools::{Tool, failure, parse_input};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Input {
    prompt: String,
}

pub struct BestPracticeTool {
    service: Arc<BestPracticeService>,
    metrics: Metrics,
}

impl BestPracticeTool {
    pub const NAME: &'static str = "get-best-practices";

    pub fn new(service: Arc<BestPracticeService>, metrics: Metrics) -> Self {
        Self { service, metrics }
    }
}

#[async_trait]
impl Tool for BestPracticeTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Get relevant best practices for a GenAI prompt"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "GenAI prompt" }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, input: Value) -> Value {
        let input: Input = match parse_input(Self::NAME, input) {
            Ok(input) => input,
            Err(e) => return failure(Self::NAME, &self.metrics, &e),
        };

        match self.service.relevant_for_prompt(&input.prompt).await {
            Ok(practices) => json!({ "bestPractices": practices }),
            Err(e) => failure(Self::NAME, &self.metrics, &e),
        }
    }
}
