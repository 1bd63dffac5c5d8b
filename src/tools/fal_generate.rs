//! `fal-generate`: run an explicit fal endpoint, no resolution

use crate::metrics::Metrics;
use crate::services::GenerationBackend;
use crate::tools::{Tool, failure, parse_input, require_non_blank};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Input {
    model: String,
    prompt: String,
    #[serde(default)]
    input: Option<Map<String, Value>>,
}

pub struct FalGenerateTool {
    backend: Arc<dyn GenerationBackend>,
    metrics: Metrics,
}

impl FalGenerateTool {
    pub const NAME: &'static str = "fal-generate";

    pub fn new(backend: Arc<dyn GenerationBackend>, metrics: Metrics) -> Self {
        Self { backend, metrics }
    }
}

#[async_trait]
impl Tool for FalGenerateTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Generate content with an exact fal.ai endpoint id"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "fal.ai endpoint id, e.g. 'fal-ai/flux/dev'"
                },
                "prompt": { "type": "string" },
                "input": {
                    "type": "object",
                    "description": "Extra endpoint input merged with prompt"
                }
            },
            "required": ["model", "prompt"]
        })
    }

    async fn execute(&self, input: Value) -> Value {
        let input: Input = match parse_input(Self::NAME, input) {
            Ok(input) => input,
            Err(e) => return failure(Self::NAME, &self.metrics, &e),
        };
        if let Err(e) = require_non_blank("model", &input.model)
            .and_then(|_| require_non_blank("prompt", &input.prompt))
        {
            return failure(Self::NAME, &self.metrics, &e);
        }

        let mut payload = Map::new();
        payload.insert("prompt".to_string(), Value::String(input.prompt));
        payload.extend(input.input.unwrap_or_default());

        let endpoint = input.model.trim();
        match self.backend.generate(endpoint, payload).await {
            Ok(result) => json!({ "requestId": result.request_id, "data": result.data }),
            Err(e) => failure(Self::NAME, &self.metrics, &e),
        }
    }
}
