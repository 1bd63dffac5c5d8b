//! `genai-execute`: generate from a free-form model name

use crate::metrics::Metrics;
use crate::resolver::{OutputType, resolve};
use crate::services::{GenAiService, GenerationRequest};
use crate::tools::{Tool, failure, parse_input, require_non_blank};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Input {
    model: String,
    prompt: String,
    #[serde(default)]
    output_type: OutputType,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    input: Option<Map<String, Value>>,
}

impl Input {
    fn into_request(self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.model, self.prompt, self.output_type)
            .with_extra(self.input.unwrap_or_default());
        if let Some(image_url) = self.image_url.filter(|url| !url.trim().is_empty()) {
            request = request.with_image_url(image_url);
        }
        request
    }
}

pub struct GenAiExecuteTool {
    service: Arc<GenAiService>,
    metrics: Metrics,
}

impl GenAiExecuteTool {
    pub const NAME: &'static str = "genai-execute";

    pub fn new(service: Arc<GenAiService>, metrics: Metrics) -> Self {
        Self { service, metrics }
    }
}

#[async_trait]
impl Tool for GenAiExecuteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Generate images or videos using a generic model name"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "Generic model name, e.g. 'nano banana' or 'flux dev'"
                },
                "prompt": { "type": "string", "description": "User prompt for generation" },
                "outputType": {
                    "type": "string",
                    "enum": ["image", "video"],
                    "default": "image",
                    "description": "Expected type of output"
                },
                "imageUrl": {
                    "type": "string",
                    "description": "Optional source image for image-to-image or image-to-video"
                },
                "input": {
                    "type": "object",
                    "description": "Extra model-specific input merged with prompt"
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
        let request = input.into_request();

        // A blank model is valid and resolves to the default endpoint
        if let Err(e) = require_non_blank("prompt", &request.prompt) {
            return failure(Self::NAME, &self.metrics, &e);
        }

        match self.service.generate(&request).await {
            Ok(generation) => match serde_json::to_value(&generation) {
                Ok(value) => value,
                Err(e) => failure(
                    Self::NAME,
                    &self.metrics,
                    &crate::error::AppError::Internal(format!(
                        "failed to serialize generation: {}",
                        e
                    )),
                ),
            },
            Err(e) => {
                let resolved_model = resolve(&request.resolution_request()).endpoint;
                let mut outcome = failure(Self::NAME, &self.metrics, &e);
                outcome["resolvedModel"] = Value::String(resolved_model.to_string());
                outcome
            }
        }
    }
}
