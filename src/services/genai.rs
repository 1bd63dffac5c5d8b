//! Generation from a free-form model name
//!
//! Resolves the model name to a catalog endpoint, optionally claims payment,
//! then runs the job on the generation backend.

use crate::error::AppResult;
use crate::metrics::{Metrics, observe_resolution};
use crate::resolver::{OutputType, Resolution, ResolutionRequest, resolve};
use crate::services::fal::GenerationBackend;
use crate::services::payment::{PaymentClaim, PaymentService};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Free-form model name, e.g. "nano banana"
    pub model: String,
    pub prompt: String,
    pub output_type: OutputType,
    /// Source image; switches resolution to the image-to-* catalogs
    pub image_url: Option<String>,
    /// Extra model-specific input merged over `prompt`
    pub extra: Map<String, Value>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, output_type: OutputType) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            output_type,
            ..Self::default()
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Resolver input for this request
    pub fn resolution_request(&self) -> ResolutionRequest<'_> {
        ResolutionRequest::new(&self.model, self.output_type)
            .with_image_input(self.image_url.is_some())
    }

    /// Backend input: `{ prompt, ...extra, image_url? }`
    pub fn backend_input(&self) -> Map<String, Value> {
        let mut input = Map::new();
        input.insert("prompt".to_string(), Value::String(self.prompt.clone()));
        for (key, value) in &self.extra {
            input.insert(key.clone(), value.clone());
        }
        if let Some(image_url) = &self.image_url {
            input.insert("image_url".to_string(), Value::String(image_url.clone()));
        }
        input
    }
}

/// Successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub request_id: String,
    pub data: Value,
    pub resolved_model: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentClaim>,
}

pub struct GenAiService {
    backend: Arc<dyn GenerationBackend>,
    payment: Option<(Arc<dyn PaymentService>, f64)>,
    metrics: Metrics,
}

impl GenAiService {
    pub fn new(backend: Arc<dyn GenerationBackend>, metrics: Metrics) -> Self {
        Self {
            backend,
            payment: None,
            metrics,
        }
    }

    /// Claim `amount` through `payment` before every generation
    pub fn with_payment(mut self, payment: Arc<dyn PaymentService>, amount: f64) -> Self {
        self.payment = Some((payment, amount));
        self
    }

    pub fn payment_enabled(&self) -> bool {
        self.payment.is_some()
    }

    /// Resolve the request's endpoint without generating
    pub fn resolve(&self, request: &GenerationRequest) -> Resolution {
        resolve(&request.resolution_request())
    }

    /// Resolve, claim (if enabled) and generate
    ///
    /// # Errors
    ///
    /// A failed claim aborts before the backend is called. Backend errors are
    /// returned unchanged.
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation> {
        let started = Instant::now();
        let resolution = self.resolve(request);
        observe_resolution(&self.metrics, &resolution);

        tracing::info!(
            model = %request.model,
            resolved_model = %resolution.endpoint,
            output_type = %request.output_type,
            has_image_input = request.image_url.is_some(),
            match_kind = resolution.match_kind.as_str(),
            "Starting generation"
        );

        let payment = match &self.payment {
            Some((service, amount)) => Some(service.claim(*amount).await?),
            None => None,
        };

        let result = self
            .backend
            .generate(resolution.endpoint, request.backend_input())
            .await?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = self.metrics.record_generation_duration(elapsed_ms) {
            self.metrics
                .metrics_recording_failure("record_generation_duration");
            tracing::error!(
                error = %e,
                elapsed_ms,
                "Metrics recording failed. Observability degraded but request continues."
            );
        }

        tracing::info!(
            resolved_model = %resolution.endpoint,
            request_id = %result.request_id,
            elapsed_ms,
            "Generation finished"
        );

        Ok(Generation {
            request_id: result.request_id,
            data: result.data,
            resolved_model: resolution.endpoint,
            payment,
        })
    }
}
