//! `POST /v1/resolve`: map a free-form model name to a catalog endpoint

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::observe_resolution;
use crate::resolver::{OutputType, Resolution, ResolutionRequest, resolve};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub model: String,
    #[serde(default)]
    pub output_type: OutputType,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub has_image_input: Option<bool>,
}

impl ResolveRequest {
    /// An explicit `hasImageInput` wins; otherwise a non-blank `imageUrl` counts
    fn has_image_input(&self) -> bool {
        self.has_image_input.unwrap_or_else(|| {
            self.image_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
        })
    }
}

pub async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> AppResult<Json<Resolution>> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let resolution = resolve(
        &ResolutionRequest::new(&request.model, request.output_type)
            .with_image_input(request.has_image_input()),
    );
    observe_resolution(state.metrics(), &resolution);

    tracing::info!(
        model = %request.model,
        endpoint = %resolution.endpoint,
        catalog = %resolution.catalog,
        match_kind = resolution.match_kind.as_str(),
        "Resolved model name"
    );

    Ok(Json(resolution))
}
