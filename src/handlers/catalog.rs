//! `GET /v1/catalog`: the endpoint catalogs the resolver chooses from

use axum::Json;
use serde::Serialize;

use crate::resolver::{DEFAULT_ENDPOINT, IMAGE_TO_IMAGE, IMAGE_TO_VIDEO, TEXT_TO_OUTPUT};

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub text_to_output: &'static [&'static str],
    pub image_to_image: &'static [&'static str],
    pub image_to_video: &'static [&'static str],
    /// Returned for model names that normalize to nothing
    pub default: &'static str,
}

impl CatalogResponse {
    pub fn current() -> Self {
        Self {
            text_to_output: TEXT_TO_OUTPUT,
            image_to_image: IMAGE_TO_IMAGE,
            image_to_video: IMAGE_TO_VIDEO,
            default: DEFAULT_ENDPOINT,
        }
    }
}

pub async fn handler() -> Json<CatalogResponse> {
    Json(CatalogResponse::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_lists_every_endpoint() {
        let Json(body) = handler().await;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["textToOutput"].as_array().unwrap().len(), TEXT_TO_OUTPUT.len());
        assert_eq!(json["imageToImage"][0], "fal-ai/flux/dev/image-to-image");
        assert_eq!(json["imageToVideo"].as_array().unwrap().len(), IMAGE_TO_VIDEO.len());
        assert_eq!(json["default"], "fal-ai/flux/dev");
    }
}
