//! Curated fal.ai endpoint catalogs
//!
//! Three disjoint, build-time catalogs partitioned by invocation shape.
//! Declaration order is significant: it is the final tie-breaker when two
//! endpoints score identically.

use super::OutputType;
use serde::Serialize;

/// Endpoint returned when a model name normalizes to nothing
///
/// Belongs to none of the catalogs, so it is never confused with a scored match.
pub const DEFAULT_ENDPOINT: &str = "fal-ai/flux/dev";

/// Text prompt only; serves both image and video outputs
pub const TEXT_TO_OUTPUT: &[&str] = &[
    "fal-ai/nano-banana",
    "fal-ai/veo3",
    "fal-ai/bytedance/seedream/v4/text-to-image",
    "fal-ai/kling-video/v2/master/text-to-video",
    "fal-ai/ideogram/v3",
];

/// Source image in, image out
pub const IMAGE_TO_IMAGE: &[&str] = &[
    "fal-ai/flux/dev/image-to-image",
    "fal-ai/nano-banana/edit",
    "fal-ai/bytedance/seedream/v4/edit",
    "fal-ai/ideogram/v3/remix",
];

/// Source image in, video out
pub const IMAGE_TO_VIDEO: &[&str] = &[
    "fal-ai/kling-video/v2/master/image-to-video",
    "fal-ai/veo2/image-to-video",
    "fal-ai/bytedance/seedance/v1/pro/image-to-video",
];

/// Which catalog a resolution was restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    TextToOutput,
    ImageToImage,
    ImageToVideo,
}

impl CatalogKind {
    /// Every catalog, in a stable order
    pub const ALL: [CatalogKind; 3] = [
        CatalogKind::TextToOutput,
        CatalogKind::ImageToImage,
        CatalogKind::ImageToVideo,
    ];

    /// Pick the catalog for an `(output_type, has_image_input)` pair
    ///
    /// Without an image input both modalities share the text catalog; the
    /// entries themselves disambiguate image from video producers.
    pub fn select(output_type: OutputType, has_image_input: bool) -> Self {
        match (has_image_input, output_type) {
            (false, _) => CatalogKind::TextToOutput,
            (true, OutputType::Image) => CatalogKind::ImageToImage,
            (true, OutputType::Video) => CatalogKind::ImageToVideo,
        }
    }

    /// The endpoints in this catalog, in declaration order
    pub fn entries(&self) -> &'static [&'static str] {
        match self {
            CatalogKind::TextToOutput => TEXT_TO_OUTPUT,
            CatalogKind::ImageToImage => IMAGE_TO_IMAGE,
            CatalogKind::ImageToVideo => IMAGE_TO_VIDEO,
        }
    }

    /// Label used in logs, metrics and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::TextToOutput => "text_to_output",
            CatalogKind::ImageToImage => "image_to_image",
            CatalogKind::ImageToVideo => "image_to_video",
        }
    }

    /// Whether `endpoint` is declared in this catalog
    pub fn contains(&self, endpoint: &str) -> bool {
        self.entries().contains(&endpoint)
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
