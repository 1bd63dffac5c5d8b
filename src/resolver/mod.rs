//! Endpoint resolution for Liora
//!
//! Maps a free-form model name ("Kling", "nano banana", "veo3") plus the
//! requested output modality onto one canonical fal.ai endpoint.
//!
//! Resolution is pure CPU logic: no I/O, no shared state, safe to call from
//! any thread or task. The algorithm:
//!
//! 1. Select a catalog from `(output_type, has_image_input)`
//! 2. Normalize the model name into a token set (empty → [`DEFAULT_ENDPOINT`])
//! 3. Exact-subset pass: endpoints containing every input token; fewest
//!    tokens wins, then smallest edit distance, then declaration order
//! 4. Fuzzy pass: `TOKEN_OVERLAP_WEIGHT × overlap − edit distance`,
//!    strictly highest wins, declaration order breaks ties

pub mod catalog;
pub mod normalize;

pub use catalog::{CatalogKind, DEFAULT_ENDPOINT, IMAGE_TO_IMAGE, IMAGE_TO_VIDEO, TEXT_TO_OUTPUT};
pub use normalize::{NormalizedName, levenshtein, normalize};

use serde::{Deserialize, Serialize};

/// Weight of one shared token against one character of edit distance
///
/// A tuning constant: it only has to make shared tokens dominate
/// character-level similarity for names of realistic length.
pub const TOKEN_OVERLAP_WEIGHT: i64 = 25;

/// Requested output modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Image,
    Video,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resolution was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Input normalized to nothing (or the catalog was empty)
    Default,
    /// Every input token appears in the endpoint
    ExactSubset,
    /// Best overlap/distance score
    Fuzzy,
}

impl MatchKind {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ExactSubset => "exact_subset",
            Self::Fuzzy => "fuzzy",
        }
    }
}

/// One resolution call's input
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub model_name: &'a str,
    pub output_type: OutputType,
    pub has_image_input: bool,
}

impl<'a> ResolutionRequest<'a> {
    /// Text-only request (no source image)
    pub fn new(model_name: &'a str, output_type: OutputType) -> Self {
        Self {
            model_name,
            output_type,
            has_image_input: false,
        }
    }

    /// Mark the request as carrying a source image
    pub fn with_image_input(mut self, has_image_input: bool) -> Self {
        self.has_image_input = has_image_input;
        self
    }
}

/// Result of a resolution
///
/// `endpoint` is always a member of `catalog`, except for
/// [`MatchKind::Default`] where it is [`DEFAULT_ENDPOINT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub endpoint: &'static str,
    pub catalog: CatalogKind,
    pub match_kind: MatchKind,
}

/// Resolve a request against the static catalogs
pub fn resolve(request: &ResolutionRequest<'_>) -> Resolution {
    let catalog = CatalogKind::select(request.output_type, request.has_image_input);
    let (endpoint, match_kind) = select_endpoint(catalog.entries(), request.model_name)
        .unwrap_or((DEFAULT_ENDPOINT, MatchKind::Default));

    tracing::debug!(
        model_name = %request.model_name,
        output_type = %request.output_type,
        has_image_input = request.has_image_input,
        catalog = %catalog,
        match_kind = match_kind.as_str(),
        endpoint = %endpoint,
        "Resolved model name to endpoint"
    );

    Resolution {
        endpoint,
        catalog,
        match_kind,
    }
}

/// Resolve and return only the endpoint identifier
pub fn resolve_endpoint(
    model_name: &str,
    output_type: OutputType,
    has_image_input: bool,
) -> &'static str {
    resolve(&ResolutionRequest::new(model_name, output_type).with_image_input(has_image_input))
        .endpoint
}

/// Pick the best entry of `catalog` for `model_name`
///
/// Returns `None` when the input has no tokens or the catalog is empty; the
/// caller substitutes the default endpoint.
fn select_endpoint<'c>(catalog: &[&'c str], model_name: &str) -> Option<(&'c str, MatchKind)> {
    let input = normalize(model_name);
    if input.is_empty() {
        return None;
    }

    let candidates: Vec<(&'c str, NormalizedName)> = catalog
        .iter()
        .map(|endpoint| (*endpoint, normalize(endpoint)))
        .collect();

    // Exact-subset pass: key = (token count, distance); strict `<` keeps the
    // first-declared endpoint on full ties
    let mut best_subset: Option<((usize, usize), &'c str)> = None;
    for (endpoint, candidate) in &candidates {
        if !input.is_subset_of(candidate) {
            continue;
        }
        let key = (
            candidate.token_count(),
            levenshtein(input.as_str(), candidate.as_str()),
        );
        if best_subset.is_none_or(|(best_key, _)| key < best_key) {
            best_subset = Some((key, endpoint));
        }
    }
    if let Some((_, endpoint)) = best_subset {
        return Some((endpoint, MatchKind::ExactSubset));
    }

    // Fuzzy pass
    let mut best_fuzzy: Option<(i64, &'c str)> = None;
    for (endpoint, candidate) in &candidates {
        let overlap = input.overlap(candidate) as i64;
        let distance = levenshtein(input.as_str(), candidate.as_str()) as i64;
        let score = TOKEN_OVERLAP_WEIGHT * overlap - distance;
        if best_fuzzy.is_none_or(|(best_score, _)| score > best_score) {
            best_fuzzy = Some((score, endpoint));
        }
    }

    best_fuzzy.map(|(_, endpoint)| (endpoint, MatchKind::Fuzzy))
}
