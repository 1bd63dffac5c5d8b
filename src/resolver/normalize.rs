//! Model-name normalization and string distance
//!
//! Turns free text such as `"Kling 2.0 Master"` or `"fal-ai/kling-video/v2"`
//! into a canonical hyphen-joined form plus its token set.

use std::collections::BTreeSet;

/// Provider namespace stripped before tokenizing
const PROVIDER_PREFIX: &str = "fal-ai/";

/// A normalized model name or endpoint identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    joined: String,
    tokens: BTreeSet<String>,
}

impl NormalizedName {
    /// Hyphen-joined form, e.g. `kling-video-v2-master-text-to-video`
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// Deduplicated token set
    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.tokens
    }

    /// Number of distinct tokens
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when every token of `self` also appears in `other`
    pub fn is_subset_of(&self, other: &NormalizedName) -> bool {
        self.tokens.is_subset(&other.tokens)
    }

    /// Count of tokens shared with `other`
    pub fn overlap(&self, other: &NormalizedName) -> usize {
        self.tokens.intersection(&other.tokens).count()
    }
}

/// Normalize free text into a [`NormalizedName`]
///
/// Lower-cases, replaces every literal `fal-ai/` with a separator, then
/// collapses each run of characters outside `[a-z0-9]` into a single hyphen.
/// Leading and trailing separators are dropped.
pub fn normalize(value: &str) -> NormalizedName {
    let lowered = value.to_lowercase().replace(PROVIDER_PREFIX, " ");

    let mut joined = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !joined.is_empty() {
                joined.push('-');
            }
            pending_separator = false;
            joined.push(ch);
        } else {
            pending_separator = true;
        }
    }

    let tokens = joined
        .split('-')
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();

    NormalizedName { joined, tokens }
}

/// Unit-cost Levenshtein edit distance
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
