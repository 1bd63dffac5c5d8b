//! Coral agent plumbing
//!
//! Liora joins a Coral session as an agent: it waits for mentions, answers
//! each one and replies in the mention's thread. The transport (`MessagingSession`)
//! and the agent brain (`Responder`) are traits so the loop can run against
//! any client.

use crate::error::{AppError, AppResult};
use reqwest::Url;

pub mod mention;
pub mod mention_loop;
pub mod prompt;
pub mod session;

pub use mention::{Mention, Reply, parse_mentions};
pub use mention_loop::{LoopStats, MentionLoop};
pub use prompt::{AGENT_DESCRIPTION, DEFAULT_AGENT_ID, GENERATOR_SYSTEM_PROMPT, agent_instructions};
pub use session::{MessagingSession, Responder, ToolCallResponder};

/// SSE URL carrying the agent's identity as query parameters
///
/// Existing `agentId` / `agentDescription` parameters are replaced; any
/// other parameters are kept.
///
/// # Errors
///
/// [`AppError::Config`] if `sse_url` is not an absolute URL.
pub fn connection_url(sse_url: &str, agent_id: &str, description: &str) -> AppResult<String> {
    let mut url = Url::parse(sse_url.trim())
        .map_err(|e| AppError::Config(format!("Invalid CORAL_SSE_URL '{}': {}", sse_url, e)))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "agentId" && key != "agentDescription")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .append_pair("agentId", agent_id)
        .append_pair("agentDescription", description);

    Ok(url.to_string())
}
