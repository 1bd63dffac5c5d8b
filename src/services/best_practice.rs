//! Best-practice lookup for a generation prompt

use crate::error::AppResult;
use crate::services::notion::{BestPractice, BestPracticeRepository};
use std::sync::Arc;

pub struct BestPracticeService {
    repository: Arc<dyn BestPracticeRepository>,
}

impl BestPracticeService {
    pub fn new(repository: Arc<dyn BestPracticeRepository>) -> Self {
        Self { repository }
    }

    /// Best practices to consider for `prompt`
    ///
    /// Returns the whole collection; the agent does the relevance filtering.
    pub async fn relevant_for_prompt(&self, prompt: &str) -> AppResult<Vec<BestPractice>> {
        let practices = self.repository.get_all().await?;
        tracing::info!(
            prompt_length = prompt.len(),
            count = practices.len(),
            "Loaded best practices"
        );
        Ok(practices)
    }

    /// Keyword search over the repository
    pub async fn search(&self, query: &str) -> AppResult<Vec<BestPractice>> {
        let practices = self.repository.search(query).await?;
        tracing::info!(query = %query, count = practices.len(), "Searched best practices");
        Ok(practices)
    }
}
