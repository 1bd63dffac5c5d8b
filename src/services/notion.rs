//! Best-practice repository backed by a Notion database

use crate::config::{NotionConfig, Service};
use crate::error::{AppError, AppResult};
use crate::services::send_json;
use crate::shared::retry::{RetryPolicy, retry_with_backoff};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Modality a best practice applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Image,
    Video,
    Voice,
}

impl OutputKind {
    /// Parse a case-insensitive label; anything else is ignored upstream
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "voice" => Some(Self::Voice),
            _ => None,
        }
    }
}

/// One curated piece of prompting guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPractice {
    pub insight: String,
    pub relevant_models: Vec<String>,
    pub output_types: Vec<OutputKind>,
}

#[async_trait]
pub trait BestPracticeRepository: Send + Sync {
    /// Every stored best practice
    async fn get_all(&self) -> AppResult<Vec<BestPractice>>;

    /// Best practices whose insight, models or output type mention `query`
    ///
    /// A blank query is equivalent to [`get_all`](Self::get_all).
    async fn search(&self, query: &str) -> AppResult<Vec<BestPractice>>;
}

/// Column names in the Notion database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionProperties {
    pub insight: String,
    pub models: String,
    pub output_type: String,
}

impl Default for NotionProperties {
    fn default() -> Self {
        Self {
            insight: "Insight 1".to_string(),
            models: "Model".to_string(),
            output_type: "Output type".to_string(),
        }
    }
}

/// Live repository querying `POST /databases/{id}/query`
#[derive(Clone)]
pub struct NotionRepository {
    http: reqwest::Client,
    api_url: String,
    api_version: String,
    token: String,
    database_id: String,
    properties: NotionProperties,
    retry: RetryPolicy,
}

impl NotionRepository {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str, database_id: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_version: "2022-06-28".to_string(),
            token: token.to_string(),
            database_id: database_id.to_string(),
            properties: NotionProperties::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(
        http: reqwest::Client,
        config: &NotionConfig,
        token: &str,
        database_id: &str,
    ) -> Self {
        Self::new(http, config.api_url(), token, database_id)
            .with_api_version(config.api_version())
            .with_properties(NotionProperties {
                insight: config.insight_property().to_string(),
                models: config.models_property().to_string(),
                output_type: config.output_type_property().to_string(),
            })
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn with_properties(mut self, properties: NotionProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `or` filter over the insight, models and output type columns
    fn search_filter(&self, query: &str) -> Value {
        json!({
            "or": [
                { "property": self.properties.insight, "title": { "contains": query } },
                { "property": self.properties.models, "rich_text": { "contains": query } },
                { "property": self.properties.output_type, "multi_select": { "contains": query } }
            ]
        })
    }

    /// Fetch every page matching `filter`, following pagination
    async fn query_pages(&self, filter: Option<Value>) -> AppResult<Vec<Value>> {
        let url = format!("{}/databases/{}/query", self.api_url, self.database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = Map::new();
            if let Some(filter) = &filter {
                body.insert("filter".to_string(), filter.clone());
            }
            if let Some(cursor) = &cursor {
                body.insert("start_cursor".to_string(), Value::String(cursor.clone()));
            }

            let response = retry_with_backoff(&self.retry, "notion_query", |_| {
                send_json(
                    self.http
                        .post(&url)
                        .bearer_auth(&self.token)
                        .header("Notion-Version", &self.api_version)
                        .json(&body),
                    Service::Notion,
                )
            })
            .await?;

            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| AppError::ResponseShape {
                    service: Service::Notion,
                    reason: "missing 'results' array".to_string(),
                })?;
            pages.extend(
                results
                    .iter()
                    .filter(|item| item.get("object").and_then(Value::as_str) == Some("page"))
                    .cloned(),
            );

            let has_more = response
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            cursor = response
                .get("next_cursor")
                .and_then(Value::as_str)
                .filter(|_| has_more)
                .map(str::to_owned);

            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(page_count = pages.len(), "Queried Notion database");
        Ok(pages)
    }

    fn map_pages(&self, pages: &[Value]) -> Vec<BestPractice> {
        pages
            .iter()
            .filter_map(|page| map_page(page, &self.properties))
            .collect()
    }
}

#[async_trait]
impl BestPracticeRepository for NotionRepository {
    async fn get_all(&self) -> AppResult<Vec<BestPractice>> {
        let pages = self.query_pages(None).await?;
        Ok(self.map_pages(&pages))
    }

    async fn search(&self, query: &str) -> AppResult<Vec<BestPractice>> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_all().await;
        }
        let pages = self.query_pages(Some(self.search_filter(query))).await?;
        Ok(self.map_pages(&pages))
    }
}

/// Convert one Notion page into a [`BestPractice`]
///
/// Pages without properties, or without a non-empty insight, are skipped.
pub fn map_page(page: &Value, properties: &NotionProperties) -> Option<BestPractice> {
    let page_id = page.get("id").and_then(Value::as_str).unwrap_or("<unknown>");

    let Some(props) = page.get("properties").and_then(Value::as_object) else {
        tracing::warn!(page_id, "Skipping partial Notion page without properties");
        return None;
    };

    let Some(insight_property) = props.get(&properties.insight) else {
        tracing::warn!(
            page_id,
            property = %properties.insight,
            "Skipping Notion page: insight property not found"
        );
        return None;
    };

    let insight = match property_type(insight_property) {
        Some(kind @ ("title" | "rich_text")) => plain_text(insight_property, kind),
        other => {
            tracing::warn!(
                page_id,
                property_type = ?other,
                "Skipping Notion page: insight must be title or rich_text"
            );
            return None;
        }
    };
    if insight.is_empty() {
        tracing::warn!(page_id, "Skipping Notion page: insight is empty");
        return None;
    }

    let relevant_models = props
        .get(&properties.models)
        .map(list_values)
        .unwrap_or_default();

    let output_types = props
        .get(&properties.output_type)
        .map(list_values)
        .unwrap_or_default()
        .iter()
        .filter_map(|value| OutputKind::parse(value))
        .collect();

    Some(BestPractice {
        insight,
        relevant_models,
        output_types,
    })
}

fn property_type(property: &Value) -> Option<&str> {
    property.get("type").and_then(Value::as_str)
}

/// Plain texts of a `title` / `rich_text` property, space-joined and trimmed
fn plain_text(property: &Value, kind: &str) -> String {
    property
        .get(kind)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Values of a `multi_select`, or a `rich_text` split on `;`, `,` and newlines
fn list_values(property: &Value) -> Vec<String> {
    match property_type(property) {
        Some("multi_select") => property
            .get("multi_select")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| option.get("name").and_then(Value::as_str))
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        Some("rich_text") => plain_text(property, "rich_text")
            .split([';', ',', '\n'])
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// Offline repository with two built-in insights
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBestPracticeRepository;

impl MockBestPracticeRepository {
    pub fn values() -> Vec<BestPractice> {
        vec![
            BestPractice {
                insight: "Midjourney v7 is the best at all types of images at the moment."
                    .to_string(),
                relevant_models: vec!["midjourney-v7".to_string()],
                output_types: vec![OutputKind::Image],
            },
            BestPractice {
                insight: "Midjourney v7 gives the best results when prompted in a JSON format \
                    like { \"subject\": \"tea pot\", \"lighting\": \"bright outdoor\", ... }"
                    .to_string(),
                relevant_models: vec!["midjourney-v7".to_string()],
                output_types: vec![OutputKind::Image],
            },
        ]
    }
}

#[async_trait]
impl BestPracticeRepository for MockBestPracticeRepository {
    async fn get_all(&self) -> AppResult<Vec<BestPractice>> {
        Ok(Self::values())
    }

    async fn search(&self, _query: &str) -> AppResult<Vec<BestPractice>> {
        Ok(Self::values())
    }
}
