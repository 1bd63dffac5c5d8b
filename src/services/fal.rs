//! fal.ai generation backend
//!
//! The live client speaks fal's queue protocol: submit, poll status until
//! `COMPLETED`, then fetch the result.

use crate::config::Service;
use crate::error::{AppError, AppResult};
use crate::services::{required_str, send_json};
use crate::shared::retry::{RetryPolicy, retry_with_backoff};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Request id returned by the mock backend
pub const MOCK_REQUEST_ID: &str = "mock-request-id";

/// Outcome of one generation job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub request_id: String,
    pub data: Value,
}

/// Runs a generation job on a concrete endpoint
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run `endpoint` with `input` and wait for the result
    async fn generate(&self, endpoint: &str, input: Map<String, Value>)
    -> AppResult<GenerationResult>;
}

/// Queue status values reported by fal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStatus {
    InQueue,
    InProgress,
    Completed,
}

impl JobStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "IN_QUEUE" => Some(Self::InQueue),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Live fal.ai client
#[derive(Clone)]
pub struct FalClient {
    http: reqwest::Client,
    queue_url: String,
    api_key: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    retry: RetryPolicy,
}

impl FalClient {
    pub fn new(http: reqwest::Client, queue_url: &str, api_key: &str) -> Self {
        Self {
            http,
            queue_url: queue_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 300,
            retry: RetryPolicy::default(),
        }
    }

    /// Status poll cadence and budget
    pub fn with_polling(mut self, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_poll_attempts = max_poll_attempts.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn authorization(&self) -> String {
        format!("Key {}", self.api_key)
    }

    async fn get_json(&self, url: &str) -> AppResult<Value> {
        retry_with_backoff(&self.retry, "fal_get", |_| {
            send_json(
                self.http
                    .get(url)
                    .header(reqwest::header::AUTHORIZATION, self.authorization()),
                Service::Fal,
            )
        })
        .await
    }

    async fn submit(&self, endpoint: &str, input: &Map<String, Value>) -> AppResult<SubmittedJob> {
        let url = format!("{}/{}", self.queue_url, endpoint.trim_start_matches('/'));
        let body = retry_with_backoff(&self.retry, "fal_submit", |_| {
            send_json(
                self.http
                    .post(&url)
                    .header(reqwest::header::AUTHORIZATION, self.authorization())
                    .json(input),
                Service::Fal,
            )
        })
        .await?;

        let request_id = required_str(&body, "request_id", Service::Fal)?;
        let status_url = body
            .get("status_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{}/requests/{}/status", url, request_id));
        let response_url = body
            .get("response_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{}/requests/{}", url, request_id));

        Ok(SubmittedJob {
            request_id,
            status_url,
            response_url,
        })
    }

    async fn wait_for_completion(&self, job: &SubmittedJob) -> AppResult<()> {
        for attempt in 1..=self.max_poll_attempts {
            let body = self.get_json(&job.status_url).await?;
            let raw = required_str(&body, "status", Service::Fal)?;

            match JobStatus::parse(&raw) {
                Some(JobStatus::Completed) => {
                    tracing::debug!(
                        request_id = %job.request_id,
                        attempt,
                        "fal job completed"
                    );
                    return Ok(());
                }
                Some(status) => {
                    tracing::trace!(
                        request_id = %job.request_id,
                        attempt,
                        status = ?status,
                        "fal job still running"
                    );
                }
                None => {
                    return Err(AppError::ResponseShape {
                        service: Service::Fal,
                        reason: format!("unexpected job status '{}'", raw),
                    });
                }
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        let waited_ms = self
            .poll_interval
            .as_millis()
            .saturating_mul(u128::from(self.max_poll_attempts));
        Err(AppError::Timeout {
            service: Service::Fal,
            waited_ms: u64::try_from(waited_ms).unwrap_or(u64::MAX),
        })
    }
}

struct SubmittedJob {
    request_id: String,
    status_url: String,
    response_url: String,
}

#[async_trait]
impl GenerationBackend for FalClient {
    async fn generate(
        &self,
        endpoint: &str,
        input: Map<String, Value>,
    ) -> AppResult<GenerationResult> {
        tracing::info!(endpoint = %endpoint, "Submitting fal.ai job");

        let job = self.submit(endpoint, &input).await?;
        tracing::debug!(
            endpoint = %endpoint,
            request_id = %job.request_id,
            "fal.ai job queued"
        );

        self.wait_for_completion(&job).await?;
        let data = self.get_json(&job.response_url).await?;

        tracing::info!(
            endpoint = %endpoint,
            request_id = %job.request_id,
            "fal.ai job finished"
        );

        Ok(GenerationResult {
            request_id: job.request_id,
            data,
        })
    }
}

/// Offline backend returning placeholder assets
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerationBackend;

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(
        &self,
        endpoint: &str,
        input: Map<String, Value>,
    ) -> AppResult<GenerationResult> {
        tracing::debug!(endpoint = %endpoint, "Mock generation");
        Ok(GenerationResult {
            request_id: MOCK_REQUEST_ID.to_string(),
            data: json!({
                "model": endpoint,
                "input": input,
                "mockedAssets": [
                    { "kind": "image", "url": "https://placekitten.com/1024/768" },
                    {
                        "kind": "video",
                        "url": "https://sample-videos.com/video123/mp4/720/big_buck_bunny_720p_1mb.mp4"
                    }
                ]
            }),
        })
    }
}
