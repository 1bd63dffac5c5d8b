//! Wait → respond → reply loop
//!
//! Mentions are handled one at a time in arrival order. Failures never end
//! the loop; only the shutdown signal does.

use crate::config::Config;
use crate::coral::mention::{Mention, Reply, parse_mentions};
use crate::coral::session::{MessagingSession, Responder};
use crate::shared::retry::{RetryPolicy, backoff_with_jitter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default time to block in `wait_for_mentions`, overridden by `coral.timeout_ms`
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Counters for one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub waits: u64,
    pub wait_failures: u64,
    pub mentions: u64,
    pub replies_sent: u64,
    pub responder_failures: u64,
    pub send_failures: u64,
}

pub struct MentionLoop {
    session: Arc<dyn MessagingSession>,
    responder: Arc<dyn Responder>,
    wait_timeout: Duration,
    retry: RetryPolicy,
}

impl MentionLoop {
    pub fn new(session: Arc<dyn MessagingSession>, responder: Arc<dyn Responder>) -> Self {
        Self {
            session,
            responder,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Loop using `coral.timeout_ms` for each wait and `[retry]` for backoff
    pub fn from_config(
        session: Arc<dyn MessagingSession>,
        responder: Arc<dyn Responder>,
        config: &Config,
    ) -> Self {
        Self::new(session, responder)
            .with_wait_timeout(Duration::from_millis(config.coral.timeout_ms()))
            .with_retry(RetryPolicy::from(&config.retry))
    }

    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Backoff applied after failed waits
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run until `shutdown` turns `true` or its sender is dropped
    ///
    /// Shutdown is checked before every wait and interrupts both an
    /// in-flight wait and a backoff sleep. A mention already being answered
    /// is finished first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> LoopStats {
        let mut stats = LoopStats::default();
        let mut consecutive_failures = 0usize;

        tracing::info!(
            wait_timeout_ms = self.wait_timeout.as_millis() as u64,
            "Mention loop started"
        );

        loop {
            let stop = *shutdown.borrow_and_update();
            if stop {
                break;
            }

            stats.waits += 1;
            let waited = tokio::select! {
                result = self.session.wait_for_mentions(self.wait_timeout) => result,
                _ = shutdown_requested(&mut shutdown) => break,
            };

            match waited {
                Ok(payload) => {
                    consecutive_failures = 0;
                    for mention in parse_mentions(&payload) {
                        stats.mentions += 1;
                        self.answer(&mention, &mut stats).await;
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    stats.wait_failures += 1;
                    let delay_ms = backoff_with_jitter(&self.retry, consecutive_failures);
                    tracing::warn!(
                        error = %e,
                        consecutive_failures,
                        delay_ms,
                        "Waiting for mentions failed, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                        _ = shutdown_requested(&mut shutdown) => break,
                    }
                }
            }
        }

        tracing::info!(
            waits = stats.waits,
            mentions = stats.mentions,
            replies_sent = stats.replies_sent,
            wait_failures = stats.wait_failures,
            responder_failures = stats.responder_failures,
            send_failures = stats.send_failures,
            "Mention loop stopped"
        );
        stats
    }

    async fn answer(&self, mention: &Mention, stats: &mut LoopStats) {
        tracing::info!(
            thread_id = %mention.thread_id,
            sender_id = %mention.sender_id,
            content_length = mention.content.len(),
            "Received mention"
        );

        let content = match self.responder.respond(&mention.content).await {
            Ok(answer) => answer,
            Err(e) => {
                stats.responder_failures += 1;
                tracing::warn!(
                    thread_id = %mention.thread_id,
                    error = %e,
                    "Responder failed, replying with error"
                );
                format!("error: {}", e)
            }
        };

        let reply = Reply::to(mention, content);
        match self.session.send_message(&reply).await {
            Ok(()) => stats.replies_sent += 1,
            Err(e) => {
                stats.send_failures += 1;
                tracing::error!(
                    thread_id = %reply.thread_id,
                    recipient_id = %reply.recipient_id,
                    error = %e,
                    "Failed to send reply"
                );
            }
        }
    }
}

/// Resolves once shutdown is requested or the sender goes away
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
