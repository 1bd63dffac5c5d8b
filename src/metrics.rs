//! Prometheus metrics collection for Liora
//!
//! Tracks:
//! - Endpoint resolutions by catalog and match kind
//! - Tool invocations by tool and outcome
//! - Upstream failures by service
//! - Generation latency
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::config::Service;
use crate::resolver::{CatalogKind, MatchKind, Resolution};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Tool outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    Ok,
    Error,
}

impl ToolOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOutcome::Ok => "ok",
            ToolOutcome::Error => "error",
        }
    }
}

/// Metrics collector for Liora
///
/// Cloning is cheap; all clones share one registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    resolutions_total: IntCounterVec,
    tool_invocations: IntCounterVec,
    upstream_failures: IntCounterVec,
    generation_duration: Histogram,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a fresh Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 3 catalogs × 3 match kinds
        let resolutions_total = IntCounterVec::new(
            Opts::new(
                "liora_resolutions_total",
                "Total endpoint resolutions by catalog and match kind",
            ),
            &["catalog", "match_kind"],
        )?;

        // Tool names come from the registry, so cardinality is bounded
        let tool_invocations = IntCounterVec::new(
            Opts::new(
                "liora_tool_invocations_total",
                "Total tool invocations by tool and outcome",
            ),
            &["tool", "outcome"],
        )?;

        let upstream_failures = IntCounterVec::new(
            Opts::new(
                "liora_upstream_failures_total",
                "Total failed calls to upstream collaborators by service",
            ),
            &["service"],
        )?;

        let generation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "liora_generation_duration_ms",
                "End-to-end generation latency in milliseconds",
            )
            .buckets(vec![
                100.0, 500.0, 1_000.0, 5_000.0, 10_000.0, 30_000.0, 60_000.0, 120_000.0, 300_000.0,
            ]),
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "liora_metrics_recording_failures_total",
                "Total metrics recording failures by operation. \
                Indicates Prometheus internal errors.",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(resolutions_total.clone()))?;
        registry.register(Box::new(tool_invocations.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;
        registry.register(Box::new(generation_duration.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            resolutions_total,
            tool_invocations,
            upstream_failures,
            generation_duration,
            metrics_recording_failures,
        })
    }

    /// Record one endpoint resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the label set is rejected by the registry.
    pub fn record_resolution(&self, resolution: &Resolution) -> Result<(), prometheus::Error> {
        self.resolutions_total
            .get_metric_with_label_values(&[
                resolution.catalog.as_str(),
                resolution.match_kind.as_str(),
            ])?
            .inc();
        Ok(())
    }

    /// Current resolution count for one label pair
    pub fn resolution_count(&self, catalog: CatalogKind, match_kind: MatchKind) -> u64 {
        self.resolutions_total
            .with_label_values(&[catalog.as_str(), match_kind.as_str()])
            .get()
    }

    /// Record one tool execution
    ///
    /// # Errors
    ///
    /// Returns an error if the label set is rejected by the registry.
    pub fn record_tool_invocation(
        &self,
        tool: &'static str,
        outcome: ToolOutcome,
    ) -> Result<(), prometheus::Error> {
        self.tool_invocations
            .get_metric_with_label_values(&[tool, outcome.as_str()])?
            .inc();
        Ok(())
    }

    pub fn tool_invocation_count(&self, tool: &'static str, outcome: ToolOutcome) -> u64 {
        self.tool_invocations
            .with_label_values(&[tool, outcome.as_str()])
            .get()
    }

    /// Count a failed upstream call
    pub fn upstream_failure(&self, service: Service) {
        self.upstream_failures
            .with_label_values(&[service.as_str()])
            .inc();
    }

    pub fn upstream_failure_count(&self, service: Service) -> u64 {
        self.upstream_failures
            .with_label_values(&[service.as_str()])
            .get()
    }

    /// Record generation latency
    ///
    /// # Errors
    ///
    /// Rejects NaN, infinite and negative durations; they would corrupt the
    /// histogram's sum.
    pub fn record_generation_duration(&self, duration_ms: f64) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite, got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.generation_duration.observe(duration_ms);
        Ok(())
    }

    /// Number of generation durations observed so far
    pub fn generation_sample_count(&self) -> u64 {
        self.generation_duration.get_sample_count()
    }

    /// Record a metrics recording failure
    ///
    /// `operation` is one of `record_resolution`, `record_tool_invocation`,
    /// `record_generation_duration`.
    pub fn metrics_recording_failure(&self, operation: &'static str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn metrics_recording_failures_count(&self, operation: &'static str) -> u64 {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .get()
    }

    /// Encode all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}

/// Record a resolution, degrading to the failure counter on error
pub fn observe_resolution(metrics: &Metrics, resolution: &Resolution) {
    if let Err(e) = metrics.record_resolution(resolution) {
        metrics.metrics_recording_failure("record_resolution");
        tracing::error!(
            error = %e,
            catalog = %resolution.catalog,
            match_kind = resolution.match_kind.as_str(),
            "Metrics recording failed. Observability degraded but request continues."
        );
    }
}
