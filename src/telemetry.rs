//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(level: &str) -> String {
    format!("liora={},tower_http=debug", level)
}

/// Initialize the tracing subscriber
///
/// Only the first call per process has any effect. `RUST_LOG` wins over
/// `default_level` when set.
///
/// # Examples
///
/// ```no_run
/// liora::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_crate_and_http_layer() {
        assert_eq!(default_directive("warn"), "liora=warn,tower_http=debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init("info");
        init("debug");
    }
}
