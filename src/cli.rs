//! Command-line interface for Liora
//!
//! Provides argument parsing and subcommand handling for the Liora binary.

use crate::resolver::OutputType;
use clap::{Parser, Subcommand, ValueEnum};

/// Model-name resolution and generation tooling for fal.ai
#[derive(Parser)]
#[command(name = "liora")]
#[command(version)]
#[command(about = "Model-name resolution and generation tooling for fal.ai")]
#[command(
    long_about = "Liora maps free-form model names like 'nano banana' or 'kling' to exact \
    fal.ai endpoints, looks up generation best practices, and runs image and video \
    generations for Coral agents."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the fal.ai endpoint a model name resolves to
    Resolve {
        /// Free-form model name, e.g. "nano banana"
        model: String,

        #[arg(long, value_enum, default_value_t = OutputArg::Image)]
        output: OutputArg,

        /// Resolve as if a source image were supplied
        #[arg(long)]
        with_image: bool,
    },

    /// Print the endpoint catalogs
    Catalog,

    /// Query the best-practice repository and print JSON
    BestPractices {
        /// Keyword filter; all best practices when omitted
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Run one generation through `genai-execute` and print JSON
    Generate {
        #[arg(long)]
        model: String,

        #[arg(long)]
        prompt: String,

        #[arg(long, value_enum, default_value_t = OutputArg::Image)]
        output: OutputArg,

        /// Source image for image-to-image or image-to-video
        #[arg(long)]
        image_url: Option<String>,
    },
}

/// `--output` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Image,
    Video,
}

impl From<OutputArg> for OutputType {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Image => OutputType::Image,
            OutputArg::Video => OutputType::Video,
        }
    }
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Liora Configuration
# ====================
#
# This file configures the HTTP server, the upstream collaborators (fal.ai,
# Notion, Coral payments), the Coral agent identity and observability.
#
# Secrets are never read from this file. Set them in the environment:
#
#   FAL_KEY                        fal.ai API key
#   NOTION_API_TOKEN               Notion integration token
#   NOTION_BEST_PRACTICES_DB_ID    Notion database holding best practices
#   CORAL_API_URL                  Coral server base URL (payments)
#   CORAL_SESSION_ID               Coral session to claim payments against
#   CORAL_SSE_URL                  Coral SSE endpoint for the agent
#
# CORAL_AGENT_ID, TIMEOUT_MS and OFFLINE override the matching settings below.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Timeout for upstream HTTP requests in seconds (1-300)
request_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# SERVICES
# ─────────────────────────────────────────────────────────────────────────────

[services]
# Use mock collaborators for everything; no credentials are required
offline = false

# ─────────────────────────────────────────────────────────────────────────────
# FAL.AI
# ─────────────────────────────────────────────────────────────────────────────

[fal]
queue_url = "https://queue.fal.run"

# Status polling: interval between polls and how many polls before giving up
poll_interval_ms = 1000
max_poll_attempts = 300

# ─────────────────────────────────────────────────────────────────────────────
# NOTION (best practices)
# ─────────────────────────────────────────────────────────────────────────────

[notion]
api_url = "https://api.notion.com/v1"
api_version = "2022-06-28"

# Database property names
insight_property = "Insight 1"
models_property = "Model"
output_type_property = "Output type"

# Serve built-in best practices instead of querying Notion
use_mock = false

# ─────────────────────────────────────────────────────────────────────────────
# PAYMENT (Coral)
# ─────────────────────────────────────────────────────────────────────────────

[payment]
# Claim `claim_amount` coral before every genai-execute generation
enabled = false
claim_amount = 1.0

# ─────────────────────────────────────────────────────────────────────────────
# CORAL AGENT
# ─────────────────────────────────────────────────────────────────────────────

[coral]
agent_id = "liora-generator-coral-agent"
agent_description = "Liora: generates images or videos end-to-end using best practices & execution"

# How long to wait for mentions per call, in milliseconds
timeout_ms = 3000

# ─────────────────────────────────────────────────────────────────────────────
# RETRIES
# ─────────────────────────────────────────────────────────────────────────────

[retry]
# Attempts for retryable upstream failures (transport errors, 5xx, 429)
max_retries = 3

# Base backoff; doubles per attempt, capped at 30 seconds
retry_backoff_ms = 100

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
