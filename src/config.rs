//! Configuration management for Liora
//!
//! Settings come from a TOML file; secrets come from the environment and are
//! never read from the file. Both are validated once at startup.

use crate::coral::{AGENT_DESCRIPTION, DEFAULT_AGENT_ID};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub fal: FalConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub coral: CoralConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    /// Address to bind; `host` must be an IP literal
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip = self.host.trim().parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host must be an IP address such as '127.0.0.1' or '0.0.0.0', got '{}'",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Collaborator selection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServicesConfig {
    /// Use mock collaborators everywhere; no credentials required
    #[serde(default)]
    offline: bool,
}

impl ServicesConfig {
    pub fn offline(&self) -> bool {
        self.offline
    }
}

/// fal.ai queue settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FalConfig {
    #[serde(default = "default_fal_queue_url")]
    queue_url: String,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    max_poll_attempts: u32,
}

impl FalConfig {
    /// Base URL of the fal queue API (no trailing slash)
    pub fn queue_url(&self) -> &str {
        self.queue_url.trim_end_matches('/')
    }

    /// Delay between job status polls
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Number of status polls before giving up on a job
    pub fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts
    }
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            queue_url: default_fal_queue_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

fn default_fal_queue_url() -> String {
    "https://queue.fal.run".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    300
}

/// Notion best-practice database settings
///
/// Property names must match the column names in the Notion database.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_api_url")]
    api_url: String,
    #[serde(default = "default_notion_api_version")]
    api_version: String,
    #[serde(default = "default_insight_property")]
    insight_property: String,
    #[serde(default = "default_models_property")]
    models_property: String,
    #[serde(default = "default_output_type_property")]
    output_type_property: String,
    /// Serve the built-in best practices instead of querying Notion
    #[serde(default)]
    use_mock: bool,
}

impl NotionConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Value sent in the `Notion-Version` header
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn insight_property(&self) -> &str {
        &self.insight_property
    }

    pub fn models_property(&self) -> &str {
        &self.models_property
    }

    pub fn output_type_property(&self) -> &str {
        &self.output_type_property
    }

    pub fn use_mock(&self) -> bool {
        self.use_mock
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: default_notion_api_url(),
            api_version: default_notion_api_version(),
            insight_property: default_insight_property(),
            models_property: default_models_property(),
            output_type_property: default_output_type_property(),
            use_mock: false,
        }
    }
}

fn default_notion_api_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_insight_property() -> String {
    "Insight 1".to_string()
}

fn default_models_property() -> String {
    "Model".to_string()
}

fn default_output_type_property() -> String {
    "Output type".to_string()
}

/// Coral payment settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_claim_amount")]
    claim_amount: f64,
}

impl PaymentConfig {
    /// Whether generations claim budget before running
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Coral amount claimed per generation
    pub fn claim_amount(&self) -> f64 {
        self.claim_amount
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            claim_amount: default_claim_amount(),
        }
    }
}

fn default_claim_amount() -> f64 {
    1.0
}

/// Coral agent identity and transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoralConfig {
    #[serde(default = "default_agent_id")]
    agent_id: String,
    #[serde(default = "default_agent_description")]
    agent_description: String,
    #[serde(default = "default_coral_timeout_ms")]
    timeout_ms: u64,
}

impl CoralConfig {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent_description(&self) -> &str {
        &self.agent_description
    }

    /// How long one `wait_for_mentions` call may block
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

impl Default for CoralConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            agent_description: default_agent_description(),
            timeout_ms: default_coral_timeout_ms(),
        }
    }
}

fn default_agent_id() -> String {
    DEFAULT_AGENT_ID.to_string()
}

fn default_agent_description() -> String {
    AGENT_DESCRIPTION.to_string()
}

fn default_coral_timeout_ms() -> u64 {
    3000
}

/// Retry settings shared by upstream clients and the mention loop
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    max_retries: usize,
    #[serde(default = "default_retry_backoff_ms")]
    retry_backoff_ms: u64,
}

impl RetryConfig {
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_ms
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_retries() -> usize {
    crate::shared::retry::DEFAULT_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    crate::shared::retry::DEFAULT_RETRY_BACKOFF_MS
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// - [`AppError::ConfigFileRead`] if the file cannot be read
    /// - [`AppError::ConfigParseFailed`] if it is not valid TOML for [`Config`]
    /// - [`AppError::ConfigValidationFailed`] if a value is out of range
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        // Phase 2: Parse TOML
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Apply `CORAL_AGENT_ID`, `TIMEOUT_MS` and `OFFLINE` overrides
    ///
    /// `lookup` is normally `|name| std::env::var(name).ok()`. The result is
    /// re-validated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if an override cannot be parsed or leaves
    /// the configuration invalid.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(agent_id) = lookup("CORAL_AGENT_ID").filter(|v| !v.trim().is_empty()) {
            tracing::debug!(agent_id = %agent_id, "CORAL_AGENT_ID overrides coral.agent_id");
            self.coral.agent_id = agent_id.trim().to_string();
        }

        if let Some(raw) = lookup("TIMEOUT_MS").filter(|v| !v.trim().is_empty()) {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("TIMEOUT_MS must be an integer, got '{}': {}", raw, e))
            })?;
            tracing::debug!(timeout_ms, "TIMEOUT_MS overrides coral.timeout_ms");
            self.coral.timeout_ms = timeout_ms;
        }

        if let Some(raw) = lookup("OFFLINE") {
            self.services.offline = parse_flag(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "OFFLINE must be one of 1, 0, true, false; got '{}'",
                    raw
                ))
            })?;
            tracing::debug!(
                offline = self.services.offline,
                "OFFLINE overrides services.offline"
            );
        }

        self.validate()
    }

    /// Services whose credentials this configuration needs
    ///
    /// Offline mode needs none. Otherwise fal.ai is always live, Notion is
    /// live unless mocked, and payment only when enabled.
    pub fn required_services(&self) -> Vec<Service> {
        if self.services.offline() {
            return Vec::new();
        }

        let mut services = vec![Service::Fal];
        if !self.notion.use_mock() {
            services.push(Service::Notion);
        }
        if self.payment.enabled() {
            services.push(Service::Payment);
        }
        services
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when
    /// building a `Config` by other means.
    pub fn validate(&self) -> AppResult<()> {
        self.server.socket_addr()?;

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > 300 {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds cannot exceed 300 seconds (5 minutes), got {}",
                self.server.request_timeout_seconds
            )));
        }

        for (field, url) in [
            ("fal.queue_url", self.fal.queue_url.as_str()),
            ("notion.api_url", self.notion.api_url.as_str()),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must start with 'http://' or 'https://', got '{}'",
                    field, url
                )));
            }
        }

        if self.fal.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "fal.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.fal.max_poll_attempts == 0 {
            return Err(AppError::Config(
                "fal.max_poll_attempts must be greater than 0".to_string(),
            ));
        }

        for (field, value) in [
            ("notion.api_version", &self.notion.api_version),
            ("notion.insight_property", &self.notion.insight_property),
            ("notion.models_property", &self.notion.models_property),
            ("notion.output_type_property", &self.notion.output_type_property),
            ("coral.agent_id", &self.coral.agent_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} must not be empty", field)));
            }
        }

        if !self.payment.claim_amount.is_finite() || self.payment.claim_amount <= 0.0 {
            return Err(AppError::Config(format!(
                "payment.claim_amount must be a positive finite number, got {}",
                self.payment.claim_amount
            )));
        }

        if self.coral.timeout_ms == 0 {
            return Err(AppError::Config(
                "coral.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_retries == 0 {
            return Err(AppError::Config(
                "retry.max_retries must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

/// An upstream collaborator that needs credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Fal,
    Notion,
    Payment,
    Coral,
}

impl Service {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Fal => "fal",
            Service::Notion => "notion",
            Service::Payment => "payment",
            Service::Coral => "coral",
        }
    }

    /// Environment variables this service cannot run without
    pub fn required_env(&self) -> &'static [&'static str] {
        match self {
            Service::Fal => &["FAL_KEY"],
            Service::Notion => &["NOTION_API_TOKEN", "NOTION_BEST_PRACTICES_DB_ID"],
            Service::Payment => &["CORAL_API_URL", "CORAL_SESSION_ID"],
            Service::Coral => &["CORAL_SSE_URL"],
        }
    }

    pub(crate) fn request_error_tag(&self) -> &'static str {
        match self {
            Service::Fal => "FalRequestError",
            Service::Notion => "NotionQueryError",
            Service::Payment => "PaymentClaimRequestError",
            Service::Coral => "CoralRequestError",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secrets read from the environment
///
/// Blank values and unreplaced placeholders (anything containing `TODO`)
/// are treated as absent. `Debug` never prints the values.
#[derive(Clone, Default)]
pub struct Credentials {
    fal_key: Option<String>,
    notion_api_token: Option<String>,
    notion_database_id: Option<String>,
    coral_api_url: Option<String>,
    coral_session_id: Option<String>,
    coral_sse_url: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).and_then(usable);
        Self {
            fal_key: read("FAL_KEY"),
            notion_api_token: read("NOTION_API_TOKEN"),
            notion_database_id: read("NOTION_BEST_PRACTICES_DB_ID"),
            coral_api_url: read("CORAL_API_URL"),
            coral_session_id: read("CORAL_SESSION_ID"),
            coral_sse_url: read("CORAL_SSE_URL"),
        }
    }

    /// Check that every credential the given services need is present
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingConfig`] naming every absent variable, not
    /// just the first.
    pub fn validate(&self, services: &[Service]) -> AppResult<()> {
        let mut missing: Vec<String> = Vec::new();
        for service in services {
            for name in service.required_env() {
                if self.get(name).is_none() && !missing.iter().any(|m| m == name) {
                    missing.push((*name).to_string());
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingConfig { missing })
        }
    }

    /// Fetch one credential, failing with [`AppError::MissingConfig`]
    pub fn require(&self, name: &str) -> AppResult<&str> {
        self.get(name).ok_or_else(|| AppError::MissingConfig {
            missing: vec![name.to_string()],
        })
    }

    fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "FAL_KEY" => &self.fal_key,
            "NOTION_API_TOKEN" => &self.notion_api_token,
            "NOTION_BEST_PRACTICES_DB_ID" => &self.notion_database_id,
            "CORAL_API_URL" => &self.coral_api_url,
            "CORAL_SESSION_ID" => &self.coral_session_id,
            "CORAL_SSE_URL" => &self.coral_sse_url,
            _ => &None,
        };
        value.as_deref()
    }

    pub fn fal_key(&self) -> Option<&str> {
        self.fal_key.as_deref()
    }

    pub fn notion_api_token(&self) -> Option<&str> {
        self.notion_api_token.as_deref()
    }

    pub fn notion_database_id(&self) -> Option<&str> {
        self.notion_database_id.as_deref()
    }

    pub fn coral_api_url(&self) -> Option<&str> {
        self.coral_api_url.as_deref()
    }

    pub fn coral_session_id(&self) -> Option<&str> {
        self.coral_session_id.as_deref()
    }

    pub fn coral_sse_url(&self) -> Option<&str> {
        self.coral_sse_url.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("fal_key", &mark(&self.fal_key))
            .field("notion_api_token", &mark(&self.notion_api_token))
            .field("notion_database_id", &mark(&self.notion_database_id))
            .field("coral_api_url", &mark(&self.coral_api_url))
            .field("coral_session_id", &mark(&self.coral_session_id))
            .field("coral_sse_url", &mark(&self.coral_sse_url))
            .finish()
    }
}

fn usable(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains("TODO") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
request_timeout_seconds = 30

[services]
offline = false

[fal]
queue_url = "https://queue.fal.run/"
poll_interval_ms = 500
max_poll_attempts = 120

[notion]
insight_property = "Insight"
use_mock = true

[payment]
enabled = true
claim_amount = 2.5

[coral]
agent_id = "liora-test"
timeout_ms = 1500

[retry]
max_retries = 4
retry_backoff_ms = 50

[observability]
log_level = "debug"
"#;

    const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.fal.queue_url(), "https://queue.fal.run");
        assert_eq!(config.fal.poll_interval_ms(), 500);
        assert_eq!(config.fal.max_poll_attempts(), 120);
        assert_eq!(config.notion.insight_property(), "Insight");
        assert_eq!(config.notion.models_property(), "Model");
        assert!(config.notion.use_mock());
        assert!(config.payment.enabled());
        assert_eq!(config.payment.claim_amount(), 2.5);
        assert_eq!(config.coral.agent_id(), "liora-test");
        assert_eq!(config.coral.timeout_ms(), 1500);
        assert_eq!(config.retry.max_retries(), 4);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert!(!config.services.offline());
        assert_eq!(config.fal.queue_url(), "https://queue.fal.run");
        assert_eq!(config.notion.api_url(), "https://api.notion.com/v1");
        assert_eq!(config.notion.insight_property(), "Insight 1");
        assert_eq!(config.notion.output_type_property(), "Output type");
        assert!(!config.payment.enabled());
        assert_eq!(config.coral.agent_id(), "liora-generator-coral-agent");
        assert_eq!(config.coral.timeout_ms(), 3000);
        assert_eq!(config.retry.max_retries(), 3);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_config_validation_zero_timeout_fails() {
        let toml = MINIMAL_CONFIG.replace("port = 8080", "port = 8080\nrequest_timeout_seconds = 0");
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("request_timeout_seconds"));
    }

    #[test]
    fn test_config_validation_excessive_timeout_fails() {
        let toml =
            MINIMAL_CONFIG.replace("port = 8080", "port = 8080\nrequest_timeout_seconds = 301");
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_config_validation_rejects_hostname() {
        for host in ["localhost", "example.com", ""] {
            let toml = MINIMAL_CONFIG.replace("127.0.0.1", host);
            let err = Config::from_str(&toml).unwrap_err();
            assert!(
                err.to_string().contains("server.host"),
                "host {:?} should be rejected, got {}",
                host,
                err
            );
        }
    }

    #[test]
    fn test_socket_addr_uses_host_and_port() {
        let config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );

        let ipv6 = Config::from_str(&MINIMAL_CONFIG.replace("127.0.0.1", "::1")).unwrap();
        assert_eq!(ipv6.server.socket_addr().unwrap().to_string(), "[::1]:8080");
    }

    #[test]
    fn test_config_validation_rejects_bad_url_scheme() {
        let toml = format!("{}\n[fal]\nqueue_url = \"queue.fal.run\"\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("fal.queue_url"));
    }

    #[test]
    fn test_config_validation_rejects_non_positive_claim() {
        for amount in ["0.0", "-1.0", "nan", "inf"] {
            let toml = format!(
                "{}\n[payment]\nenabled = true\nclaim_amount = {}\n",
                MINIMAL_CONFIG, amount
            );
            assert!(
                Config::from_str(&toml).is_err(),
                "claim_amount = {} should be rejected",
                amount
            );
        }
    }

    #[test]
    fn test_config_validation_rejects_zero_retries() {
        let toml = format!("{}\n[retry]\nmax_retries = 0\n", MINIMAL_CONFIG);
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_config_validation_rejects_zero_poll_values() {
        let interval = format!("{}\n[fal]\npoll_interval_ms = 0\n", MINIMAL_CONFIG);
        assert!(Config::from_str(&interval).is_err());
        let attempts = format!("{}\n[fal]\nmax_poll_attempts = 0\n", MINIMAL_CONFIG);
        assert!(Config::from_str(&attempts).is_err());
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = Config::from_str(MINIMAL_CONFIG).unwrap();
        config
            .apply_env_overrides(env(&[
                ("CORAL_AGENT_ID", "custom-agent"),
                ("TIMEOUT_MS", "9000"),
                ("OFFLINE", "true"),
            ]))
            .expect("overrides should apply");
        assert_eq!(config.coral.agent_id(), "custom-agent");
        assert_eq!(config.coral.timeout_ms(), 9000);
        assert!(config.services.offline());
    }

    #[test]
    fn test_env_overrides_reject_garbage() {
        let mut config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert!(
            config
                .apply_env_overrides(env(&[("TIMEOUT_MS", "soon")]))
                .is_err()
        );

        let mut config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert!(
            config
                .apply_env_overrides(env(&[("OFFLINE", "maybe")]))
                .is_err()
        );

        let mut config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert!(
            config
                .apply_env_overrides(env(&[("TIMEOUT_MS", "0")]))
                .is_err(),
            "zero timeout must fail re-validation"
        );
    }

    #[test]
    fn test_required_services() {
        let config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(
            config.required_services(),
            vec![Service::Fal, Service::Notion]
        );

        let config = Config::from_str(TEST_CONFIG).unwrap();
        assert_eq!(
            config.required_services(),
            vec![Service::Fal, Service::Payment]
        );

        let mut offline = Config::from_str(TEST_CONFIG).unwrap();
        offline.apply_env_overrides(env(&[("OFFLINE", "1")])).unwrap();
        assert!(offline.required_services().is_empty());
    }

    #[test]
    fn test_credentials_report_all_missing_at_once() {
        let credentials = Credentials::from_lookup(env(&[("FAL_KEY", "abc")]));
        let err = credentials
            .validate(&[Service::Fal, Service::Notion, Service::Payment])
            .unwrap_err();
        match err {
            AppError::MissingConfig { missing } => assert_eq!(
                missing,
                vec![
                    "NOTION_API_TOKEN",
                    "NOTION_BEST_PRACTICES_DB_ID",
                    "CORAL_API_URL",
                    "CORAL_SESSION_ID"
                ]
            ),
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_credentials_treat_placeholders_as_missing() {
        let credentials = Credentials::from_lookup(env(&[
            ("FAL_KEY", "TODO_FAL_KEY"),
            ("NOTION_API_TOKEN", "   "),
            ("NOTION_BEST_PRACTICES_DB_ID", "db-123"),
        ]));
        assert!(credentials.fal_key().is_none());
        assert!(credentials.notion_api_token().is_none());
        assert_eq!(credentials.notion_database_id(), Some("db-123"));

        let err = credentials
            .validate(&[Service::Fal, Service::Notion])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing config: FAL_KEY, NOTION_API_TOKEN"
        );
    }

    #[test]
    fn test_credentials_validate_only_requested_services() {
        let credentials = Credentials::from_lookup(env(&[]));
        assert!(credentials.validate(&[]).is_ok());
        assert!(credentials.require("FAL_KEY").is_err());
    }

    #[test]
    fn test_credentials_debug_hides_values() {
        let credentials = Credentials::from_lookup(env(&[("FAL_KEY", "super-secret")]));
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<set>"));
    }
}
