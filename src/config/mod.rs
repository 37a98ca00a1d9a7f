use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory uploaded files are written to and served from at `/uploads`
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Public base URL used when building absolute upload URLs (empty = relative URLs)
    #[serde(default)]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            public_url: String::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: default_admin_token(),
        }
    }
}

fn default_admin_token() -> String {
    // Generate a random token if not provided
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests per window for read endpoints
    #[serde(default = "default_api_requests")]
    pub api_requests_per_window: u32,
    /// Requests per window for order and contact submissions
    #[serde(default = "default_form_requests")]
    pub form_requests_per_window: u32,
    /// Requests per window for the chat proxy
    #[serde(default = "default_chat_requests")]
    pub chat_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps of expired entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_requests_per_window: default_api_requests(),
            form_requests_per_window: default_form_requests(),
            chat_requests_per_window: default_chat_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_requests() -> u32 {
    300
}

fn default_form_requests() -> u32 {
    10
}

fn default_chat_requests() -> u32 {
    30
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default: 20MB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    /// Lowercase file extensions accepted by `/api/upload`
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "svg", "avif", "mp4", "webm", "pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Chat-completion endpoint the `/api/chat` proxy forwards to. Chat is disabled when unset.
    pub upstream_url: Option<String>,
    /// Sent as `x-goog-api-key` when set
    pub api_key: Option<String>,
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
    /// Instruction prepended to every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Oldest turns are dropped beyond this many history entries
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            upstream_url: None,
            api_key: None,
            timeout_secs: default_chat_timeout(),
            system_prompt: default_system_prompt(),
            max_history: default_max_history(),
        }
    }
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "You are the assistant of a creative agency. Answer questions about the agency's \
     services, projects and pricing briefly and politely."
        .to_string()
}

fn default_max_history() -> usize {
    20
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics at `/metrics`
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            uploads: UploadConfig::default(),
            chat: ChatConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert!(config.rate_limit.enabled);
        assert!(config.chat.upstream_url.is_none());
        assert!(config.uploads.allowed_extensions.contains(&"png".to_string()));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [server]
            port = 3000

            [chat]
            upstream_url = "http://localhost:9000/chat"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chat.upstream_url.as_deref(), Some("http://localhost:9000/chat"));
        assert_eq!(config.chat.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[server\nport = ").is_err());
    }
}
