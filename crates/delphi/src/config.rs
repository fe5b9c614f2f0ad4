//! Configuration for the research service

use crate::error::{DelphiError, Result};
use delphi_utils::{env_or, env_parse, env_var};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "mistral-small-latest";
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Configuration for the research service
///
/// Credentials are optional: a missing key disables the matching component,
/// which then answers with empty results instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelphiConfig {
    /// Mistral API key (researcher and analyst)
    #[serde(skip_serializing)]
    pub mistral_api_key: Option<String>,

    /// NewsAPI key (news tool)
    #[serde(skip_serializing)]
    pub news_api_key: Option<String>,

    /// Alpha Vantage key (company overview tool and price history)
    #[serde(skip_serializing)]
    pub alpha_vantage_api_key: Option<String>,

    /// Chat model used by both agents
    pub model: String,

    /// Base URL of the chat-completions API
    pub mistral_api_base: String,

    /// NewsAPI `everything` endpoint
    pub news_api_base_url: String,

    /// Alpha Vantage query endpoint
    pub alpha_vantage_base_url: String,

    /// Time-to-live of memoized provider responses
    pub cache_ttl: Duration,

    /// Maximum number of memoized provider responses
    pub cache_max_entries: usize,

    /// Articles requested per news query
    pub news_page_size: u32,

    /// Timeout applied to data-provider requests
    pub request_timeout: Duration,

    /// How long a task record is kept after its last update
    pub task_ttl: Duration,

    /// Maximum number of task records kept
    pub task_max_entries: usize,

    /// Maximum tokens for model completions
    pub max_tokens: usize,

    /// Sampling temperature for model completions
    pub temperature: f32,

    /// Interface the API binds to
    pub host: String,

    /// Port the API binds to
    pub port: u16,
}

impl Default for DelphiConfig {
    fn default() -> Self {
        Self {
            mistral_api_key: None,
            news_api_key: None,
            alpha_vantage_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            mistral_api_base: delphi_llm::providers::mistral::DEFAULT_MISTRAL_API_BASE.to_string(),
            news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
            alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(600), // 10 minutes
            cache_max_entries: 128,
            news_page_size: 5,
            request_timeout: Duration::from_secs(30),
            task_ttl: Duration::from_secs(3600),
            task_max_entries: 1024,
            max_tokens: 2048,
            temperature: 0.3,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl DelphiConfig {
    /// Create a new configuration builder
    pub fn builder() -> DelphiConfigBuilder {
        DelphiConfigBuilder::default()
    }

    /// Load configuration from the process environment
    ///
    /// Call [`delphi_utils::load_dotenv`] first if a `.env` file should apply.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            mistral_api_key: env_var("MISTRAL_API_KEY"),
            news_api_key: env_var("NEWS_API_KEY"),
            alpha_vantage_api_key: env_var("ALPHA_VANTAGE_API_KEY"),
            model: env_or("MISTRAL_MODEL", &defaults.model),
            mistral_api_base: env_or("MISTRAL_API_BASE", &defaults.mistral_api_base),
            news_api_base_url: env_or("NEWS_API_BASE_URL", &defaults.news_api_base_url),
            alpha_vantage_base_url: env_or("ALPHA_VANTAGE_BASE_URL", &defaults.alpha_vantage_base_url),
            cache_ttl: env_parse::<u64>("DELPHI_CACHE_TTL_SECS")?
                .map_or(defaults.cache_ttl, Duration::from_secs),
            cache_max_entries: env_parse("DELPHI_CACHE_MAX_ENTRIES")?
                .unwrap_or(defaults.cache_max_entries),
            news_page_size: env_parse("DELPHI_NEWS_PAGE_SIZE")?.unwrap_or(defaults.news_page_size),
            request_timeout: env_parse::<u64>("DELPHI_REQUEST_TIMEOUT_SECS")?
                .map_or(defaults.request_timeout, Duration::from_secs),
            task_ttl: env_parse::<u64>("DELPHI_TASK_TTL_SECS")?
                .map_or(defaults.task_ttl, Duration::from_secs),
            task_max_entries: env_parse("DELPHI_TASK_MAX_ENTRIES")?
                .unwrap_or(defaults.task_max_entries),
            max_tokens: env_parse("DELPHI_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            temperature: env_parse("DELPHI_TEMPERATURE")?.unwrap_or(defaults.temperature),
            host: env_or("DELPHI_HOST", &defaults.host),
            port: env_parse("DELPHI_PORT")?.unwrap_or(defaults.port),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_max_entries == 0 {
            return Err(DelphiError::Config(
                "cache_max_entries must be greater than 0".to_string(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(DelphiError::Config(
                "cache_ttl must be greater than 0".to_string(),
            ));
        }

        if self.task_max_entries == 0 || self.task_ttl.is_zero() {
            return Err(DelphiError::Config(
                "task_max_entries and task_ttl must be greater than 0".to_string(),
            ));
        }

        if self.news_page_size == 0 {
            return Err(DelphiError::Config(
                "news_page_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address the API should bind to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DelphiError::Config(format!("invalid bind address: {e}")))
    }
}

/// Builder for DelphiConfig
#[derive(Debug, Default)]
pub struct DelphiConfigBuilder {
    mistral_api_key: Option<String>,
    news_api_key: Option<String>,
    alpha_vantage_api_key: Option<String>,
    model: Option<String>,
    mistral_api_base: Option<String>,
    news_api_base_url: Option<String>,
    alpha_vantage_base_url: Option<String>,
    cache_ttl: Option<Duration>,
    cache_max_entries: Option<usize>,
    news_page_size: Option<u32>,
    request_timeout: Option<Duration>,
    task_ttl: Option<Duration>,
    task_max_entries: Option<usize>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    host: Option<String>,
    port: Option<u16>,
}

impl DelphiConfigBuilder {
    /// Set the Mistral API key
    pub fn mistral_api_key(mut self, key: impl Into<String>) -> Self {
        self.mistral_api_key = Some(key.into());
        self
    }

    /// Set the NewsAPI key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Set the Alpha Vantage key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the chat-completions base URL
    pub fn mistral_api_base(mut self, url: impl Into<String>) -> Self {
        self.mistral_api_base = Some(url.into());
        self
    }

    /// Set the NewsAPI endpoint
    pub fn news_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.news_api_base_url = Some(url.into());
        self
    }

    /// Set the Alpha Vantage endpoint
    pub fn alpha_vantage_base_url(mut self, url: impl Into<String>) -> Self {
        self.alpha_vantage_base_url = Some(url.into());
        self
    }

    /// Set the cache time-to-live
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Set the cache capacity
    pub fn cache_max_entries(mut self, entries: usize) -> Self {
        self.cache_max_entries = Some(entries);
        self
    }

    /// Set the news page size
    pub fn news_page_size(mut self, size: u32) -> Self {
        self.news_page_size = Some(size);
        self
    }

    /// Set the outbound request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set how long task records are kept
    pub fn task_ttl(mut self, ttl: Duration) -> Self {
        self.task_ttl = Some(ttl);
        self
    }

    /// Set the task store capacity
    pub fn task_max_entries(mut self, entries: usize) -> Self {
        self.task_max_entries = Some(entries);
        self
    }

    /// Set the completion token limit for both agents
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature for both agents
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the bind port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DelphiConfig> {
        let defaults = DelphiConfig::default();

        let config = DelphiConfig {
            mistral_api_key: self.mistral_api_key,
            news_api_key: self.news_api_key,
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            model: self.model.unwrap_or(defaults.model),
            mistral_api_base: self.mistral_api_base.unwrap_or(defaults.mistral_api_base),
            news_api_base_url: self.news_api_base_url.unwrap_or(defaults.news_api_base_url),
            alpha_vantage_base_url: self
                .alpha_vantage_base_url
                .unwrap_or(defaults.alpha_vantage_base_url),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            cache_max_entries: self.cache_max_entries.unwrap_or(defaults.cache_max_entries),
            news_page_size: self.news_page_size.unwrap_or(defaults.news_page_size),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            task_ttl: self.task_ttl.unwrap_or(defaults.task_ttl),
            task_max_entries: self.task_max_entries.unwrap_or(defaults.task_max_entries),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
        };

        config.validate()?;
        Ok(config)
    }
}
