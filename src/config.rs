//! Adapter configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::time::Duration;

use crate::error::ConfigError;

/// Default store host (host:port, no scheme).
pub const DEFAULT_HOST: &str = "localhost:8080";
/// Default store scheme.
pub const DEFAULT_SCHEME: &str = "http";
/// Collection used when an invocation omits `collection`.
pub const DEFAULT_COLLECTION: &str = "DefaultCollection";
/// Default time to wait for the store to report ready at startup.
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 1;
/// Default per-call timeout against the store.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the store connection and the tool adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Store host including port, e.g. `localhost:8080`.
    pub host: String,
    /// `http` or `https`.
    pub scheme: String,
    /// How long to wait for the store's readiness probe at startup. Zero
    /// skips the probe.
    pub startup_timeout: Duration,
    /// Upper bound on a single store call.
    pub request_timeout: Duration,
    /// Collection substituted when an invocation omits `collection`.
    pub default_collection: String,
    /// Forwarded as `X-OpenAI-Api-Key` for the store's vectorizer module.
    pub openai_api_key: Option<String>,
    /// Forwarded as `X-Cohere-Api-Key` for the store's vectorizer module.
    pub cohere_api_key: Option<String>,
}

impl AdapterConfig {
    /// Creates a new builder for `AdapterConfig`.
    #[must_use]
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an environment value cannot be parsed or
    /// the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().from_env()?.build()
    }

    /// Base URL of the store, e.g. `http://localhost:8080`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_end_matches('/'))
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_collection: DEFAULT_COLLECTION.to_string(),
            openai_api_key: None,
            cohere_api_key: None,
        }
    }
}

/// Builder for [`AdapterConfig`].
#[derive(Debug, Clone, Default)]
pub struct AdapterConfigBuilder {
    host: Option<String>,
    scheme: Option<String>,
    startup_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    default_collection: Option<String>,
    openai_api_key: Option<String>,
    cohere_api_key: Option<String>,
}

fn env_secs(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

impl AdapterConfigBuilder {
    /// Populates unset fields from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a timeout variable is not a
    /// whole number of seconds.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        if self.host.is_none() {
            self.host = std::env::var("WEAVIATE_HOST").ok();
        }
        if self.scheme.is_none() {
            self.scheme = std::env::var("WEAVIATE_SCHEME").ok();
        }
        if self.startup_timeout.is_none() {
            self.startup_timeout = env_secs("WEAVIATE_STARTUP_TIMEOUT_SECS")?;
        }
        if self.request_timeout.is_none() {
            self.request_timeout = env_secs("WEAVIATE_REQUEST_TIMEOUT_SECS")?;
        }
        if self.default_collection.is_none() {
            self.default_collection = std::env::var("WEAVIATE_DEFAULT_COLLECTION").ok();
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.cohere_api_key.is_none() {
            self.cohere_api_key = std::env::var("COHERE_API_KEY").ok();
        }
        Ok(self)
    }

    /// Sets the store host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the store scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the startup readiness timeout.
    #[must_use]
    pub const fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the default collection.
    #[must_use]
    pub fn default_collection(mut self, collection: impl Into<String>) -> Self {
        self.default_collection = Some(collection.into());
        self
    }

    /// Sets the `OpenAI` key forwarded to the store.
    #[must_use]
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the Cohere key forwarded to the store.
    #[must_use]
    pub fn cohere_api_key(mut self, key: impl Into<String>) -> Self {
        self.cohere_api_key = Some(key.into());
        self
    }

    /// Builds the [`AdapterConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty host, an unsupported scheme,
    /// an empty default collection or a zero request timeout.
    pub fn build(self) -> Result<AdapterConfig, ConfigError> {
        let defaults = AdapterConfig::default();

        let host = self.host.unwrap_or(defaults.host);
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        let scheme = self.scheme.unwrap_or(defaults.scheme).to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::UnsupportedScheme(scheme));
        }

        let default_collection = self
            .default_collection
            .unwrap_or(defaults.default_collection);
        if default_collection.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultCollection);
        }

        let request_timeout = self.request_timeout.unwrap_or(defaults.request_timeout);
        if request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }

        Ok(AdapterConfig {
            host,
            scheme,
            startup_timeout: self.startup_timeout.unwrap_or(defaults.startup_timeout),
            request_timeout,
            default_collection,
            openai_api_key: self.openai_api_key.filter(|k| !k.is_empty()),
            cohere_api_key: self.cohere_api_key.filter(|k| !k.is_empty()),
        })
    }
}
