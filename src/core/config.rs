//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::core::rate_limiter::RateLimitPolicy;

const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com";
const DEEPL_PRO_ENDPOINT: &str = "https://api.deepl.com";
const APERTIUM_ENDPOINT: &str = "https://apertium.org/apy";

/// Configuration for the translation router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// DeepL API key. Without it only the Apertium pivot is registered.
    pub deepl_api_key: String,
    /// Overrides the endpoint derived from the key
    pub deepl_api_url: Option<String>,
    pub apertium_url: String,
    pub timeout_ms: u64,
    pub max_text_length: usize,
    /// Identify the language of `auto` requests with Apertium before routing
    pub detect_source: bool,
    pub expensive_limit: RateLimitPolicy,
    pub cheap_limit: RateLimitPolicy,
    pub rate_limit_sweep_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            deepl_api_key: std::env::var("DEEPL_APIKEY").unwrap_or_default(),
            deepl_api_url: None,
            apertium_url: APERTIUM_ENDPOINT.to_string(),
            timeout_ms: 30000,
            max_text_length: 1800,
            detect_source: true,
            expensive_limit: RateLimitPolicy {
                window_ms: 30 * 60 * 1000,
                max_per_window: 3,
                by_user: true,
            },
            cheap_limit: RateLimitPolicy {
                window_ms: 60 * 1000,
                max_per_window: 3,
                by_user: false,
            },
            rate_limit_sweep_interval_ms: 5 * 60 * 1000,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let deepl_api_url = std::env::var("DEEPL_API_URL").ok().filter(|v| !v.is_empty());

        let apertium_url =
            std::env::var("APERTIUM_URL").unwrap_or_else(|_| defaults.apertium_url.clone());

        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse::<u64>()?;

        let max_text_length = std::env::var("MAX_TEXT_LENGTH")
            .unwrap_or_else(|_| "1800".to_string())
            .parse::<usize>()?;

        let detect_source = std::env::var("DETECT_SOURCE")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()?;

        Ok(Self {
            deepl_api_url,
            apertium_url,
            timeout_ms,
            max_text_length,
            detect_source,
            ..defaults
        })
    }

    /// Load from environment, or from a JSON/YAML file when given.
    ///
    /// An explicit `api_key` wins over both sources.
    pub fn load(path: Option<&Path>, api_key: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };

        if let Some(key) = api_key {
            config.deepl_api_key = key.to_string();
        }

        if config.deepl_api_key.is_empty() {
            warn!("DEEPL_APIKEY is not set, only Bokmål <-> Nynorsk is available");
        }

        Ok(config)
    }

    /// Load from a JSON or YAML file, picked by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.apertium_url.is_empty() {
            return Err(anyhow::anyhow!("Apertium URL is required"));
        }

        if self.max_text_length == 0 {
            return Err(anyhow::anyhow!("max_text_length must be greater than 0"));
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!("timeout_ms must be greater than 0"));
        }

        for (name, policy) in [("expensive", &self.expensive_limit), ("cheap", &self.cheap_limit)] {
            if policy.window_ms == 0 {
                return Err(anyhow::anyhow!("{} rate limit window must be greater than 0", name));
            }
        }

        Ok(())
    }

    pub fn has_deepl(&self) -> bool {
        !self.deepl_api_key.is_empty()
    }

    /// DeepL base URL; free-tier keys end in `:fx`
    pub fn deepl_endpoint(&self) -> String {
        match &self.deepl_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.deepl_api_key.ends_with(":fx") => DEEPL_FREE_ENDPOINT.to_string(),
            None => DEEPL_PRO_ENDPOINT.to_string(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Entries idle longer than the longest window can no longer limit anyone
    pub fn rate_limit_retention(&self) -> Duration {
        self.expensive_limit.window().max(self.cheap_limit.window())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "yaml" || ext == "yml"
        })
        .unwrap_or(false)
}
