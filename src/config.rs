use crate::{
    error::{Result, ToonifyError},
    models::ModelFamily,
};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
pub const DEFAULT_BLOB_API_BASE: &str = "https://blob.vercel-storage.com";
pub const DEFAULT_PROMPT: &str = "Make this a 90s cartoon";

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<String>,
    pub api_base: String,
    pub model: Option<String>,
    pub family: ModelFamily,
    pub image_key: Option<String>,
    pub fixed_prompt: String,
    pub negative_prompt: Option<String>,
    pub max_starting: Duration,
    pub max_retries: u32,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    Vercel,
    Memory,
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    pub token: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub replicate: ReplicateConfig,
    pub blob: BlobConfig,
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: None,
            family: ModelFamily::Cartoonify,
            image_key: None,
            fixed_prompt: DEFAULT_PROMPT.to_string(),
            negative_prompt: None,
            max_starting: Duration::from_secs(90),
            max_retries: 1,
            poll_interval: Duration::from_millis(1200),
        }
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let family = match non_empty_env("REPLICATE_MODEL_FAMILY") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Unknown REPLICATE_MODEL_FAMILY '{}', using cartoonify", raw);
                ModelFamily::Cartoonify
            }),
            None => defaults.family,
        };

        ReplicateConfig {
            api_token: non_empty_env("REPLICATE_API_TOKEN"),
            api_base: non_empty_env("REPLICATE_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: non_empty_env("REPLICATE_MODEL"),
            family,
            image_key: non_empty_env("REPLICATE_IMAGE_KEY"),
            fixed_prompt: non_empty_env("AVATAR_PROMPT").unwrap_or(defaults.fixed_prompt),
            negative_prompt: non_empty_env("AVATAR_NEGATIVE_PROMPT"),
            max_starting: non_empty_env("REPLICATE_MAX_STARTING_SECONDS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_starting),
            max_retries: non_empty_env("REPLICATE_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            poll_interval: non_empty_env("REPLICATE_POLL_INTERVAL_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_family(mut self, family: ModelFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_key = Some(key.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.fixed_prompt = prompt.into();
        self
    }

    pub fn with_max_starting(mut self, max_starting: Duration) -> Self {
        self.max_starting = max_starting;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the API token, or a `ConfigError` naming the missing variable.
    pub fn token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| ToonifyError::ConfigError("Missing REPLICATE_API_TOKEN".into()))
    }

    /// Picks the per-request model override when present, else the configured model.
    pub fn model_for<'a>(&'a self, overridden: Option<&'a str>) -> Result<&'a str> {
        overridden
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or(self.model.as_deref())
            .ok_or_else(|| ToonifyError::ConfigError("Missing REPLICATE_MODEL".into()))
    }

    pub fn validate(&self) -> Result<()> {
        self.token()?;
        if self.api_base.is_empty() {
            return Err(ToonifyError::ConfigError("Empty REPLICATE_API_BASE".into()));
        }
        if self.max_starting.is_zero() {
            return Err(ToonifyError::ConfigError(
                "REPLICATE_MAX_STARTING_SECONDS must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        BlobConfig {
            backend: BlobBackend::Vercel,
            token: None,
            api_base: DEFAULT_BLOB_API_BASE.to_string(),
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory() -> Self {
        BlobConfig {
            backend: BlobBackend::Memory,
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        let backend = match non_empty_env("BLOB_BACKEND").as_deref() {
            Some("memory") => BlobBackend::Memory,
            _ => BlobBackend::Vercel,
        };

        BlobConfig {
            backend,
            token: non_empty_env("BLOB_READ_WRITE_TOKEN"),
            api_base: non_empty_env("BLOB_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BLOB_API_BASE.to_string()),
        }
    }

    pub fn with_credentials(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            replicate: ReplicateConfig::default(),
            blob: BlobConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            replicate: ReplicateConfig::from_env(),
            blob: BlobConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_replicate(mut self, config: ReplicateConfig) -> Self {
        self.replicate = config;
        self
    }

    pub fn with_blob(mut self, config: BlobConfig) -> Self {
        self.blob = config;
        self
    }
}
