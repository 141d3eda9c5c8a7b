//! Configuration for assembling a full assistant runtime.

use std::env;
use std::time::Duration;

use rhistory::HistoryBackendConfig;

use crate::ProviderError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(90);

/// Environment variable holding comma-separated API keys.
pub const API_KEYS_ENV: &str = "REMEDY_API_KEYS";

/// Environment variable overriding the chat model.
pub const MODEL_ENV: &str = "REMEDY_MODEL";

/// Everything the runtime builder needs that is not an injected component.
#[derive(Debug, Clone)]
pub struct RemedyConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub embedding_model: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub session_capacity: Option<usize>,
    pub http_timeout: Duration,
    pub history: HistoryBackendConfig,
    /// Attaches the tracing observability hooks to every hook seam the
    /// builder wires, unless an explicit hook override is given.
    pub verbose: bool,
}

impl RemedyConfig {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            system_prompt: None,
            temperature: None,
            session_capacity: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            history: HistoryBackendConfig::default(),
            verbose: false,
        }
    }

    /// Reads keys from `REMEDY_API_KEYS` (comma-separated) and the model
    /// override from `REMEDY_MODEL`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let raw = env::var(API_KEYS_ENV).map_err(|_| {
            ProviderError::authentication(format!("{API_KEYS_ENV} is not set"))
        })?;
        let api_keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();

        let mut config = Self::new(api_keys);
        if let Ok(model) = env::var(MODEL_ENV) {
            let model = model.trim().to_string();
            if !model.is_empty() {
                config.model = model;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, embedding_model: impl Into<String>) -> Self {
        self.embedding_model = embedding_model.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_session_capacity(mut self, capacity: usize) -> Self {
        self.session_capacity = Some(capacity);
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_history(mut self, history: HistoryBackendConfig) -> Self {
        self.history = history;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.api_keys.is_empty() {
            return Err(ProviderError::authentication(
                "at least one API key is required",
            ));
        }
        if self.api_keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ProviderError::authentication(
                "API keys must not be blank",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ProviderError::invalid_request(
                "embedding model must not be empty",
            ));
        }
        Ok(())
    }
}
