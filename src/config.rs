//! Process configuration, fixed at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::{DevicePreference, GenerationConfig, LlmError, LlmResult};

/// Default model directory.
pub const DEFAULT_MODEL_DIR: &str = "./results/final";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8050;

/// Environment variable overriding the model directory.
pub const MODEL_DIR_ENV: &str = "INSTRUCT_WEB_MODEL_DIR";
/// Environment variable overriding the new-token budget.
pub const MAX_NEW_TOKENS_ENV: &str = "INSTRUCT_WEB_MAX_NEW_TOKENS";
/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "INSTRUCT_WEB_PORT";
/// Environment variable selecting the device (`auto` or `cpu`).
pub const DEVICE_ENV: &str = "INSTRUCT_WEB_DEVICE";

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the model checkpoint and tokenizer.
    pub model_dir: PathBuf,
    /// Port the web page is served on.
    pub port: u16,
    /// Generation settings.
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            port: DEFAULT_PORT,
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> LlmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> LlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(MODEL_DIR_ENV) {
            config.model_dir = PathBuf::from(dir);
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| LlmError::InvalidConfig(format!("{PORT_ENV}: invalid port {port}")))?;
        }

        if let Some(max) = lookup(MAX_NEW_TOKENS_ENV) {
            config.generation.max_new_tokens = max.trim().parse().map_err(|_| {
                LlmError::InvalidConfig(format!("{MAX_NEW_TOKENS_ENV}: invalid count {max}"))
            })?;
        }

        if let Some(device) = lookup(DEVICE_ENV) {
            config.generation.device = device.parse::<DevicePreference>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the model directory.
    #[must_use]
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> LlmResult<()> {
        if self.model_dir.as_os_str().is_empty() {
            return Err(LlmError::InvalidConfig(
                "model_dir must not be empty".to_string(),
            ));
        }
        self.generation.validate()
    }
}
