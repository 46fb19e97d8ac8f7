//! Generation settings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LlmError, LlmResult};

/// Default budget of newly generated tokens per request.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 50;

/// Default sampling seed.
pub const DEFAULT_SEED: u64 = 299_792_458;

/// Where the model should run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Best available accelerator, CPU otherwise.
    #[default]
    Auto,
    /// Always run on the CPU.
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            other => Err(LlmError::InvalidConfig(format!(
                "unknown device preference: {other}"
            ))),
        }
    }
}

/// Settings applied to every generation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens generated after the prompt.
    pub max_new_tokens: usize,
    /// Sampling temperature; `None` selects greedy decoding.
    pub temperature: Option<f64>,
    /// Nucleus sampling cutoff.
    pub top_p: Option<f64>,
    /// Seed for the sampler.
    pub seed: u64,
    /// Penalty applied to recently generated tokens; `1.0` disables it.
    pub repeat_penalty: f32,
    /// Window of tokens the repeat penalty looks at.
    pub repeat_last_n: usize,
    /// Device selection.
    pub device: DevicePreference,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            temperature: None,
            top_p: None,
            seed: DEFAULT_SEED,
            repeat_penalty: 1.0,
            repeat_last_n: 64,
            device: DevicePreference::Auto,
        }
    }
}

impl GenerationConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the new-token budget.
    #[must_use]
    pub const fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Enable sampling with the given temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the device preference.
    #[must_use]
    pub const fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> LlmResult<()> {
        if self.max_new_tokens == 0 {
            return Err(LlmError::InvalidConfig(
                "max_new_tokens must be > 0".to_string(),
            ));
        }

        if self.temperature.is_some_and(|temperature| temperature <= 0.0) {
            return Err(LlmError::InvalidConfig(
                "temperature must be > 0".to_string(),
            ));
        }

        if self.top_p.is_some_and(|top_p| top_p.is_nan() || top_p <= 0.0 || top_p > 1.0) {
            return Err(LlmError::InvalidConfig(
                "top_p must be in (0, 1]".to_string(),
            ));
        }

        if self.repeat_penalty <= 0.0 {
            return Err(LlmError::InvalidConfig(
                "repeat_penalty must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
