//! Language model loading and generation.
//!
//! - `generator`: the [`TextGenerator`] seam
//! - `causal_lm`: candle-backed Llama-family model loaded from disk
//! - `adapter`: prompt formatting + generation + answer extraction
//! - `config`, `device`, `error`: settings, device choice and errors

pub mod adapter;
pub mod causal_lm;
pub mod config;
pub mod device;
pub mod error;
pub mod generator;

pub use adapter::{Completion, GenerationAdapter};
pub use causal_lm::{CausalLm, ModelArtifacts};
pub use config::{DEFAULT_MAX_NEW_TOKENS, DevicePreference, GenerationConfig};
pub use error::{LlmError, LlmResult};
pub use generator::TextGenerator;
