//! Text generation abstraction.

use super::error::LlmResult;

/// A loaded causal language model.
///
/// Implementations are shared read-only across requests, so generation
/// takes `&self` and must not mutate the loaded weights.
pub trait TextGenerator: Send + Sync {
    /// Generate a continuation of `prompt`.
    ///
    /// Returns the prompt text followed by the generated continuation.
    ///
    /// # Errors
    /// Returns an error if tokenization or the forward pass fails.
    fn complete(&self, prompt: &str) -> LlmResult<String>;

    /// Name of the loaded model, for logs and API responses.
    fn model_name(&self) -> &str;
}
