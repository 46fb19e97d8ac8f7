//! Prompt-in, answer-out wrapper around a [`TextGenerator`].

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::prompt::{PromptRequest, extract_answer};

use super::error::LlmResult;
use super::generator::TextGenerator;

/// Result of one formatting and generation round trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Prompt sent to the model.
    pub prompt: String,
    /// Raw model output, prompt included.
    pub raw: String,
    /// Text following the last response marker.
    pub answer: String,
}

/// Formats requests, runs the generator and extracts the answer.
#[derive(Clone)]
pub struct GenerationAdapter {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationAdapter {
    /// Wrap an already loaded generator.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Name of the underlying model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Format `request`, generate, and split out the answer.
    ///
    /// Blocks for the duration of the generation.
    ///
    /// # Errors
    /// Returns the generator error unchanged.
    pub fn complete(&self, request: &PromptRequest) -> LlmResult<Completion> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generate", %request_id, model = self.model_name());
        let _guard = span.enter();

        let prompt = request.format();
        tracing::debug!(
            prompt_chars = prompt.len(),
            has_input = request.context().is_some(),
            "Prompt formatted"
        );

        let raw = self.generator.complete(&prompt).map_err(|e| {
            tracing::error!("Generation failed: {e}");
            e
        })?;
        let answer = extract_answer(&raw).to_string();
        if answer.len() == raw.len() {
            tracing::warn!("Response marker missing from model output; returning raw text");
        }

        Ok(Completion {
            prompt,
            raw,
            answer,
        })
    }

    /// Like [`Self::complete`] but only returns the answer.
    ///
    /// # Errors
    /// Returns the generator error unchanged.
    pub fn answer(&self, request: &PromptRequest) -> LlmResult<String> {
        self.complete(request).map(|c| c.answer)
    }
}
