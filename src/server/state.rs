//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{CausalLm, GenerationAdapter, LlmResult, TextGenerator};

use super::page::PageRenderer;

/// Shared application state.
pub struct AppState {
    /// Loaded model behind the prompt/answer adapter.
    pub adapter: Arc<GenerationAdapter>,
    /// HTML page renderer.
    pub page: PageRenderer,
}

impl AppState {
    /// Create state around an already loaded generator.
    ///
    /// # Errors
    /// Returns an error if the page template fails to compile.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Result<Arc<Self>, minijinja::Error> {
        Ok(Arc::new(Self {
            adapter: Arc::new(GenerationAdapter::new(generator)),
            page: PageRenderer::new()?,
        }))
    }

    /// Load the model described by `config`.
    ///
    /// # Errors
    /// Returns an error if the model artifacts cannot be loaded.
    pub fn load_generator(config: &AppConfig) -> LlmResult<Arc<dyn TextGenerator>> {
        let model = CausalLm::load(&config.model_dir, config.generation.clone())?;
        Ok(Arc::new(model))
    }
}
