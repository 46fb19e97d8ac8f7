//! Error types for model loading and generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a model or generating text.
#[derive(Debug, Error)]
pub enum LlmError {
    /// A required file is missing from the model directory.
    #[error("missing model artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// A model artifact exists but cannot be read.
    #[error("invalid model artifact {}: {reason}", .path.display())]
    InvalidArtifact {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Invalid generation or model configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tokenizer failed to encode or decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Tensor backend error.
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// The prompt produced no tokens.
    #[error("prompt encodes to zero tokens")]
    EmptyPrompt,

    /// The prompt does not fit the model context window.
    #[error("prompt of {tokens} tokens exceeds the model context of {limit}")]
    ContextOverflow {
        /// Prompt length in tokens.
        tokens: usize,
        /// Maximum sequence length of the model.
        limit: usize,
    },

    /// The blocking generation task did not complete.
    #[error("generation task failed: {0}")]
    Task(String),

    /// JSON parsing error (model config, shard index).
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Whether the error comes from the model artifacts rather than a request.
    #[must_use]
    pub const fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArtifact(_)
                | Self::InvalidArtifact { .. }
                | Self::Json(_)
                | Self::Io(_)
                | Self::InvalidConfig(_)
        )
    }
}

/// Convenience result alias for model operations.
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_message() {
        let err = LlmError::MissingArtifact(PathBuf::from("results/final/tokenizer.json"));
        assert_eq!(
            err.to_string(),
            "missing model artifact: results/final/tokenizer.json"
        );
        assert!(err.is_load_error());
    }

    #[test]
    fn test_request_errors_are_not_load_errors() {
        assert!(!LlmError::EmptyPrompt.is_load_error());
        assert!(
            !LlmError::ContextOverflow {
                tokens: 5000,
                limit: 4096
            }
            .is_load_error()
        );
        assert!(!LlmError::Task("cancelled".to_string()).is_load_error());
        assert!(!LlmError::Tokenizer("unknown token".to_string()).is_load_error());
    }

    #[test]
    fn test_unreadable_tokenizer_is_load_error() {
        let err = LlmError::InvalidArtifact {
            path: PathBuf::from("results/final/tokenizer.json"),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.is_load_error());
        assert!(err.to_string().contains("results/final/tokenizer.json"));
    }
}
