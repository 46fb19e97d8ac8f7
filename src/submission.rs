//! Page submission handling, independent of any web framework.

use serde::{Deserialize, Serialize};

use crate::llm::{GenerationAdapter, LlmResult};
use crate::prompt::PromptRequest;

/// Current state of the page fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// How many times the submit button has been pressed.
    #[serde(default)]
    pub clicks: u32,
    /// Instruction field value.
    #[serde(default)]
    pub instruction: Option<String>,
    /// Context input field value.
    #[serde(default)]
    pub input: Option<String>,
}

impl Submission {
    /// Prompt request for the current field values.
    ///
    /// A missing instruction becomes the empty string.
    #[must_use]
    pub fn to_request(&self) -> PromptRequest {
        PromptRequest {
            instruction: self.instruction.clone().unwrap_or_default(),
            input: self.input.clone(),
        }
    }
}

/// Compute the answer area content for `submission`.
///
/// Returns `Ok(None)` before the first click without touching the model;
/// otherwise runs exactly one generation and returns its answer.
///
/// # Errors
/// Returns the generation error unchanged.
pub fn respond(adapter: &GenerationAdapter, submission: &Submission) -> LlmResult<Option<String>> {
    if submission.clicks == 0 {
        return Ok(None);
    }

    adapter.answer(&submission.to_request()).map(Some)
}
