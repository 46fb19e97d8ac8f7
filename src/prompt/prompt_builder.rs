//! Instruction prompt builder.

use serde::{Deserialize, Serialize};

use super::answer::RESPONSE_HEADER;

/// Fixed preamble shared by both templates.
pub const PREAMBLE: &str = "Below is an instruction that describes a task, paired with an input that provides further context. Write a response that appropriately completes the request.";

const INSTRUCTION_HEADER: &str = "### Instruction:";
const INPUT_HEADER: &str = "### Input:";

/// A single user submission to be formatted into a prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Task the model should carry out.
    pub instruction: String,
    /// Optional context the instruction refers to.
    #[serde(default)]
    pub input: Option<String>,
}

impl PromptRequest {
    /// Create a request without context input.
    #[must_use]
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            input: None,
        }
    }

    /// Attach context input.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Context input if present and non-empty.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.input.as_deref().filter(|s| !s.is_empty())
    }

    /// Render this request with [`format_prompt`].
    #[must_use]
    pub fn format(&self) -> String {
        format_prompt(&self.instruction, self.context())
    }
}

/// Build the prompt for `instruction`, including an input section only when
/// `input` is present and non-empty.
///
/// Values are inserted verbatim. The result never has leading or trailing
/// whitespace and always ends with the response header.
#[must_use]
pub fn format_prompt(instruction: &str, input: Option<&str>) -> String {
    let input = input.filter(|s| !s.is_empty());
    let capacity = PREAMBLE.len()
        + instruction.len()
        + input.map_or(0, |s| s.len() + INPUT_HEADER.len())
        + 64;
    let mut out = String::with_capacity(capacity);

    out.push_str(PREAMBLE);
    out.push_str("\n\n");

    out.push_str(INSTRUCTION_HEADER);
    out.push('\n');
    out.push_str(instruction);
    out.push_str("\n\n");

    if let Some(input) = input {
        out.push_str(INPUT_HEADER);
        out.push('\n');
        out.push_str(input);
        out.push_str("\n\n");
    }

    out.push_str(RESPONSE_HEADER);
    out
}
