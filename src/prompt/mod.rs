//! Prompt construction and answer extraction.
//!
//! - `prompt_builder`: the two fixed instruction templates
//! - `answer`: splitting generated text on the response marker

pub mod answer;
pub mod prompt_builder;

pub use answer::{RESPONSE_HEADER, RESPONSE_MARKER, extract_answer};
pub use prompt_builder::{PREAMBLE, PromptRequest, format_prompt};
