//! Instruction-following text generation behind a single web page.

// Unsafe or non-idiomatic practice is rejected outright
#![deny(warnings)] // Every warning is an error
#![deny(unsafe_code)]
#![deny(missing_docs)] // Every public item is documented
#![deny(dead_code)]
#![deny(non_camel_case_types)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)] // Result and Option must be handled
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::module_inception)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
// Robustness
#![deny(overflowing_literals)]

/// Process configuration.
pub mod config;
/// Model loading, generation and the prompt/answer adapter.
pub mod llm;
/// Prompt templates and answer extraction.
pub mod prompt;
/// HTTP server and page routes.
#[allow(
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::unused_async
)]
pub mod server;
/// Entry helpers to start the server.
pub mod start;
/// Framework-independent page submission handling.
pub mod submission;
