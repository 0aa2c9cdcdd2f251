//! Narration script synthesis.
//!
//! Builds the explainer prompt from a `ClinicalContext`, sends it to a local
//! model through `LlmClient`, and turns the model's JSON sections into one
//! narration string.

pub mod ollama;
pub mod prompt;
pub mod synthesizer;

pub use ollama::{LlmClient, MockLlmClient, OllamaClient};
pub use prompt::{build_script_prompt, SCRIPT_SYSTEM_PROMPT};
pub use synthesizer::{narration_from_response, LlmScriptSynthesizer};
