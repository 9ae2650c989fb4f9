//! LLM API client, wire types and the generation capability
//!
//! Supports both Claude API and OpenAI-compatible APIs.

mod client;
mod generator;
mod types;

pub use client::{parse_decision, LlmClient};
pub use generator::{Decision, Generator};
pub use types::*;
