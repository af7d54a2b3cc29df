mod client;
mod types;

pub use client::{GeminiClient, LlmClient, create_llm_client};
pub use types::*;
