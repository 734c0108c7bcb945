//! LLM provider client (OpenAI-compatible chat completions and embeddings).

mod openai;

pub use openai::{ChatChoice, ChatMessage, ChatResponse, OpenAiClient, OpenAiError};
