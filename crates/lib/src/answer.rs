//! Answer engine: turns the user's command text into plain answer text.
//!
//! One strategy trait, two implementations selected by `answer.mode`: a
//! direct single-turn completion, and a retrieval-augmented completion with
//! conversation memory. Both fail closed — provider responses that lack the
//! expected fields become a fixed fallback string — while genuine HTTP
//! failures propagate as errors to be caught and logged at the responder.

use crate::config::{self, AnswerMode, Config};
use crate::llm::{ChatMessage, OpenAiClient, OpenAiError};
use crate::memory::{ConversationMemory, MemoryMessage, TtlMemory};
use crate::retrieval::{RetrievalError, ScoredPassage, VectorStoreClient};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Returned when the provider answers with no usable choice.
pub const FALLBACK_ANSWER: &str = "I could not come up with an answer this time.";

/// Returned when no LLM API key is configured; no provider call is made.
pub const MISSING_KEY_ANSWER: &str =
    "Sorry, I am not configured with a language model API key and cannot answer right now.";

/// Per-turn context resolved by the responder: the conversation-memory key.
#[derive(Debug, Clone)]
pub struct AnswerContext {
    pub session_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error(transparent)]
    Llm(#[from] OpenAiError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// One answer strategy. `answer` may take arbitrarily long; it runs off the
/// inbound request's critical path.
#[async_trait]
pub trait AnswerStrategy: Send + Sync {
    async fn answer(&self, ctx: &AnswerContext, text: &str) -> Result<String, AnswerError>;
}

/// Reduce a provider response to plain text: first choice's content, or the
/// fixed fallback when the response has no usable choice.
fn reduce_answer(content: Option<&str>) -> String {
    match content.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => FALLBACK_ANSWER.to_string(),
    }
}

/// Single-turn completion of the user text, optionally suffixed with a
/// length-constraint instruction.
pub struct DirectCompletion {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl DirectCompletion {
    pub fn new(
        client: OpenAiClient,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    fn prompt(&self, text: &str) -> String {
        match self.max_tokens {
            Some(n) => format!("{}\n\nAnswer within {} tokens.", text, n),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl AnswerStrategy for DirectCompletion {
    async fn answer(&self, _ctx: &AnswerContext, text: &str) -> Result<String, AnswerError> {
        if !self.client.has_key() {
            log::warn!("answer engine: no llm api key configured, returning fallback");
            return Ok(MISSING_KEY_ANSWER.to_string());
        }
        let messages = vec![ChatMessage::user(self.prompt(text))];
        let res = self
            .client
            .chat(
                &self.model,
                messages,
                Some(self.temperature),
                self.max_tokens,
            )
            .await?;
        Ok(reduce_answer(res.first_content()))
    }
}

/// Retrieval-augmented completion: embed the query, fetch similar passages
/// from the vector index, and answer grounded in those passages plus the
/// session's prior turns. The user/assistant turn is appended to memory so
/// follow-up questions within the TTL window see it.
pub struct RetrievalAugmented {
    llm: OpenAiClient,
    store: VectorStoreClient,
    memory: Arc<dyn ConversationMemory>,
    model: String,
    embedding_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    top_k: u32,
}

impl RetrievalAugmented {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: OpenAiClient,
        store: VectorStoreClient,
        memory: Arc<dyn ConversationMemory>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
        top_k: u32,
    ) -> Self {
        Self {
            llm,
            store,
            memory,
            model: model.into(),
            embedding_model: embedding_model.into(),
            temperature,
            max_tokens,
            top_k,
        }
    }

    fn grounding_context(passages: &[ScoredPassage]) -> String {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let mut out = String::new();
        out.push_str("Today's date: ");
        out.push_str(&today);
        out.push_str("\n\n");
        out.push_str(
            "Answer the question using the context passages below and the conversation so far. \
             If the context does not contain the answer, say you do not know.\n\nContext:\n",
        );
        if passages.is_empty() {
            out.push_str("(no matching passages)\n");
        }
        for p in passages {
            out.push_str("- ");
            out.push_str(p.text.trim());
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl AnswerStrategy for RetrievalAugmented {
    async fn answer(&self, ctx: &AnswerContext, text: &str) -> Result<String, AnswerError> {
        if !self.llm.has_key() {
            log::warn!("answer engine: no llm api key configured, returning fallback");
            return Ok(MISSING_KEY_ANSWER.to_string());
        }

        let vector = self.llm.embed(&self.embedding_model, text).await?;
        let passages = self.store.query(&vector, self.top_k).await?;
        log::debug!(
            "retrieval: {} passage(s) for session {}",
            passages.len(),
            ctx.session_key
        );

        let history = self.memory.history(&ctx.session_key).await;
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(Self::grounding_context(&passages)));
        for m in &history {
            messages.push(ChatMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            });
        }
        messages.push(ChatMessage::user(text));

        let res = self
            .llm
            .chat(
                &self.model,
                messages,
                Some(self.temperature),
                self.max_tokens,
            )
            .await?;
        let answer = reduce_answer(res.first_content());

        self.memory
            .append(&ctx.session_key, MemoryMessage::user(text))
            .await;
        self.memory
            .append(&ctx.session_key, MemoryMessage::assistant(answer.clone()))
            .await;
        Ok(answer)
    }
}

/// Build the configured strategy. Retrieval mode requires an index URL; the
/// LLM key may be absent (the strategies degrade to the apology string).
pub fn answer_engine_from_config(config: &Config) -> Result<Arc<dyn AnswerStrategy>> {
    let llm = OpenAiClient::new(config.llm.base_url.clone(), config::resolve_llm_api_key(config));
    match config.answer.mode {
        AnswerMode::Direct => Ok(Arc::new(DirectCompletion::new(
            llm,
            &config.llm.model,
            config.llm.temperature,
            config.llm.max_tokens,
        ))),
        AnswerMode::Retrieval => {
            let index_url = config
                .retrieval
                .index_url
                .as_deref()
                .context("answer.mode is \"retrieval\" but retrieval.indexUrl is not set")?;
            let store = VectorStoreClient::new(
                index_url,
                config::resolve_vector_store_api_key(config),
            );
            let memory = Arc::new(TtlMemory::new(Duration::from_secs(config.memory.ttl_secs)));
            Ok(Arc::new(RetrievalAugmented::new(
                llm,
                store,
                memory,
                &config.llm.model,
                &config.retrieval.embedding_model,
                config.llm.temperature,
                config.llm.max_tokens,
                config.retrieval.top_k,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_falls_back_on_missing_or_blank_content() {
        assert_eq!(reduce_answer(None), FALLBACK_ANSWER);
        assert_eq!(reduce_answer(Some("")), FALLBACK_ANSWER);
        assert_eq!(reduce_answer(Some("   ")), FALLBACK_ANSWER);
    }

    #[test]
    fn reduce_trims_real_content() {
        assert_eq!(reduce_answer(Some("  hi there \n")), "hi there");
    }

    #[test]
    fn direct_prompt_appends_length_constraint() {
        let client = OpenAiClient::new(None, None);
        let strategy = DirectCompletion::new(client, "gpt-4o", 0.5, Some(256));
        assert_eq!(
            strategy.prompt("hello"),
            "hello\n\nAnswer within 256 tokens."
        );
    }

    #[test]
    fn direct_prompt_unchanged_without_max_tokens() {
        let client = OpenAiClient::new(None, None);
        let strategy = DirectCompletion::new(client, "gpt-4o", 0.5, None);
        assert_eq!(strategy.prompt("hello"), "hello");
    }

    #[tokio::test]
    async fn missing_key_short_circuits_to_apology() {
        let client = OpenAiClient::new(None, None);
        let strategy = DirectCompletion::new(client, "gpt-4o", 0.5, None);
        let ctx = AnswerContext {
            session_key: "chan-1".to_string(),
        };
        let answer = strategy.answer(&ctx, "hello").await.unwrap();
        assert_eq!(answer, MISSING_KEY_ANSWER);
    }

    #[test]
    fn grounding_context_lists_passages() {
        let passages = vec![
            ScoredPassage {
                score: 0.9,
                text: "passage one".to_string(),
            },
            ScoredPassage {
                score: 0.5,
                text: "passage two".to_string(),
            },
        ];
        let ctx = RetrievalAugmented::grounding_context(&passages);
        assert!(ctx.contains("- passage one\n"));
        assert!(ctx.contains("- passage two\n"));
    }

    #[test]
    fn retrieval_mode_without_index_url_fails_at_startup() {
        let mut config = Config::default();
        config.answer.mode = AnswerMode::Retrieval;
        assert!(answer_engine_from_config(&config).is_err());
    }
}
