//! Deferred response protocol: acknowledge now, answer later, edit on done.
//!
//! Platform interactions have a synchronous reply budget of a few seconds —
//! too short for an LLM round trip — so each command goes through two phases:
//! an immediate deferred acknowledgement on the request task, then the answer
//! computation and follow-up edit on the bounded worker pool.
//!
//! Per-interaction states: Received → Verified → Deferred → Answering →
//! Delivered | DeliveryFailed. Nothing is persisted; a crash after the
//! acknowledgement loses the interaction (operators: there is no durable
//! queue and no retry — the token expires after ~15 minutes anyway).

use crate::answer::{AnswerContext, AnswerStrategy};
use crate::discord::DiscordClient;
use crate::worker::TaskPool;
use std::sync::Arc;

/// Follow-up message format: echo the input, then the answer.
fn delivery_content(text: &str, answer: &str) -> String {
    format!("Your input: {}\nAnswer: {}", text, answer)
}

/// Drives the two-phase reply for one interaction at a time.
pub struct DeferredResponder {
    discord: Arc<DiscordClient>,
    engine: Arc<dyn AnswerStrategy>,
    pool: TaskPool,
    placeholder: String,
}

impl DeferredResponder {
    pub fn new(
        discord: Arc<DiscordClient>,
        engine: Arc<dyn AnswerStrategy>,
        pool: TaskPool,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            discord,
            engine,
            pool,
            placeholder: placeholder.into(),
        }
    }

    /// Phase 1 on the caller's task: send the deferred acknowledgement. On
    /// failure the interaction is lost (logged, not retried). On success the
    /// answer/delivery phases are spawned onto the pool and this returns.
    ///
    /// `channel_id` keys the conversation memory; interactions without one
    /// get a fresh per-request key (no cross-turn memory).
    pub async fn dispatch(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        channel_id: Option<&str>,
        text: &str,
    ) {
        if let Err(e) = self
            .discord
            .create_deferred_response(interaction_id, interaction_token, &self.placeholder)
            .await
        {
            log::error!(
                "interaction {}: deferred acknowledgement failed, interaction lost: {}",
                interaction_id,
                e
            );
            return;
        }
        log::info!("interaction {}: deferred", interaction_id);

        let session_key = channel_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));
        let discord = self.discord.clone();
        let engine = self.engine.clone();
        let id = interaction_id.to_string();
        let token = interaction_token.to_string();
        let text = text.to_string();

        self.pool
            .spawn(async move {
                log::info!("interaction {}: answering", id);
                let ctx = AnswerContext { session_key };
                let answer = match engine.answer(&ctx, &text).await {
                    Ok(a) => a,
                    Err(e) => {
                        log::error!("interaction {}: answer engine failed: {}", id, e);
                        return;
                    }
                };
                match discord
                    .edit_original_response(&token, &delivery_content(&text, &answer))
                    .await
                {
                    Ok(()) => log::info!("interaction {}: delivered", id),
                    Err(e) => {
                        // Terminal: the token may have expired; there is no retry.
                        log::error!("interaction {}: delivery failed: {}", id, e);
                    }
                }
            })
            .await;
    }

    /// Await all in-flight answer tasks (called on gateway shutdown).
    pub async fn drain(&self) {
        self.pool.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_content_echoes_input_and_answer() {
        let content = delivery_content("hello", "hi there");
        assert!(content.contains("hello"));
        assert!(content.contains("hi there"));
        assert_eq!(content, "Your input: hello\nAnswer: hi there");
    }
}
