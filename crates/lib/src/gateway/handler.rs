//! Interaction routing: verify, classify, dispatch.
//!
//! Verification runs before the body is parsed and before any side effect.
//! Pings re-register the slash command synchronously (idempotent; the
//! handshake latency includes that round trip). Commands with a `message`
//! option are handed to the deferred responder; the HTTP adapter then
//! returns an empty acknowledgement since the reply is delivered
//! asynchronously.

use crate::commands::CommandSpec;
use crate::discord::DiscordClient;
use crate::interactions::{
    Interaction, InteractionResponse, TriggerEvent, TriggerResponse, INTERACTION_APPLICATION_COMMAND,
    INTERACTION_PING,
};
use crate::responder::DeferredResponder;
use crate::verify::SignatureVerifier;
use std::sync::Arc;

/// Synchronous reply when the command is invoked without its text option.
pub const NO_MESSAGE_REPLY: &str = "no message provided.";

/// Shared state for webhook handling (verifier, platform client, responder).
#[derive(Clone)]
pub struct GatewayState {
    pub verifier: SignatureVerifier,
    pub discord: Arc<DiscordClient>,
    pub responder: Arc<DeferredResponder>,
    pub commands: Arc<Vec<CommandSpec>>,
    pub guild_id: String,
    pub port: u16,
}

/// Outcome of one inbound event.
#[derive(Debug)]
pub enum HandlerReply {
    /// Raw response in the hosting environment's shape (rejections).
    Raw(TriggerResponse),
    /// Bare interaction response object (pong, synchronous command reply).
    Interaction(InteractionResponse),
    /// Already handled asynchronously (deferred command) or deliberately
    /// ignored (unsupported interaction type); the adapter returns 202.
    Accepted,
}

/// Route one trigger event through verification and interaction handling.
pub async fn handle_event(state: &GatewayState, event: TriggerEvent) -> HandlerReply {
    let signature = event.header("x-signature-ed25519");
    let timestamp = event.header("x-signature-timestamp");
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        log::debug!("request is missing signature headers");
        return HandlerReply::Raw(TriggerResponse::unauthorized());
    };
    if !state.verifier.verify(signature, timestamp, &event.body) {
        return HandlerReply::Raw(TriggerResponse::unauthorized());
    }

    let interaction: Interaction = match serde_json::from_str(&event.body) {
        Ok(i) => i,
        Err(e) => {
            log::warn!("verified request carried a malformed interaction payload: {}", e);
            return HandlerReply::Raw(TriggerResponse::bad_request());
        }
    };

    match interaction.kind {
        INTERACTION_PING => {
            if let Err(e) = state
                .discord
                .register_commands(&state.guild_id, &state.commands)
                .await
            {
                log::error!("command registration failed during handshake: {}", e);
                return HandlerReply::Raw(TriggerResponse::server_error());
            }
            HandlerReply::Interaction(InteractionResponse::pong())
        }
        INTERACTION_APPLICATION_COMMAND => {
            let opts = interaction
                .data
                .as_ref()
                .map(|d| d.options_map())
                .unwrap_or_default();
            match opts.get("message") {
                None => HandlerReply::Interaction(InteractionResponse::message(NO_MESSAGE_REPLY)),
                Some(text) => {
                    state
                        .responder
                        .dispatch(
                            &interaction.id,
                            &interaction.token,
                            interaction.channel_id.as_deref(),
                            text,
                        )
                        .await;
                    HandlerReply::Accepted
                }
            }
        }
        other => {
            // Not part of the supported surface; acknowledged without action.
            log::debug!("ignoring interaction type {}", other);
            HandlerReply::Accepted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::DirectCompletion;
    use crate::interactions::{RESPONSE_CHANNEL_MESSAGE, RESPONSE_PONG};
    use crate::llm::OpenAiClient;
    use crate::worker::TaskPool;
    use ed25519_dalek::{Signer, SigningKey};
    use std::collections::HashMap;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn test_state() -> GatewayState {
        let verifier = SignatureVerifier::from_hex(&hex::encode(
            signing_key().verifying_key().to_bytes(),
        ))
        .unwrap();
        let discord = Arc::new(DiscordClient::new(
            Some("http://127.0.0.1:9".to_string()),
            "bot-token",
            "app-1",
        ));
        let engine = Arc::new(DirectCompletion::new(
            OpenAiClient::new(None, None),
            "gpt-4o",
            0.5,
            None,
        ));
        let responder = Arc::new(DeferredResponder::new(
            discord.clone(),
            engine,
            TaskPool::new(1),
            "Thinking...",
        ));
        GatewayState {
            verifier,
            discord,
            responder,
            commands: Arc::new(vec![crate::commands::ask_command("ask")]),
            guild_id: "guild-1".to_string(),
            port: 0,
        }
    }

    fn signed_event(body: &str) -> TriggerEvent {
        let timestamp = "1700000000";
        let message = format!("{}{}", timestamp, body);
        let signature = hex::encode(signing_key().sign(message.as_bytes()).to_bytes());
        let mut headers = HashMap::new();
        // mixed casing on purpose: lookup must normalize
        headers.insert("X-Signature-Ed25519".to_string(), signature);
        headers.insert("X-Signature-Timestamp".to_string(), timestamp.to_string());
        TriggerEvent::new(headers, body)
    }

    #[tokio::test]
    async fn missing_headers_reject_with_401() {
        let state = test_state();
        let event = TriggerEvent::new(HashMap::new(), r#"{"type":1}"#);
        match handle_event(&state, event).await {
            HandlerReply::Raw(res) => {
                assert_eq!(res.status_code, 401);
                assert_eq!(res.body, "");
            }
            other => panic!("expected raw 401, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_signature_rejects_with_401() {
        let state = test_state();
        let mut event = signed_event(r#"{"type":1}"#);
        event.body = r#"{"type":2}"#.to_string();
        match handle_event(&state, event).await {
            HandlerReply::Raw(res) => assert_eq!(res.status_code, 401),
            other => panic!("expected raw 401, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_payload_rejects_with_400() {
        let state = test_state();
        let event = signed_event("not json at all");
        match handle_event(&state, event).await {
            HandlerReply::Raw(res) => assert_eq!(res.status_code, 400),
            other => panic!("expected raw 400, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn command_without_message_replies_synchronously() {
        let state = test_state();
        let event = signed_event(r#"{"type":2,"id":"1","token":"t","data":{"name":"ask"}}"#);
        match handle_event(&state, event).await {
            HandlerReply::Interaction(res) => {
                assert_eq!(res.kind, RESPONSE_CHANNEL_MESSAGE);
                assert_eq!(res.data.unwrap().content, NO_MESSAGE_REPLY);
            }
            other => panic!("expected interaction response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_interaction_type_is_a_no_op() {
        let state = test_state();
        let event = signed_event(r#"{"type":99,"id":"1","token":"t"}"#);
        assert!(matches!(
            handle_event(&state, event).await,
            HandlerReply::Accepted
        ));
    }

    #[tokio::test]
    async fn ping_with_unreachable_registrar_aborts() {
        // the discord client points at a closed port, so registration fails
        let state = test_state();
        let event = signed_event(r#"{"type":1}"#);
        match handle_event(&state, event).await {
            HandlerReply::Raw(res) => assert_eq!(res.status_code, 500),
            HandlerReply::Interaction(res) => {
                panic!("pong despite failed registration: type {}", res.kind)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pong_constant_matches_wire_code() {
        assert_eq!(InteractionResponse::pong().kind, RESPONSE_PONG);
    }
}
