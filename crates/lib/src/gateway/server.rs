//! Gateway HTTP server: the webhook endpoint plus a health probe.

use crate::answer::answer_engine_from_config;
use crate::commands::ask_command;
use crate::config::{self, Config};
use crate::discord::DiscordClient;
use crate::gateway::handler::{handle_event, GatewayState, HandlerReply};
use crate::interactions::TriggerEvent;
use crate::responder::DeferredResponder;
use crate::verify::SignatureVerifier;
use crate::worker::TaskPool;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM), then awaits in-flight deferred
/// answers before returning so none are dropped mid-delivery.
pub async fn run_gateway(config: Config) -> Result<()> {
    let public_key = config::resolve_public_key(&config)
        .context("discord.publicKey (or DISCORD_PUBLIC_KEY) is required")?;
    let bot_token = config::resolve_bot_token(&config)
        .context("discord.botToken (or DISCORD_BOT_TOKEN) is required")?;
    let application_id = config::resolve_application_id(&config)
        .context("discord.applicationId (or DISCORD_APPLICATION_ID) is required")?;
    let guild_id = config::resolve_guild_id(&config)
        .context("discord.guildId (or DISCORD_GUILD_ID) is required")?;

    let verifier = SignatureVerifier::from_hex(&public_key)?;
    let discord = Arc::new(DiscordClient::new(
        config.discord.api_base.clone(),
        bot_token,
        application_id,
    ));
    let engine = answer_engine_from_config(&config)?;
    let pool = TaskPool::new(config.gateway.workers);
    let responder = Arc::new(DeferredResponder::new(
        discord.clone(),
        engine,
        pool,
        config.answer.placeholder.clone(),
    ));
    let commands = Arc::new(vec![ask_command(&config.discord.command_name)]);

    let state = GatewayState {
        verifier,
        discord,
        responder: responder.clone(),
        commands,
        guild_id,
        port: config.gateway.port,
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/interactions", post(interactions_http))
        .with_state(state);

    let bind_addr = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;

    log::info!("shutdown: draining deferred answer tasks");
    responder.drain().await;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// POST /interactions — the webhook endpoint. The raw body and headers are
/// wrapped as a trigger event; the reply shape depends on the handler outcome.
async fn interactions_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut header_map = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            header_map.insert(name.as_str().to_string(), v.to_string());
        }
    }
    let event = TriggerEvent::new(header_map, body);

    match handle_event(&state, event).await {
        HandlerReply::Raw(res) => {
            let status =
                StatusCode::from_u16(res.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, res.body).into_response()
        }
        HandlerReply::Interaction(res) => Json(res).into_response(),
        HandlerReply::Accepted => StatusCode::ACCEPTED.into_response(),
    }
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}
