//! Platform API client: command registration and the two-phase reply calls.

use crate::commands::CommandSpec;
use crate::interactions::InteractionResponse;

const DEFAULT_API_BASE: &str = "https://discord.com/api/v8";
const USER_AGENT: &str = "quill-gateway";

/// Client for the platform HTTP API (registration, deferred callback,
/// follow-up edit). Base URL is overridable so tests can point at a stub.
#[derive(Clone)]
pub struct DiscordClient {
    base_url: String,
    bot_token: String,
    application_id: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("discord request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("discord api error: {0}")]
    Api(String),
}

impl DiscordClient {
    pub fn new(
        base_url: Option<String>,
        bot_token: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            base_url,
            bot_token: bot_token.into(),
            application_id: application_id.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<(), DiscordError> {
        let res = self
            .client
            .post(url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DiscordError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }

    /// POST /applications/{appId}/guilds/{guildId}/commands — declare each
    /// command. Safe to repeat; the platform upserts by command name.
    pub async fn register_commands(
        &self,
        guild_id: &str,
        commands: &[CommandSpec],
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.base_url, self.application_id, guild_id
        );
        log::info!("registering {} command(s): {}", commands.len(), url);
        for command in commands {
            let body = serde_json::to_value(command)
                .map_err(|e| DiscordError::Api(format!("encoding command descriptor: {}", e)))?;
            self.post_json(&url, &body).await?;
        }
        Ok(())
    }

    /// POST /interactions/{id}/{token}/callback — immediate deferred
    /// acknowledgement (`{"type": 5}` with placeholder content).
    pub async fn create_deferred_response(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        placeholder: &str,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.base_url, interaction_id, interaction_token
        );
        let body = serde_json::to_value(InteractionResponse::deferred(placeholder))
            .map_err(|e| DiscordError::Api(format!("encoding deferred response: {}", e)))?;
        self.post_json(&url, &body).await
    }

    /// PATCH /webhooks/{appId}/{token}/messages/@original — final delivery,
    /// editing the placeholder into the answer.
    pub async fn edit_original_response(
        &self,
        interaction_token: &str,
        content: &str,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.base_url, self.application_id, interaction_token
        );
        let body = serde_json::json!({ "content": content });
        let res = self
            .client
            .patch(&url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DiscordError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}
