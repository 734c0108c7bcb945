//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.quill/config.json`) and
//! environment. Credentials may live in the file or in environment variables;
//! the `resolve_*` helpers apply the env override consistently.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Discord application settings (tokens, ids, command name).
    #[serde(default)]
    pub discord: DiscordConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Vector-retrieval settings (retrieval-augmented answer mode).
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Answer engine selection and texts.
    #[serde(default)]
    pub answer: AnswerConfig,
}

/// Gateway bind, port, and worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook endpoint (default 8787).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Max concurrent deferred answer tasks (default 5).
    #[serde(default = "default_gateway_workers")]
    pub workers: usize,
}

fn default_gateway_port() -> u16 {
    8787
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_workers() -> usize {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            workers: default_gateway_workers(),
        }
    }
}

/// Discord application config. All credentials can also come from env
/// (DISCORD_BOT_TOKEN, DISCORD_APPLICATION_ID, DISCORD_PUBLIC_KEY,
/// DISCORD_GUILD_ID), which takes precedence over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    /// Bot token for the platform API.
    pub bot_token: Option<String>,
    /// Application id (used in registration and follow-up URLs).
    pub application_id: Option<String>,
    /// Hex-encoded Ed25519 application public key for request verification.
    pub public_key: Option<String>,
    /// Guild the slash command is registered in.
    pub guild_id: Option<String>,
    /// Slash command name (default "ask").
    #[serde(default = "default_command_name")]
    pub command_name: String,
    /// Platform API base URL override (tests point this at a stub server).
    pub api_base: Option<String>,
}

fn default_command_name() -> String {
    "ask".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            application_id: None,
            public_key: None,
            guild_id: None,
            command_name: default_command_name(),
            api_base: None,
        }
    }
}

/// LLM provider config (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// API key. Overridden by OPENAI_API_KEY env when set. When neither is
    /// configured, the answer engine degrades to a fixed apology string.
    pub api_key: Option<String>,
    /// Chat model (default "gpt-4o").
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Sampling temperature (default 0.5).
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    /// Completion budget; also appended to direct prompts as a length
    /// constraint ("Answer within N tokens."). Unset disables both.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: Option<u32>,
    /// Provider base URL override (default https://api.openai.com/v1).
    pub base_url: Option<String>,
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_temperature() -> f32 {
    0.5
}

fn default_llm_max_tokens() -> Option<u32> {
    Some(256)
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            base_url: None,
        }
    }
}

/// Vector store config for the retrieval-augmented answer mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Index endpoint URL (the store's query API root for one index).
    pub index_url: Option<String>,
    /// Store API key. Overridden by VECTOR_STORE_API_KEY env when set.
    pub api_key: Option<String>,
    /// Number of passages fetched per query (default 4).
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Embedding model used to vectorize queries.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_top_k() -> u32 {
    4
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_url: None,
            api_key: None,
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
        }
    }
}

/// Conversation memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    /// Seconds a conversation session lives without being touched (default 3600).
    #[serde(default = "default_memory_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_memory_ttl_secs() -> u64 {
    3600
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_memory_ttl_secs(),
        }
    }
}

/// Which answer strategy handles command text: direct single-turn completion,
/// or retrieval-augmented completion with conversation memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerMode {
    #[default]
    Direct,
    Retrieval,
}

/// Answer engine selection and user-visible placeholder text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerConfig {
    /// Strategy: "direct" (default) or "retrieval".
    #[serde(default)]
    pub mode: AnswerMode,
    /// Placeholder sent with the deferred acknowledgement.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "Thinking about your question...".to_string()
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            mode: AnswerMode::default(),
            placeholder: default_placeholder(),
        }
    }
}

fn env_or(var: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            file_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the bot token: env DISCORD_BOT_TOKEN overrides config.
pub fn resolve_bot_token(config: &Config) -> Option<String> {
    env_or("DISCORD_BOT_TOKEN", config.discord.bot_token.as_ref())
}

/// Resolve the application id: env DISCORD_APPLICATION_ID overrides config.
pub fn resolve_application_id(config: &Config) -> Option<String> {
    env_or(
        "DISCORD_APPLICATION_ID",
        config.discord.application_id.as_ref(),
    )
}

/// Resolve the application public key: env DISCORD_PUBLIC_KEY overrides config.
pub fn resolve_public_key(config: &Config) -> Option<String> {
    env_or("DISCORD_PUBLIC_KEY", config.discord.public_key.as_ref())
}

/// Resolve the command guild id: env DISCORD_GUILD_ID overrides config.
pub fn resolve_guild_id(config: &Config) -> Option<String> {
    env_or("DISCORD_GUILD_ID", config.discord.guild_id.as_ref())
}

/// Resolve the LLM API key: env OPENAI_API_KEY overrides config.
pub fn resolve_llm_api_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.llm.api_key.as_ref())
}

/// Resolve the vector store API key: env VECTOR_STORE_API_KEY overrides config.
pub fn resolve_vector_store_api_key(config: &Config) -> Option<String> {
    env_or("VECTOR_STORE_API_KEY", config.retrieval.api_key.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("QUILL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".quill").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or QUILL_CONFIG_PATH). Missing file =>
/// default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_bind_and_workers() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8787);
        assert_eq!(g.bind, "127.0.0.1");
        assert_eq!(g.workers, 5);
    }

    #[test]
    fn empty_json_produces_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.discord.command_name, "ask");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, Some(256));
        assert_eq!(config.answer.mode, AnswerMode::Direct);
        assert_eq!(config.memory.ttl_secs, 3600);
    }

    #[test]
    fn answer_mode_parses_camel_case() {
        let config: Config = serde_json::from_str(r#"{"answer": {"mode": "retrieval"}}"#).unwrap();
        assert_eq!(config.answer.mode, AnswerMode::Retrieval);
    }

    #[test]
    fn file_credentials_resolve_and_trim() {
        let mut config = Config::default();
        config.discord.guild_id = Some("  guild-1  ".to_string());
        std::env::remove_var("DISCORD_GUILD_ID");
        assert_eq!(resolve_guild_id(&config).as_deref(), Some("guild-1"));
    }
}
