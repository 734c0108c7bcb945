use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill — Discord slash-command gateway for LLM answers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway (interactions endpoint + health probe).
    Serve {
        /// Config file path (default: QUILL_CONFIG_PATH or ~/.quill/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Webhook port (default from config or 8787)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Register the slash command with the platform once, outside a handshake.
    Register {
        /// Config file path (default: QUILL_CONFIG_PATH or ~/.quill/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the configured answer engine once from the terminal (no Discord).
    Ask {
        /// Config file path (default: QUILL_CONFIG_PATH or ~/.quill/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Question text, as it would arrive in the command's message option.
        message: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("quill {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Register { config }) => {
            if let Err(e) = run_register(config).await {
                log::error!("registration failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { config, message }) => {
            if let Err(e) = run_ask(config, message).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    lib::gateway::run_gateway(config).await
}

async fn run_register(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _path) = lib::config::load_config(config_path)?;
    let bot_token = lib::config::resolve_bot_token(&config)
        .context("discord.botToken (or DISCORD_BOT_TOKEN) is required")?;
    let application_id = lib::config::resolve_application_id(&config)
        .context("discord.applicationId (or DISCORD_APPLICATION_ID) is required")?;
    let guild_id = lib::config::resolve_guild_id(&config)
        .context("discord.guildId (or DISCORD_GUILD_ID) is required")?;

    let client = lib::discord::DiscordClient::new(
        config.discord.api_base.clone(),
        bot_token,
        application_id,
    );
    let commands = vec![lib::commands::ask_command(&config.discord.command_name)];
    client.register_commands(&guild_id, &commands).await?;
    println!(
        "registered command /{} in guild {}",
        config.discord.command_name, guild_id
    );
    Ok(())
}

async fn run_ask(
    config_path: Option<std::path::PathBuf>,
    message: String,
) -> anyhow::Result<()> {
    use lib::answer::AnswerStrategy as _;

    let (config, _path) = lib::config::load_config(config_path)?;
    let engine = lib::answer::answer_engine_from_config(&config)?;
    let ctx = lib::answer::AnswerContext {
        session_key: "cli".to_string(),
    };
    let answer = engine.answer(&ctx, &message).await?;
    println!("{}", answer);
    Ok(())
}
