mod api;
mod commands;
mod dialogue;
mod gateway;

use clap::{Parser, Subcommand};
use stride_channels::telegram::TgClient;
use stride_core::config;
use stride_store::Store;

#[derive(Parser)]
#[command(name = "stride", version, about = "Stride — goal tracker Telegram bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Show the effective configuration.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            if cfg.telegram.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram bot_token is empty. Set it in config.toml or the \
                     TELEGRAM_BOT_TOKEN env var."
                );
            }

            let store = Store::new(&cfg.store).await?;
            let client = TgClient::new(&cfg.telegram.bot_token);

            if cfg.api.enabled {
                let state =
                    api::ApiState::new(store.clone(), client.clone(), cfg.api.api_key.clone());
                tokio::spawn(api::serve(state, cfg.api.bind.clone()));
            }

            let mut gw = gateway::Gateway::new(client, store, &cfg);
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Stride — Status\n");
            println!("Config: {}", cli.config);
            println!(
                "  telegram: {}",
                if cfg.telegram.bot_token.is_empty() {
                    "missing bot_token"
                } else {
                    "configured"
                }
            );
            println!("  store: {}", cfg.store.db_path);
            println!(
                "  api: {}",
                if cfg.api.enabled {
                    cfg.api.bind.as_str()
                } else {
                    "disabled"
                }
            );
            println!(
                "  dialogue expiry: {}",
                if cfg.dialogue.idle_timeout_secs > 0 {
                    format!("{}s", cfg.dialogue.idle_timeout_secs)
                } else {
                    "off".to_string()
                }
            );
        }
    }

    Ok(())
}
