//! Bio Check Bot - Main Entry Point
//!
//! A Telegram bot that bulk-checks WhatsApp bios through a WhatsApp bridge.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bio_check_bot::access::{AccessPolicy, AccessStore};
use bio_check_bot::check::BioChecker;
use bio_check_bot::commands::CommandHandler;
use bio_check_bot::config::{BotSettings, TelegramConfig, WhatsAppConfig};
use bio_check_bot::telegram::{AppState, run_polling, watch_connection};
use bio_check_bot::whatsapp::{
    ConnectionMonitor, ConnectionTracker, GatewayClient, MessagingClient, MonitorMessage,
};

/// Telegram bot for bulk WhatsApp bio checks.
#[derive(Parser, Debug)]
#[command(name = "bio_check_bot")]
#[command(about = "Bulk-check WhatsApp bios from Telegram")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    let wa_config = WhatsAppConfig::from_env_with_defaults();
    let settings = BotSettings::from_env_with_defaults();

    if tg_config.owner_id == 0 {
        warn!("OWNER_ID is not set, owner commands are disabled");
    }

    let store = AccessStore::in_dir(&settings.data_dir);
    info!(
        "Premium allowlist: {} ({} id(s))",
        store.path().display(),
        store.load().len()
    );

    let tracker = ConnectionTracker::default();
    let connection_rx = tracker.subscribe();
    let gateway = Arc::new(
        GatewayClient::new(&wa_config, tracker.clone())
            .context("Failed to create WhatsApp bridge client")?,
    );
    info!("WhatsApp bridge: {}", wa_config.gateway_url);

    let monitor = ConnectionMonitor::new(gateway.clone(), tracker)
        .with_poll_interval(wa_config.poll_interval())
        .with_reconnect_delay(wa_config.reconnect_delay());
    let (monitor_tx, monitor_rx) = mpsc::channel::<MonitorMessage>(8);
    let monitor_handle = tokio::spawn(async move {
        monitor.run(monitor_rx).await;
    });

    let client: Arc<dyn MessagingClient> = gateway;
    let checker = BioChecker::new(Arc::clone(&client), &settings.check);

    let bot = Bot::new(tg_config.bot_token.clone());
    let username = match bot.get_me().await {
        Ok(me) => {
            info!("Logged in as @{}", me.username());
            me.user.username.clone()
        }
        Err(e) => {
            warn!("Could not fetch bot profile: {}", e);
            None
        }
    };

    let watcher_handle = (tg_config.owner_id != 0).then(|| {
        tokio::spawn(watch_connection(
            bot.clone(),
            ChatId(tg_config.owner_id),
            connection_rx,
        ))
    });

    let handler = CommandHandler::new(
        AccessPolicy::new(tg_config.owner_id, store),
        client,
    )
    .with_bot_username(username);

    let state = Arc::new(AppState {
        handler,
        checker,
        settings,
        max_document_bytes: tg_config.max_document_bytes,
    });

    info!("Bot is running. Use Ctrl+C to stop.");
    let result = run_polling(bot, state).await;

    info!("Shutting down...");
    let _ = monitor_tx.send(MonitorMessage::Shutdown).await;
    let _ = monitor_handle.await;
    if let Some(handle) = watcher_handle {
        handle.abort();
    }

    result.context("Telegram polling failed")
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
