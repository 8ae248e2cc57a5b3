use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storefront::action::Command;
use storefront::bot::{self, SessionStorage, SharedRouter};
use storefront::catalog::CatalogStore;
use storefront::config::AppConfig;
use storefront::router::Router;
use storefront::storage::JsonCatalogFile;

/// `RUST_LOG` filters (default `info`), `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting storefront bot");

    let config = AppConfig::from_env()?;

    info!(path = %config.catalog_path.display(), "Loading catalog");
    let catalog = CatalogStore::open(JsonCatalogFile::new(&config.catalog_path))
        .context("Failed to load catalog")?;

    let router: SharedRouter = Arc::new(Mutex::new(Router::new(config.bot, catalog)));
    let sessions = SessionStorage::new();

    let bot = Bot::new(config.bot_token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(bot::command_handler),
                )
                .branch(dptree::endpoint(bot::message_handler)),
        )
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router, sessions])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}
