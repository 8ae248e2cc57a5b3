//! # Configuration Module
//!
//! Static bot configuration: the admin allowlist and the contact buttons shown
//! under products, read from a JSON file, plus the file locations and bot
//! token resolved from the environment.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";
const TOKEN_PLACEHOLDER: &str = "TON_TOKEN_ICI";

/// Link button attached to product pages and the checkout screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactButton {
    pub text: String,
    pub url: String,
}

/// Content of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub admin_ids: HashSet<u64>,
    #[serde(default)]
    pub contact_buttons: Vec<ContactButton>,
}

impl BotConfig {
    /// Template written on first start
    pub fn template() -> Self {
        Self {
            bot_token: Some(TOKEN_PLACEHOLDER.to_string()),
            admin_ids: HashSet::new(),
            contact_buttons: vec![ContactButton {
                text: "📱 Contact".to_string(),
                url: "https://t.me/ton_username".to_string(),
            }],
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Read and validate the configuration file.
    ///
    /// A missing file is replaced by a template and reported as an error so the
    /// operator fills it in before the bot goes live.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let template = serde_json::to_string_pretty(&Self::template())?;
            fs::write(path, template)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            bail!(
                "No configuration found, a template was written to {}. Please fill it in.",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: BotConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;

        info!(
            admins = config.admin_ids.len(),
            contact_buttons = config.contact_buttons.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for button in &self.contact_buttons {
            Url::parse(&button.url)
                .with_context(|| format!("Invalid URL for contact button '{}'", button.text))?;
        }
        Ok(())
    }
}

/// Everything the binary needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub catalog_path: PathBuf,
    pub bot: BotConfig,
}

impl AppConfig {
    /// Resolve paths and token from the environment (`.env` is honoured by the caller)
    pub fn from_env() -> Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let catalog_path =
            env::var("CATALOG_PATH").unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string());

        let bot = BotConfig::load(Path::new(&config_path))?;
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .or_else(|| bot.bot_token.clone())
            .filter(|token| !token.is_empty() && token != TOKEN_PLACEHOLDER)
            .context("TELEGRAM_BOT_TOKEN must be set (environment or config file)")?;

        Ok(Self {
            bot_token,
            catalog_path: PathBuf::from(catalog_path),
            bot,
        })
    }
}
