//! Process configuration.
//!
//! Loaded from TOML (every section optional), then overlaid with the
//! `DISCORD_*` and `PORT` environment variables.

use crate::error::{Result, StockError};
use crate::scheduler::ScheduleConfig;
use garden_feed::FeedConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Webhook notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Discord-style webhook URL. Takes precedence over the bot channel.
    pub webhook_url: Option<String>,
    /// Timeout for each outbound send, in seconds.
    pub send_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            send_timeout_secs: 10,
        }
    }
}

/// Discord bot settings, used for channel messages and the slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub bot_token: Option<String>,
    /// Channel that receives notifications when no webhook is configured.
    pub channel_id: Option<String>,
    /// Register the command in this guild only. Global registration when unset.
    pub guild_id: Option<String>,
    pub command_name: String,
    /// Connect to the gateway and answer the command.
    pub register_commands: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            guild_id: None,
            command_name: "stock".to_owned(),
            register_commands: true,
        }
    }
}

impl DiscordConfig {
    /// Bot token, if set and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_owned(),
            port: 3001,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    pub feed: FeedConfig,
    pub schedule: ScheduleConfig,
    pub notify: NotifyConfig,
    pub discord: DiscordConfig,
    pub server: ServerConfig,
}

impl StockConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StockError::Config(e.to_string()))
    }

    /// Load `path` if given, else the default path when it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit or existing default file cannot be loaded.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Returns the default config file path: `~/.config/garden-stock/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("garden-stock").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("garden-stock")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/garden-stock/config.toml")
        }
    }

    /// Overlay values from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Config`] if `PORT` is not a valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("DISCORD_WEBHOOK_URL") {
            self.notify.webhook_url = Some(url);
        }
        if let Some(token) = var("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = Some(token);
        }
        if let Some(channel) = var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = Some(channel);
        }
        if let Some(guild) = var("DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(guild);
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| StockError::Config(format!("invalid PORT `{port}`: {e}")))?;
        }
        Ok(())
    }

    /// Reject values that would make the service misbehave.
    ///
    /// A missing notification target is not an error: cycles still run and
    /// the on-demand surfaces still answer.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.feed
            .validate()
            .map_err(|e| StockError::Config(e.to_string()))?;
        self.schedule.validate()?;
        if self.notify.send_timeout_secs == 0 {
            return Err(StockError::Config(
                "notify.send_timeout_secs must be greater than zero".to_owned(),
            ));
        }
        if let Some(url) = &self.notify.webhook_url {
            url::Url::parse(url)
                .map_err(|e| StockError::Config(format!("invalid webhook url: {e}")))?;
        }
        if self.discord.command_name.trim().is_empty() {
            return Err(StockError::Config(
                "discord.command_name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Whether any notification target is configured.
    pub fn has_notification_target(&self) -> bool {
        self.notify.webhook_url.is_some()
            || (self.discord.token().is_some() && self.discord.channel_id.is_some())
    }
}
