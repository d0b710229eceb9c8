//! Discord bot adapter: channel notifications over REST and the `/stock`
//! slash command over the gateway websocket.

use crate::channels::traits::{DeferredReply, Notifier};
use crate::command::answer_stock_command;
use crate::config::DiscordConfig;
use crate::dispatcher::Dispatcher;
use crate::error::StockError;
use crate::notify::{MAX_MESSAGE_CHARS, clamp_to_limit};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Discord REST API root.
pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const COMMAND_DESCRIPTION: &str = "Get the latest garden gear, seeds, eggs, and weather.";

/// `GUILDS` is the only intent interactions need.
const GATEWAY_INTENTS: u64 = 1;

/// Interaction type for slash commands.
const APPLICATION_COMMAND: u64 = 2;

/// "Thinking…" response; the real answer follows as an edit.
const DEFERRED_CHANNEL_MESSAGE: u64 = 5;

/// Discord channel adapter using the official gateway websocket + REST API.
pub struct DiscordAdapter {
    bot_token: String,
    channel_id: Option<String>,
    guild_id: Option<String>,
    command_name: String,
    api_base: String,
    client: reqwest::Client,
}

impl DiscordAdapter {
    /// # Errors
    ///
    /// Returns [`StockError::Config`] if no bot token is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &DiscordConfig, timeout: Duration) -> crate::Result<Self> {
        let bot_token = config
            .token()
            .ok_or_else(|| StockError::Config("discord bot token is empty".to_owned()))?
            .to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Config(format!("failed to build discord client: {e}")))?;
        Ok(Self {
            bot_token,
            channel_id: config.channel_id.clone(),
            guild_id: config.guild_id.clone(),
            command_name: config.command_name.clone(),
            api_base: DISCORD_API_BASE.to_owned(),
            client,
        })
    }

    /// Point REST calls at another API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    /// Register the stock command, in the configured guild or globally.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Send`] if Discord rejects the registration.
    pub async fn register_command(&self, application_id: &str) -> crate::Result<()> {
        let url = match &self.guild_id {
            Some(guild) => format!(
                "{}/applications/{application_id}/guilds/{guild}/commands",
                self.api_base
            ),
            None => format!("{}/applications/{application_id}/commands", self.api_base),
        };
        let body = json!([{
            "name": self.command_name,
            "description": COMMAND_DESCRIPTION,
            "type": 1
        }]);
        let response = self
            .client
            .put(&url)
            .header("Authorization", self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| StockError::Send(format!("command registration failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Send(format!(
                "command registration failed ({status}): {body}"
            )));
        }
        tracing::info!(
            command = %self.command_name,
            scope = if self.guild_id.is_some() { "guild" } else { "global" },
            "slash command registered"
        );
        Ok(())
    }

    /// Connect to the gateway and answer stock commands until the socket drops.
    ///
    /// Always returns an error; the caller restarts it with backoff.
    pub async fn run(&self, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
        let gateway_resp: Value = self
            .client
            .get(format!("{}/gateway/bot", self.api_base))
            .header("Authorization", self.authorization())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let gateway_url = gateway_resp
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or("wss://gateway.discord.gg");
        let ws_url = format!("{gateway_url}/?v=10&encoding=json");

        let (stream, _) = tokio_tungstenite::connect_async(&ws_url).await?;
        let (mut write, mut read) = stream.split();

        let hello = read
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("no hello"))??;
        let hello_text = match hello {
            Message::Text(text) => text.to_string(),
            _ => anyhow::bail!("unexpected discord hello payload"),
        };
        let hello_json: Value = serde_json::from_str(&hello_text)?;
        let heartbeat_interval_ms = hello_json
            .get("d")
            .and_then(|v| v.get("heartbeat_interval"))
            .and_then(Value::as_u64)
            .unwrap_or(41_250);

        let identify = json!({
            "op": 2,
            "d": {
                "token": self.bot_token,
                "intents": GATEWAY_INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "garden-stock",
                    "device": "garden-stock"
                }
            }
        });
        write.send(Message::Text(identify.to_string())).await?;

        let (hb_tx, mut hb_rx) = mpsc::channel::<()>(1);
        let heartbeat_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(heartbeat_interval_ms));
            loop {
                interval.tick().await;
                if hb_tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        let _heartbeat_guard = AbortOnDrop(heartbeat_task);

        let mut sequence: Option<u64> = None;
        loop {
            tokio::select! {
                _ = hb_rx.recv() => {
                    let heartbeat = json!({"op": 1, "d": sequence});
                    if write.send(Message::Text(heartbeat.to_string())).await.is_err() {
                        anyhow::bail!("discord heartbeat failed");
                    }
                }
                maybe_msg = read.next() => {
                    let raw = match maybe_msg {
                        Some(Ok(Message::Text(text))) => text.to_string(),
                        Some(Ok(Message::Close(_))) | None => {
                            anyhow::bail!("discord websocket closed");
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => anyhow::bail!("discord websocket error: {err}"),
                    };

                    let Ok(payload) = serde_json::from_str::<Value>(&raw) else {
                        continue;
                    };
                    if let Some(s) = payload.get("s").and_then(Value::as_u64) {
                        sequence = Some(s);
                    }

                    match payload.get("op").and_then(Value::as_u64) {
                        Some(1) => {
                            let heartbeat = json!({"op": 1, "d": sequence});
                            write.send(Message::Text(heartbeat.to_string())).await?;
                            continue;
                        }
                        Some(7) => anyhow::bail!("discord requested reconnect"),
                        Some(9) => anyhow::bail!("discord invalidated the session"),
                        _ => {}
                    }

                    let event_name = payload.get("t").and_then(Value::as_str).unwrap_or_default();
                    let Some(data) = payload.get("d") else {
                        continue;
                    };
                    match event_name {
                        "READY" => self.on_ready(data).await,
                        "INTERACTION_CREATE" => self.on_interaction(data, &dispatcher),
                        _ => {}
                    }
                }
            }
        }
    }

    async fn on_ready(&self, data: &Value) {
        let Some(ready) = parse_ready(data) else {
            tracing::warn!("discord READY without application id");
            return;
        };
        tracing::info!(user = %ready.user_name, "discord gateway ready");
        if let Err(e) = self.register_command(&ready.application_id).await {
            tracing::error!(error = %e, "failed to register slash command");
        }
    }

    fn on_interaction(&self, data: &Value, dispatcher: &Arc<Dispatcher>) {
        let Some(invocation) = parse_command_invocation(data) else {
            return;
        };
        if invocation.name != self.command_name {
            tracing::debug!(command = %invocation.name, "ignoring unknown command");
            return;
        }
        tracing::info!(command = %invocation.name, "stock command received");

        let reply = InteractionReply {
            client: self.client.clone(),
            api_base: self.api_base.clone(),
            invocation,
        };
        let dispatcher = Arc::clone(dispatcher);
        tokio::spawn(async move {
            if let Err(e) = answer_stock_command(&dispatcher, Box::new(reply)).await {
                tracing::error!(error = %e, "failed to answer stock command");
            }
        });
    }
}

#[async_trait]
impl Notifier for DiscordAdapter {
    fn id(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, content: &str) -> crate::Result<()> {
        let channel_id = self
            .channel_id
            .as_deref()
            .ok_or_else(|| StockError::Send("discord channel id is not configured".to_owned()))?;
        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        let body = json!({
            "content": clamp_to_limit(content, MAX_MESSAGE_CHARS)
        });
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| StockError::Send(format!("discord request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Send(format!(
                "discord send failed ({status}): {body}"
            )));
        }
        Ok(())
    }
}

struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadyEvent {
    application_id: String,
    user_name: String,
}

fn parse_ready(data: &Value) -> Option<ReadyEvent> {
    let application_id = data
        .get("application")
        .and_then(|a| a.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())?;
    let user_name = data
        .get("user")
        .and_then(|u| u.get("username"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Some(ReadyEvent {
        application_id: application_id.to_owned(),
        user_name: user_name.to_owned(),
    })
}

/// The parts of an `INTERACTION_CREATE` needed to answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandInvocation {
    id: String,
    token: String,
    application_id: String,
    name: String,
}

fn parse_command_invocation(data: &Value) -> Option<CommandInvocation> {
    if data.get("type").and_then(Value::as_u64) != Some(APPLICATION_COMMAND) {
        return None;
    }
    let field = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_owned);
    Some(CommandInvocation {
        id: field(data.get("id"))?,
        token: field(data.get("token"))?,
        application_id: field(data.get("application_id"))?,
        name: field(data.get("data").and_then(|d| d.get("name")))?,
    })
}

/// Deferred reply for one slash command interaction.
struct InteractionReply {
    client: reqwest::Client,
    api_base: String,
    invocation: CommandInvocation,
}

impl InteractionReply {
    async fn check(response: reqwest::Response, what: &str) -> crate::Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(StockError::Send(format!("{what} failed ({status}): {body}")))
    }
}

#[async_trait]
impl DeferredReply for InteractionReply {
    async fn acknowledge(&mut self) -> crate::Result<()> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.api_base, self.invocation.id, self.invocation.token
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({"type": DEFERRED_CHANNEL_MESSAGE}))
            .send()
            .await
            .map_err(|e| StockError::Send(format!("interaction callback failed: {e}")))?;
        Self::check(response, "interaction callback").await
    }

    async fn complete(self: Box<Self>, content: String) -> crate::Result<()> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.invocation.application_id, self.invocation.token
        );
        let response = self
            .client
            .patch(&url)
            .json(&json!({"content": clamp_to_limit(&content, MAX_MESSAGE_CHARS)}))
            .send()
            .await
            .map_err(|e| StockError::Send(format!("interaction edit failed: {e}")))?;
        Self::check(response, "interaction edit").await
    }
}
