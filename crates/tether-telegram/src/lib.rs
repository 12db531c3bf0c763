// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the Tether chat bot.
//!
//! Long polling runs on its own task and feeds text messages into a channel
//! read through [`UpdateSource`]. Outbound text goes through the Bot API
//! with the requested parse mode.

pub mod handler;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, ChatId as TgChatId, ParseMode as TgParseMode, Recipient,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tether_config::model::TelegramConfig;
use tether_core::{
    BotCommandSpec, ChatId, ChatMessage, MessageSender, ParseMode, TetherError, UpdateSource,
};

const INBOUND_CAPACITY: usize = 100;

fn channel_err(message: &str, e: teloxide::RequestError) -> TetherError {
    TetherError::Channel {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<ChatMessage>>,
    /// Handed to the polling task on `connect`; the receiver sees the end of
    /// the stream once that task finishes.
    inbound_tx: Option<mpsc::Sender<ChatMessage>>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Result<Self, TetherError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            TetherError::Config("telegram.bot_token is required (or TELEGRAM_BOT_API)".into())
        })?;

        if token.trim().is_empty() {
            return Err(TetherError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            polling_handle: None,
        })
    }

    /// Start long polling. Calling it again is a no-op.
    pub fn connect(&mut self) {
        let Some(tx) = self.inbound_tx.take() else {
            return;
        };
        let bot = self.bot.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let schema = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    match handler::to_chat_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => debug!(msg_id = msg.id.0, "ignoring non-text message"),
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, schema)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
            warn!("Telegram long polling stopped");
        });

        self.polling_handle = Some(handle);
    }
}

impl Drop for TelegramChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.polling_handle.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl MessageSender for TelegramChannel {
    async fn send(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<(), TetherError> {
        let request = self.bot.send_message(Recipient::Id(TgChatId(chat.0)), text);
        #[allow(deprecated)]
        let request = match mode {
            ParseMode::Plain => request,
            ParseMode::Html => request.parse_mode(TgParseMode::Html),
            ParseMode::Markdown => request.parse_mode(TgParseMode::Markdown),
            ParseMode::MarkdownV2 => request.parse_mode(TgParseMode::MarkdownV2),
        };
        request
            .await
            .map_err(|e| channel_err("failed to send message", e))?;
        Ok(())
    }

    async fn set_commands(&self, commands: &[BotCommandSpec]) -> Result<(), TetherError> {
        let commands: Vec<BotCommand> = commands
            .iter()
            .map(|c| BotCommand::new(c.command.clone(), c.description.clone()))
            .collect();
        self.bot
            .set_my_commands(commands)
            .await
            .map_err(|e| channel_err("failed to set command menu", e))?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramChannel {
    async fn receive(&self) -> Result<Option<ChatMessage>, TetherError> {
        Ok(self.inbound_rx.lock().await.recv().await)
    }
}
