// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport traits (Telegram, test doubles).

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::{BotCommandSpec, ChatId, ChatMessage, ParseMode};

/// Outbound side of a chat transport.
///
/// Callers treat sends as fire-and-forget: failures are logged, not propagated
/// into the session state machine.
#[async_trait]
pub trait MessageSender: Send + Sync + 'static {
    /// Sends `text` to `chat` using the given formatting mode.
    async fn send(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<(), TetherError>;

    /// Publishes the command menu shown by the chat client.
    async fn set_commands(&self, commands: &[BotCommandSpec]) -> Result<(), TetherError>;
}

/// Inbound side of a chat transport: a lazy, non-restartable stream of messages.
#[async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    /// Receives the next inbound message.
    ///
    /// Returns `Ok(None)` once the stream is closed.
    async fn receive(&self) -> Result<Option<ChatMessage>, TetherError>;
}
