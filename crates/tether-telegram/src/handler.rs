// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram messages into transport-neutral [`ChatMessage`]s.

use teloxide::prelude::*;
use teloxide::types::ChatKind;

use tether_core::{ChatId, ChatMessage, SenderName};

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Display name of the sender; empty when the message has none (channel posts).
pub fn sender_name(msg: &Message) -> SenderName {
    msg.from
        .as_ref()
        .map(|user| SenderName {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone().unwrap_or_default(),
            username: user.username.clone(),
        })
        .unwrap_or_default()
}

/// Text messages become [`ChatMessage`]s; everything else is `None`.
pub fn to_chat_message(msg: &Message) -> Option<ChatMessage> {
    let text = msg.text()?;
    Some(ChatMessage {
        chat: ChatId(msg.chat.id.0),
        message_id: msg.id.0,
        sender: sender_name(msg),
        text: text.to_string(),
        private: is_dm(msg),
    })
}
