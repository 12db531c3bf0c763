// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tether integration tests.
//!
//! In-memory stand-ins for the chat platform, the identity provider, and user
//! storage, so session tests run without network or disk.
//!
//! # Components
//!
//! - [`MockSender`] - records outbound messages and menus
//! - [`MockUpdates`] - inbound update stream fed by the test
//! - [`MockVerifier`] - identity provider with pre-registered codes
//! - [`MemoryUserStore`] - user storage backed by a map

pub mod memory_store;
pub mod mock_channel;
pub mod mock_identity;

pub use memory_store::MemoryUserStore;
pub use mock_channel::{MockSender, MockUpdates, SentMessage};
pub use mock_identity::MockVerifier;

use tether_core::{ChatId, ChatMessage, SenderName};

/// Build a private-chat text message from a sender with the given first name.
pub fn private_message(chat: i64, first_name: &str, text: &str) -> ChatMessage {
    ChatMessage {
        chat: ChatId(chat),
        message_id: 1,
        sender: SenderName {
            first_name: first_name.to_string(),
            last_name: String::new(),
            username: None,
        },
        text: text.to_string(),
        private: true,
    }
}

/// Same as [`private_message`] but from a group chat.
pub fn group_message(chat: i64, first_name: &str, text: &str) -> ChatMessage {
    ChatMessage {
        private: false,
        ..private_message(chat, first_name, text)
    }
}
