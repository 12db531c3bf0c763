// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the session engine and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat the bot participates in.
///
/// Stable for the lifetime of the chat and the only key into the session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Verified subject identifier of a user (ISU number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access role of a stored user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unspecified,
    User,
    Admin,
    ReadOnlyAdmin,
}

/// A user record owned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone_number: Option<String>,
    pub role: Role,
}

/// Display name of the person who sent a chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderName {
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
}

impl SenderName {
    /// "First Last", without trailing whitespace when the last name is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An inbound chat message delivered by the update source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub chat: ChatId,
    pub message_id: i32,
    pub sender: SenderName,
    pub text: String,
    /// Whether the message was sent in a one-to-one chat with the bot.
    pub private: bool,
}

impl ChatMessage {
    /// Parses the leading `/command` of the message text, if any.
    pub fn command(&self) -> Option<CommandInvocation> {
        CommandInvocation::parse(&self.text)
    }

    /// Returns `true` when the message invokes the given command name.
    pub fn is_command(&self, name: &str) -> bool {
        self.command().is_some_and(|c| c.name == name)
    }
}

/// A command name and its arguments, split on the first whitespace after the slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub args: String,
}

impl CommandInvocation {
    /// Parses `/name[@bot] args...`.
    ///
    /// Returns `None` when the text does not start with a slash or the name is empty.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        // Group chats address commands as /name@botname.
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            args: args.to_string(),
        })
    }
}

/// Formatting mode for outbound text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    Html,
    Markdown,
    MarkdownV2,
}

/// An entry of the command menu published to the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommandSpec {
    pub command: String,
    pub description: String,
}

impl BotCommandSpec {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Claims produced by a successful identity verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// Stable subject identifier used as the user id.
    pub subject: UserId,
    /// Raw OIDC `sub` claim.
    pub sub: String,
}
