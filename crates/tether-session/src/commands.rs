// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands and the table that publishes them.

use std::str::FromStr;
use std::sync::LazyLock;

use futures::TryStreamExt;
use regex::Regex;
use strum::{Display, EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr};

use tether_core::{BotCommandSpec, ChatMessage, ParseMode, User};

use crate::html;
use crate::session::{Session, SessionError};

/// Menu entry for `/start`, which the dispatcher handles before any session exists.
pub const START_COMMAND: &str = "start";
pub const START_DESCRIPTION: &str = "Initiate authentication sequence";

pub const PHONE_PROMPT: &str = "Enter a phone number in format '+x (xxx) xxx-xx-xx'";

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+[0-9]+ \([0-9]{3}\) [0-9]{3}-[0-9]{2}-[0-9]{2}$")
        .expect("phone pattern is a valid regex")
});

/// Commands an authenticated chat can run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumMessage,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    #[strum(message = "Greet the user")]
    Hello,
    #[strum(message = "Add or set phone number for the user")]
    Phone,
    #[strum(message = "Search users by part or whole name")]
    Search,
}

impl Command {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        self.get_message().unwrap_or_default()
    }

    /// Run the command to completion inside `session`.
    pub async fn execute(
        self,
        session: &mut Session,
        msg: &ChatMessage,
        args: &str,
    ) -> Result<(), SessionError> {
        match self {
            Command::Hello => hello(session, msg).await,
            Command::Phone => phone(session, args).await,
            Command::Search => search(session, args).await,
        }
    }
}

/// Commands enabled in this process, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    /// A table with every command enabled.
    pub fn new() -> Self {
        Self {
            commands: Command::iter().collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Command> {
        Command::from_str(name)
            .ok()
            .filter(|command| self.commands.contains(command))
    }

    /// The menu shown by the chat client, `/start` first.
    pub fn menu(&self) -> Vec<BotCommandSpec> {
        std::iter::once(BotCommandSpec::new(START_COMMAND, START_DESCRIPTION))
            .chain(
                self.commands
                    .iter()
                    .map(|c| BotCommandSpec::new(c.name(), c.description())),
            )
            .collect()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

async fn hello(session: &mut Session, msg: &ChatMessage) -> Result<(), SessionError> {
    let text = format!("Hello, {} [{}]", msg.sender.first_name, session.subject());
    session.reply(&text).await;
    Ok(())
}

async fn phone(session: &mut Session, args: &str) -> Result<(), SessionError> {
    let number = match args.trim() {
        "" => {
            session.reply(PHONE_PROMPT).await;
            session.next_text().await?
        }
        given => given.to_string(),
    };
    let number = number.trim();

    if !PHONE_PATTERN.is_match(number) {
        return Err(SessionError::Command("Phone format did not match".into()));
    }

    let Some(mut user) = session.store().get_by_id(session.subject()).await? else {
        return Err(SessionError::Command(
            "You are not registered yet. Please issue /start".into(),
        ));
    };
    user.phone_number = Some(number.to_string());
    session.store().upsert(&user).await?;

    session.reply("Phone number saved").await;
    Ok(())
}

async fn search(session: &mut Session, args: &str) -> Result<(), SessionError> {
    let users: Vec<User> = session
        .store()
        .search_by_name(args.trim())
        .await?
        .try_collect()
        .await?;

    if users.is_empty() {
        session.reply("No users found").await;
        return Ok(());
    }

    let table = render_table(&users);
    session
        .reply_with_mode(&format!("<pre>{}</pre>", html::escape(&table)), ParseMode::Html)
        .await;
    Ok(())
}

const HEADERS: [&str; 3] = ["ISU", "Name", "Phone number"];

/// Fixed-width table of users with a border line above and below the header.
pub fn render_table(users: &[User]) -> String {
    let rows: Vec<[String; 3]> = users
        .iter()
        .map(|u| {
            [
                u.id.to_string(),
                u.name.clone(),
                u.phone_number.clone().unwrap_or_else(|| "Unset".to_string()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };
    let format_row = |cells: [&str; 3]| {
        let mut line = String::from("|");
        for (cell, width) in cells.iter().zip(widths) {
            line.push_str(&format!(" {cell:<width$} |"));
        }
        line
    };

    let mut out = vec![border.clone(), format_row(HEADERS), border.clone()];
    out.extend(
        rows.iter()
            .map(|r| format_row([r[0].as_str(), r[1].as_str(), r[2].as_str()])),
    );
    out.push(border);
    out.join("\n")
}
