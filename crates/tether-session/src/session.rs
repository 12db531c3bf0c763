// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat session actor.
//!
//! A session owns the receiving end of its chat's inbox and runs commands
//! from it one at a time: Running -> Dispatching -> Running. It ends in
//! Closed when its handle is closed or dropped, or once every sender of the
//! inbox is gone. Messages still buffered at that point are discarded.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use tether_core::{ChatId, ChatMessage, MessageSender, ParseMode, TetherError, UserId, UserStore};

use crate::commands::CommandTable;

/// Reply for a command name missing from the table.
pub const UNKNOWN_COMMAND_REPLY: &str = "I don't know this command";

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting on the inbox.
    Running,
    /// A command handler is executing.
    Dispatching,
    /// Inbox closed; the loop has exited.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Running => write!(f, "running"),
            SessionState::Dispatching => write!(f, "dispatching"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Errors a command handler can end with. All of them leave the loop running.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The inbox closed while a handler was waiting for input.
    #[error("Session was closed")]
    Abandoned,

    /// A user-facing failure; the text is sent back to the chat.
    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    Tether(#[from] TetherError),
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionServices {
    pub sender: Arc<dyn MessageSender>,
    pub store: Arc<dyn UserStore>,
    pub commands: Arc<CommandTable>,
}

/// The running side of a chat session, owned by its task.
pub struct Session {
    chat: ChatId,
    subject: UserId,
    inbox: mpsc::Receiver<ChatMessage>,
    closed: CancellationToken,
    services: SessionServices,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Spawn the command loop for `chat` and return the handle that feeds it.
    ///
    /// `capacity` below 1 is raised to 1.
    pub fn start(
        chat: ChatId,
        subject: UserId,
        capacity: usize,
        services: SessionServices,
    ) -> SessionHandle {
        let (inbox_tx, inbox_rx) = mpsc::channel(capacity.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::Running);
        let closed = CancellationToken::new();

        let session = Session {
            chat,
            subject,
            inbox: inbox_rx,
            closed: closed.clone(),
            services,
            state: state_tx,
        };
        let task = tokio::spawn(session.run());

        SessionHandle {
            chat,
            subject,
            inbox: inbox_tx,
            state: state_rx,
            task,
            close_guard: closed.drop_guard(),
        }
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    /// Verified user id behind this chat.
    pub fn subject(&self) -> UserId {
        self.subject
    }

    pub fn store(&self) -> &dyn UserStore {
        self.services.store.as_ref()
    }

    /// Wait for the next raw message in this chat, command or not.
    pub async fn next_text(&mut self) -> Result<String, SessionError> {
        self.next_message()
            .await
            .map(|msg| msg.text)
            .ok_or(SessionError::Abandoned)
    }

    /// `None` once the session is closed, even with messages still queued.
    async fn next_message(&mut self) -> Option<ChatMessage> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            msg = self.inbox.recv() => msg,
        }
    }

    pub async fn reply(&self, text: &str) {
        self.reply_with_mode(text, ParseMode::Plain).await;
    }

    /// Send to this chat. Failures are logged, not returned.
    pub async fn reply_with_mode(&self, text: &str, mode: ParseMode) {
        if let Err(e) = self.services.sender.send(self.chat, text, mode).await {
            warn!(chat_id = %self.chat, error = %e, "failed to send reply");
        }
    }

    async fn run(mut self) {
        info!(chat_id = %self.chat, subject = %self.subject, "session started");

        while let Some(msg) = self.next_message().await {
            let Some(invocation) = msg.command() else {
                debug!(chat_id = %self.chat, "ignoring non-command message");
                continue;
            };

            self.state.send_replace(SessionState::Dispatching);
            self.dispatch(&invocation.name, &invocation.args, &msg).await;
            self.state.send_replace(SessionState::Running);
        }

        self.state.send_replace(SessionState::Closed);
        info!(chat_id = %self.chat, "session closed");
    }

    async fn dispatch(&mut self, name: &str, args: &str, msg: &ChatMessage) {
        let Some(command) = self.services.commands.lookup(name) else {
            debug!(chat_id = %self.chat, command = name, "unknown command");
            self.reply(UNKNOWN_COMMAND_REPLY).await;
            return;
        };

        debug!(chat_id = %self.chat, %command, "dispatching command");
        match command.execute(self, msg, args).await {
            Ok(()) => {}
            Err(SessionError::Abandoned) => {
                debug!(chat_id = %self.chat, %command, "session closed while command awaited input");
            }
            Err(e) => {
                warn!(chat_id = %self.chat, %command, error = %e, "command failed");
                self.reply(&format!("{e}, please try again")).await;
            }
        }
    }
}

/// Owner-side handle to a running session.
///
/// Dropping or closing the handle ends the session: a handler waiting for
/// input gets [`SessionError::Abandoned`], queued messages are discarded, and
/// the loop exits.
#[derive(Debug)]
pub struct SessionHandle {
    chat: ChatId,
    subject: UserId,
    inbox: mpsc::Sender<ChatMessage>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
    close_guard: DropGuard,
}

impl SessionHandle {
    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn subject(&self) -> UserId {
        self.subject
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// A sender into the inbox, for delivery without holding the registry.
    pub fn inbox(&self) -> mpsc::Sender<ChatMessage> {
        self.inbox.clone()
    }

    /// Stop the session and hand back the loop's task.
    pub fn close(self) -> JoinHandle<()> {
        drop(self.close_guard);
        self.task
    }
}
