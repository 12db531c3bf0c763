// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-to-session map shared by the dispatcher and the correlator.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

use tether_core::{ChatId, ChatMessage, UserId};

use crate::session::{SessionHandle, SessionState};

/// At most one live session per chat. Clones share the same map.
///
/// Accessors copy data out so no shard lock is held across an await.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<ChatId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` for its chat and return the session it replaced.
    pub fn insert(&self, handle: SessionHandle) -> Option<SessionHandle> {
        self.sessions.insert(handle.chat(), handle)
    }

    pub fn contains(&self, chat: ChatId) -> bool {
        self.sessions.contains_key(&chat)
    }

    /// Sender into the chat's inbox, if the chat has a session.
    pub fn inbox(&self, chat: ChatId) -> Option<mpsc::Sender<ChatMessage>> {
        self.sessions.get(&chat).map(|h| h.inbox())
    }

    pub fn subject(&self, chat: ChatId) -> Option<UserId> {
        self.sessions.get(&chat).map(|h| h.subject())
    }

    pub fn state(&self, chat: ChatId) -> Option<SessionState> {
        self.sessions.get(&chat).map(|h| h.state())
    }

    pub fn watch(&self, chat: ChatId) -> Option<watch::Receiver<SessionState>> {
        self.sessions.get(&chat).map(|h| h.watch())
    }

    pub fn remove(&self, chat: ChatId) -> Option<SessionHandle> {
        self.sessions.remove(&chat).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn chats(&self) -> Vec<ChatId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Remove and return every session.
    pub fn drain(&self) -> Vec<SessionHandle> {
        self.chats()
            .into_iter()
            .filter_map(|chat| self.remove(chat))
            .collect()
    }
}
