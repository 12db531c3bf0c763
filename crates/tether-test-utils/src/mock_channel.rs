// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat platform for deterministic testing.
//!
//! `MockSender` captures everything the bot says; `MockUpdates` hands the bot
//! whatever the test injects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, mpsc};

use tether_core::{BotCommandSpec, ChatId, ChatMessage, MessageSender, ParseMode, TetherError, UpdateSource};

/// One message captured by [`MockSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub mode: ParseMode,
}

/// Records outbound messages and published menus.
#[derive(Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    menus: Arc<Mutex<Vec<Vec<BotCommandSpec>>>>,
    notify: Arc<Notify>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages passed to `send()`, in order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts sent to one chat, in order.
    pub async fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat == chat)
            .map(|m| m.text.clone())
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Every menu passed to `set_commands()`.
    pub async fn menus(&self) -> Vec<Vec<BotCommandSpec>> {
        self.menus.lock().await.clone()
    }

    /// Waits until at least `count` messages were sent, or `within` elapses.
    ///
    /// Returns whatever was sent by then.
    pub async fn wait_for_messages(&self, count: usize, within: Duration) -> Vec<SentMessage> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            // Registered before the check so a send in between is not missed.
            let notified = self.notify.notified();
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.sent_messages().await;
            }
        }
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<(), TetherError> {
        self.sent.lock().await.push(SentMessage {
            chat,
            text: text.to_string(),
            mode,
        });
        self.notify.notify_waiters();
        Ok(())
    }

    async fn set_commands(&self, commands: &[BotCommandSpec]) -> Result<(), TetherError> {
        self.menus.lock().await.push(commands.to_vec());
        Ok(())
    }
}

/// Inbound update stream driven by the test.
pub struct MockUpdates {
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<ChatMessage>>>,
    rx: Mutex<mpsc::UnboundedReceiver<ChatMessage>>,
}

impl MockUpdates {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: std::sync::Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
        }
    }

    /// Queue a message for the next `receive()`. Ignored after `close()`.
    pub fn inject(&self, msg: ChatMessage) {
        if let Ok(guard) = self.tx.lock()
            && let Some(tx) = guard.as_ref()
        {
            let _ = tx.send(msg);
        }
    }

    /// End the stream once queued messages are consumed.
    pub fn close(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
    }
}

impl Default for MockUpdates {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpdateSource for MockUpdates {
    async fn receive(&self) -> Result<Option<ChatMessage>, TetherError> {
        Ok(self.rx.lock().await.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private_message;

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let sender = MockSender::new();
        sender
            .send(ChatId(7), "<b>hi</b>", ParseMode::Html)
            .await
            .unwrap();

        let sent = sender.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat, ChatId(7));
        assert_eq!(sent[0].mode, ParseMode::Html);
        assert_eq!(sender.texts_for(ChatId(8)).await, Vec::<String>::new());
    }

    #[tokio::test]
    async fn wait_for_messages_returns_after_send() {
        let sender = Arc::new(MockSender::new());
        let writer = Arc::clone(&sender);
        tokio::spawn(async move {
            writer.send(ChatId(1), "one", ParseMode::Plain).await.unwrap();
            writer.send(ChatId(1), "two", ParseMode::Plain).await.unwrap();
        });

        let sent = sender.wait_for_messages(2, Duration::from_secs(5)).await;
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_messages_gives_up_at_deadline() {
        let sender = MockSender::new();
        let sent = sender.wait_for_messages(1, Duration::from_millis(50)).await;
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn set_commands_records_menu() {
        let sender = MockSender::new();
        sender
            .set_commands(&[BotCommandSpec::new("hello", "Greet the user")])
            .await
            .unwrap();
        assert_eq!(sender.menus().await[0][0].command, "hello");
    }

    #[tokio::test]
    async fn updates_drain_then_close() {
        let updates = MockUpdates::new();
        updates.inject(private_message(1, "Alice", "/start"));
        updates.close();
        updates.inject(private_message(1, "Alice", "ignored"));

        let first = updates.receive().await.unwrap().expect("queued message");
        assert_eq!(first.text, "/start");
        assert!(updates.receive().await.unwrap().is_none());
    }
}
