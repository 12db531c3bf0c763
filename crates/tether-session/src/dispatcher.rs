// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Main update loop: routes chat messages into sessions or the login flow.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use tether_core::{ChatId, ChatMessage, MessageSender, ParseMode, SenderName, TetherError, UpdateSource};

use crate::commands::START_COMMAND;
use crate::html;
use crate::registry::SessionRegistry;
use crate::token::{CorrelationToken, Nonce};

/// Builds provider authorization URLs carrying a correlation token.
#[derive(Debug, Clone)]
pub struct AuthLinks {
    authorize_url: Url,
    client_id: String,
    redirect_url: String,
    scopes: Vec<String>,
    nonce: Arc<Nonce>,
}

impl AuthLinks {
    pub fn new(
        authorize_url: Url,
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: Vec<String>,
        nonce: Arc<Nonce>,
    ) -> Self {
        Self {
            authorize_url,
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            scopes,
            nonce,
        }
    }

    /// Authorization URL whose `state` ties the redirect back to `chat`.
    pub fn url_for(&self, chat: ChatId, sender: &SenderName) -> Url {
        let state =
            CorrelationToken::new(&self.nonce, chat, &sender.first_name, &sender.last_name)
                .encode();
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", &state);
        url
    }
}

/// Single consumer of the update stream.
pub struct Dispatcher {
    registry: SessionRegistry,
    sender: Arc<dyn MessageSender>,
    links: AuthLinks,
}

impl Dispatcher {
    pub fn new(registry: SessionRegistry, sender: Arc<dyn MessageSender>, links: AuthLinks) -> Self {
        Self {
            registry,
            sender,
            links,
        }
    }

    /// Consume `updates` until the stream ends or `cancel` fires.
    ///
    /// A failed receive is returned to the caller; the stream is not restartable.
    pub async fn run(
        &self,
        updates: &dyn UpdateSource,
        cancel: CancellationToken,
    ) -> Result<(), TetherError> {
        info!("dispatcher running");

        loop {
            let msg = tokio::select! {
                received = updates.receive() => match received {
                    Ok(Some(msg)) => msg,
                    Ok(None) => {
                        info!("update stream closed, stopping dispatcher");
                        return Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "update stream failed");
                        return Err(e);
                    }
                },
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    return Ok(());
                }
            };

            // Delivery can wait on a busy session; shutdown must still get through.
            tokio::select! {
                _ = self.handle(msg) => {}
                _ = cancel.cancelled() => {
                    info!("shutdown signal received during delivery, stopping dispatcher");
                    return Ok(());
                }
            }
        }
    }

    /// Route one inbound message.
    pub async fn handle(&self, msg: ChatMessage) {
        if !msg.private {
            debug!(chat_id = %msg.chat, "ignoring message from non-private chat");
            return;
        }

        let inbox = if msg.is_command(START_COMMAND) {
            None
        } else {
            self.registry.inbox(msg.chat)
        };

        match inbox {
            None => self.send_auth_link(&msg).await,
            Some(inbox) => {
                let chat = msg.chat;
                if inbox.send(msg).await.is_err() {
                    warn!(chat_id = %chat, "session inbox closed, dropping message");
                }
            }
        }
    }

    async fn send_auth_link(&self, msg: &ChatMessage) {
        let url = self.links.url_for(msg.chat, &msg.sender);
        let text = format!(
            "Please authenticate with <a href=\"{}\">this link</a>.",
            html::escape(url.as_str())
        );
        debug!(chat_id = %msg.chat, "sending authentication link");
        if let Err(e) = self.sender.send(msg.chat, &text, ParseMode::Html).await {
            warn!(chat_id = %msg.chat, error = %e, "failed to send authentication link");
        }
    }
}
