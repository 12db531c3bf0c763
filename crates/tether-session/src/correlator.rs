// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completes the OAuth redirect and opens the chat's session.
//!
//! Nothing is stored between `/start` and the callback: the chat id and the
//! sender's name travel inside the `state` parameter, and the process nonce
//! in front of them proves this process issued the link.

use std::sync::Arc;

use strum::Display;
use tracing::{debug, error, info, warn};

use tether_core::{ChatId, IdentityVerifier, ParseMode, Role, SenderName, User, UserId};

use crate::registry::SessionRegistry;
use crate::session::{Session, SessionServices};
use crate::token::{CorrelationToken, Nonce, TokenError};

/// Why a callback was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    MalformedState,
    NonceMismatch,
    Verification,
    /// The correlation task panicked or was aborted.
    Interrupted,
}

/// Result of one callback, mapped to an HTTP response by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No `code` parameter; the redirect target was opened by hand.
    MissingCode,
    Rejected(RejectReason),
    SessionOpened { chat: ChatId, subject: UserId },
}

#[derive(Clone)]
pub struct AuthCorrelator {
    nonce: Arc<Nonce>,
    verifier: Arc<dyn IdentityVerifier>,
    services: SessionServices,
    registry: SessionRegistry,
    inbox_capacity: usize,
}

impl AuthCorrelator {
    pub fn new(
        nonce: Arc<Nonce>,
        verifier: Arc<dyn IdentityVerifier>,
        services: SessionServices,
        registry: SessionRegistry,
        inbox_capacity: usize,
    ) -> Self {
        Self {
            nonce,
            verifier,
            services,
            registry,
            inbox_capacity,
        }
    }

    /// Run [`complete`](Self::complete) on its own task and wait for it.
    ///
    /// Dropping the returned future does not cancel the correlation: once the
    /// single-use code is sent to the provider, the session is still opened.
    pub async fn spawn_complete(
        &self,
        code: Option<String>,
        state: Option<String>,
    ) -> CallbackOutcome {
        let correlator = self.clone();
        let task = tokio::spawn(async move {
            correlator
                .complete(code.as_deref(), state.as_deref())
                .await
        });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "callback task failed");
                CallbackOutcome::Rejected(RejectReason::Interrupted)
            }
        }
    }

    /// Handle the `code` and `state` query parameters of a redirect.
    ///
    /// The state is checked before the code is spent, so a forged callback
    /// never reaches the identity provider.
    pub async fn complete(&self, code: Option<&str>, state: Option<&str>) -> CallbackOutcome {
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            debug!("callback without authorization code");
            return CallbackOutcome::MissingCode;
        };

        let token = match CorrelationToken::verify(state.unwrap_or_default(), &self.nonce) {
            Ok(token) => token,
            Err(TokenError::NonceMismatch) => {
                warn!("callback state was not issued by this process, possible forgery");
                return CallbackOutcome::Rejected(RejectReason::NonceMismatch);
            }
            Err(e) => {
                warn!(error = %e, "callback state could not be decoded");
                return CallbackOutcome::Rejected(RejectReason::MalformedState);
            }
        };
        let chat = token.chat;

        let claims = match self.verifier.exchange_code(code).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(chat_id = %chat, error = %e, "authorization code exchange failed");
                return CallbackOutcome::Rejected(RejectReason::Verification);
            }
        };
        let subject = claims.subject;

        let user = self.resolve_user(&token, subject).await;
        if let Err(e) = self.services.store.upsert(&user).await {
            warn!(chat_id = %chat, %subject, error = %e, "failed to store user, continuing");
        }

        let handle = Session::start(chat, subject, self.inbox_capacity, self.services.clone());
        if let Some(previous) = self.registry.insert(handle) {
            info!(chat_id = %chat, old_subject = %previous.subject(), "replacing existing session");
            drop(previous.close());
        }

        let greeting = format!("Hello with isu number {subject}. I added you to my database.");
        if let Err(e) = self
            .services
            .sender
            .send(chat, &greeting, ParseMode::Plain)
            .await
        {
            warn!(chat_id = %chat, error = %e, "failed to send greeting");
        }

        info!(chat_id = %chat, %subject, "session opened");
        CallbackOutcome::SessionOpened { chat, subject }
    }

    /// Existing record if there is one, otherwise a new one from the token's names.
    async fn resolve_user(&self, token: &CorrelationToken, subject: UserId) -> User {
        match self.services.store.get_by_id(subject).await {
            Ok(Some(user)) => return user,
            Ok(None) => debug!(%subject, "first login, creating user"),
            Err(e) => warn!(%subject, error = %e, "user lookup failed, using token names"),
        }

        let name = SenderName {
            first_name: token.first_name.clone(),
            last_name: token.last_name.clone(),
            username: None,
        };
        User {
            id: subject,
            name: name.full_name(),
            phone_number: None,
            role: Role::User,
        }
    }
}
