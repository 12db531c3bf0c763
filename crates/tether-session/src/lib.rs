// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session correlation and command dispatch.
//!
//! One [`Session`] runs per authenticated chat. The [`Dispatcher`] consumes
//! the update stream and either routes a message into its chat's session or
//! answers with an authentication link. The link carries a
//! [`CorrelationToken`]; when the identity provider redirects back, the
//! [`AuthCorrelator`] decodes it, verifies the user, and opens the session.

pub mod commands;
pub mod correlator;
pub mod dispatcher;
pub mod html;
pub mod registry;
pub mod session;
pub mod shutdown;
pub mod token;

pub use commands::{Command, CommandTable};
pub use correlator::{AuthCorrelator, CallbackOutcome, RejectReason};
pub use dispatcher::{AuthLinks, Dispatcher};
pub use registry::SessionRegistry;
pub use session::{Session, SessionError, SessionHandle, SessionServices, SessionState};
pub use token::{CorrelationToken, Nonce, TokenError};
