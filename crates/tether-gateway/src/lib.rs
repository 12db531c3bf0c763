// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Tether chat bot.
//!
//! Serves the OAuth redirect target, which hands `code` and `state` to the
//! [`AuthCorrelator`](tether_session::AuthCorrelator), and a health endpoint.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, router, start_server};
