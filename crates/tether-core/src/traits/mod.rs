// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the session engine.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod channel;
pub mod identity;
pub mod storage;

pub use channel::{MessageSender, UpdateSource};
pub use identity::IdentityVerifier;
pub use storage::{UserStore, UserStream};
