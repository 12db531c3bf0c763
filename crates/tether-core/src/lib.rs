// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tether chat bot.
//!
//! This crate provides the collaborator traits, error type, and shared types
//! used by the session engine and by every adapter crate in the workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TetherError;
pub use traits::{IdentityVerifier, MessageSender, UpdateSource, UserStore, UserStream};
pub use types::{
    BotCommandSpec, ChatId, ChatMessage, CommandInvocation, ParseMode, Role, SenderName, User,
    UserId, VerifiedClaims,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tether_error_variants_render() {
        let config = TetherError::Config("missing token".into());
        assert_eq!(config.to_string(), "configuration error: missing token");

        let storage = TetherError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage error: disk full");

        let identity = TetherError::identity("bad code");
        assert_eq!(identity.to_string(), "identity error: bad code");
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _sender(_: &dyn MessageSender) {}
        fn _updates(_: &dyn UpdateSource) {}
        fn _verifier(_: &dyn IdentityVerifier) {}
        fn _store(_: &dyn UserStore) {}
    }

    #[test]
    fn ids_display_as_numbers() {
        assert_eq!(ChatId(-42).to_string(), "-42");
        assert_eq!(UserId(1001).to_string(), "1001");
    }
}
