// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User storage trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::TetherError;
use crate::types::{User, UserId};

/// Stream of users produced by a search.
pub type UserStream = BoxStream<'static, Result<User, TetherError>>;

/// Persistence of user records.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Looks up a user by id. `Ok(None)` means not found.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, TetherError>;

    /// Inserts the user or replaces the stored record with the same id.
    async fn upsert(&self, user: &User) -> Result<(), TetherError>;

    /// Streams users whose name contains `query`.
    async fn search_by_name(&self, query: &str) -> Result<UserStream, TetherError>;
}
