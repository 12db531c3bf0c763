// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory user store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Mutex;

use tether_core::{TetherError, User, UserId, UserStore, UserStream};

/// User store backed by a `BTreeMap`, so search results come out ordered by id.
///
/// Name search is ASCII case-insensitive, like SQLite `LIKE`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<UserId, User>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user without counting it as a write.
    pub async fn seed(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }

    /// Number of successful `upsert` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a storage error.
    pub fn fail_all(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().await.get(&id).cloned()
    }

    fn check(&self) -> Result<(), TetherError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TetherError::storage(std::io::Error::other(
                "memory store is failing",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, TetherError> {
        self.check()?;
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<(), TetherError> {
        self.check()?;
        self.users.lock().await.insert(user.id, user.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search_by_name(&self, query: &str) -> Result<UserStream, TetherError> {
        self.check()?;
        let needle = query.to_ascii_lowercase();
        let found: Vec<Result<User, TetherError>> = self
            .users
            .lock()
            .await
            .values()
            .filter(|u| u.name.to_ascii_lowercase().contains(&needle))
            .cloned()
            .map(Ok)
            .collect();
        Ok(futures::stream::iter(found).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tether_core::Role;

    fn user(id: i64, name: &str) -> User {
        User {
            id: UserId(id),
            name: name.to_string(),
            phone_number: None,
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_ordered() {
        let store = MemoryUserStore::new();
        store.upsert(&user(3, "Bob Ivanov")).await.unwrap();
        store.upsert(&user(1, "Anna Ivanova")).await.unwrap();
        store.upsert(&user(2, "Carl")).await.unwrap();

        let found: Vec<User> = store
            .search_by_name("ivan")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.writes(), 3);
    }

    #[tokio::test]
    async fn failing_mode_errors_every_call() {
        let store = MemoryUserStore::new();
        store.fail_all(true);
        assert!(store.get_by_id(UserId(1)).await.is_err());
        assert!(store.upsert(&user(1, "x")).await.is_err());
        assert_eq!(store.writes(), 0);
    }
}
