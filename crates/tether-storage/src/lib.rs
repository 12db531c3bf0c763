// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite user storage.
//!
//! All statements run on tokio-rusqlite's single background thread, so writes
//! are serialized without extra locking.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use rusqlite::OptionalExtension;
use tracing::{debug, info};

use tether_core::{Role, TetherError, User, UserId, UserStore, UserStream};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        phone_number TEXT,
        role TEXT NOT NULL DEFAULT 'unspecified'
    );
    CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
";

/// Rows fetched per round trip by `search_by_name`.
pub const SEARCH_PAGE_SIZE: usize = 64;

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TetherError {
    TetherError::Storage {
        source: Box::new(e),
    }
}

/// [`UserStore`] backed by a single SQLite file.
pub struct SqliteUserStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteUserStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TetherError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(TetherError::storage)?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(TetherError::storage)?;
        let store = Self { conn };
        store.migrate().await?;
        info!(path = %path.display(), "user store opened");
        Ok(store)
    }

    /// Private in-memory database, for tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, TetherError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(TetherError::storage)?;
        let store = Self { conn };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), TetherError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of stored users.
    pub async fn count(&self) -> Result<u64, TetherError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok(count.max(0) as u64)
            })
            .await
            .map_err(map_tr_err)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = Role::from_str(&role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        phone_number: row.get(2)?,
        role,
    })
}

/// Escape LIKE wildcards so the query matches literally. Pairs with `ESCAPE '\'`.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, TetherError> {
        self.conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, name, phone_number, role FROM users WHERE id = ?1",
                        rusqlite::params![id.0],
                        row_to_user,
                    )
                    .optional()?;
                Ok(user)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn upsert(&self, user: &User) -> Result<(), TetherError> {
        let id = user.id.0;
        let name = user.name.clone();
        let phone_number = user.phone_number.clone();
        let role = user.role.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, name, phone_number, role) VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(id) DO UPDATE SET \
                     name = excluded.name, \
                     phone_number = excluded.phone_number, \
                     role = excluded.role",
                    rusqlite::params![id, name, phone_number, role],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(user_id = %user.id, "user upserted");
        Ok(())
    }

    async fn search_by_name(&self, query: &str) -> Result<UserStream, TetherError> {
        let pattern = escape_like(query);
        let conn = self.conn.clone();

        // Keyset pages on id; the next page is read only when the consumer
        // reaches the end of the current one.
        let pages = stream::try_unfold(Some(i64::MIN), move |after| {
            let conn = conn.clone();
            let pattern = pattern.clone();
            async move {
                let Some(after) = after else {
                    return Ok(None);
                };
                let page = search_page(&conn, pattern, after).await?;
                let next = if page.len() < SEARCH_PAGE_SIZE {
                    None
                } else {
                    page.last().map(|user| user.id.0)
                };
                Ok::<_, TetherError>(Some((stream::iter(page.into_iter().map(Ok)), next)))
            }
        });

        Ok(pages.try_flatten().boxed())
    }
}

/// Up to [`SEARCH_PAGE_SIZE`] matches with an id above `after`, ordered by id.
async fn search_page(
    conn: &tokio_rusqlite::Connection,
    pattern: String,
    after: i64,
) -> Result<Vec<User>, TetherError> {
    conn.call(move |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, phone_number, role FROM users \
             WHERE name LIKE '%' || ?1 || '%' ESCAPE '\\' AND id > ?2 \
             ORDER BY id LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(
                rusqlite::params![pattern, after, SEARCH_PAGE_SIZE as i64],
                row_to_user,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
    .await
    .map_err(map_tr_err)
}
