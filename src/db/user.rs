use std::future::Future;

use sqlx::sqlite::SqlitePool;

/// Lookup and session-slot access used by the session gate.
///
/// The slot holds at most one refresh token per user. `set_refresh_token`
/// overwrites unconditionally; `swap_refresh_token` only writes when the
/// stored value still equals `expected`.
pub trait UserRepository: Send + Sync {
    fn get_by_uuid(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<Option<User>, sqlx::Error>> + Send;

    fn set_refresh_token(
        &self,
        uuid: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    fn swap_refresh_token(
        &self,
        uuid: &str,
        expected: &str,
        new: &str,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    /// Current refresh token, `None` when there is no active session
    pub refresh_token: Option<String>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    username: String,
    refresh_token: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            username: row.username,
            refresh_token: row.refresh_token,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with no active session. Returns the user ID.
    pub async fn create(&self, uuid: &str, username: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (uuid, username) VALUES (?, ?)")
            .bind(uuid)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, uuid, username, refresh_token FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Delete a user by ID. The session slot goes with the row.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl UserRepository for UserStore {
    /// Get a user by UUID.
    async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, uuid, username, refresh_token FROM users WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Overwrite the current refresh token. `None` clears the session.
    async fn set_refresh_token(
        &self,
        uuid: &str,
        token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET refresh_token = ? WHERE uuid = ?")
            .bind(token)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the current refresh token only if it still equals `expected`.
    async fn swap_refresh_token(
        &self,
        uuid: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ? WHERE uuid = ? AND refresh_token = ?",
        )
        .bind(new)
        .bind(uuid)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
