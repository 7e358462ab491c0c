//! Telegram users

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields as Telegram reports them on each update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserRow {
    fn differs_from(&self, profile: &UserProfile) -> bool {
        self.username != profile.username
            || self.first_name != profile.first_name
            || self.last_name != profile.last_name
    }
}

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the user and whether it was just created.
    ///
    /// An existing user gets its name fields refreshed when Telegram reports
    /// different ones.
    pub async fn get_or_create(&self, profile: &UserProfile) -> Result<(UserRow, bool)> {
        if let Some(existing) = self.get_by_telegram_id(profile.telegram_id).await? {
            if !existing.differs_from(profile) {
                return Ok((existing, false));
            }
            let updated = self.update_names(profile).await?;
            debug!(telegram_id = profile.telegram_id, "Updated user profile");
            return Ok((updated, false));
        }

        let now = Utc::now();
        let inserted = sqlx::query(
            r#"INSERT INTO users (telegram_id, username, first_name, last_name, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(telegram_id) DO NOTHING"#,
        )
        .bind(profile.telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        let created = inserted.rows_affected() > 0;
        if created {
            info!(telegram_id = profile.telegram_id, "Created user");
        }

        // a concurrent update may have inserted the row first
        let user = self
            .get_by_telegram_id(profile.telegram_id)
            .await?
            .context("User missing right after insert")?;
        Ok((user, created))
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, telegram_id, username, first_name, last_name, created_at, updated_at
               FROM users WHERE telegram_id = ?"#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by telegram id")
    }

    async fn update_names(&self, profile: &UserProfile) -> Result<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"UPDATE users SET username = ?, first_name = ?, last_name = ?, updated_at = ?
               WHERE telegram_id = ?
               RETURNING id, telegram_id, username, first_name, last_name, created_at, updated_at"#,
        )
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(Utc::now())
        .bind(profile.telegram_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to update user")
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")
    }
}
