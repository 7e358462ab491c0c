//! Log of weather requests

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeatherRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub city: String,
    pub weather_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct WeatherRepository {
    pool: SqlitePool,
}

impl WeatherRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `weather_data` is the raw API payload as JSON text.
    pub async fn create(
        &self,
        user_id: i64,
        city: &str,
        weather_data: &str,
    ) -> Result<WeatherRecordRow> {
        let row = sqlx::query_as::<_, WeatherRecordRow>(
            r#"INSERT INTO weather_records (user_id, city, weather_data, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING id, user_id, city, weather_data, created_at"#,
        )
        .bind(user_id)
        .bind(city)
        .bind(weather_data)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create weather record")?;

        debug!(user_id, city, record_id = row.id, "Saved weather record");
        Ok(row)
    }

    pub async fn get_user_records(&self, user_id: i64, limit: i64) -> Result<Vec<WeatherRecordRow>> {
        sqlx::query_as::<_, WeatherRecordRow>(
            r#"SELECT id, user_id, city, weather_data, created_at
               FROM weather_records WHERE user_id = ?
               ORDER BY id DESC LIMIT ?"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list weather records")
    }
}
