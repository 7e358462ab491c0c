//! SQLite storage
//!
//! Connection pooling, schema bootstrap and the repositories for users,
//! salary calculations and weather requests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

pub mod salary_repository;
pub mod user_repository;
pub mod weather_repository;

pub use salary_repository::{
    NewSalaryRecord, SalaryRecordRow, SalaryRepository, DEFAULT_HISTORY_LIMIT,
};
pub use user_repository::{UserProfile, UserRepository, UserRow};
pub use weather_repository::{WeatherRecordRow, WeatherRepository};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        telegram_id INTEGER NOT NULL UNIQUE,
        username TEXT,
        first_name TEXT,
        last_name TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS salary_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        base_salary REAL NOT NULL,
        hours_worked REAL NOT NULL,
        bonus REAL NOT NULL DEFAULT 0,
        gross REAL NOT NULL,
        tax REAL NOT NULL,
        net REAL NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS weather_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        city TEXT NOT NULL,
        weather_data TEXT,
        created_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_salary_records_user_id ON salary_records (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_weather_records_user_id ON weather_records (user_id)",
];

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::config::DEFAULT_DATABASE_PATH),
            max_connections: 5,
            connection_timeout: Duration::from_secs(30),
        }
    }
}

/// Owns the pool and hands out repositories
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open (creating if needed) the database file and make sure the schema exists.
    ///
    /// Safe to call on an existing database; nothing is dropped.
    pub async fn init(config: DatabaseConfig) -> Result<Self> {
        ensure_parent_dir(&config.path)?;
        info!(path = %config.path.display(), "Opening database");

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!("Failed to open database: {}", e);
                e
            })
            .with_context(|| format!("Failed to open database {}", config.path.display()))?;

        let manager = Self { pool };
        manager.create_schema().await?;
        info!(path = %config.path.display(), "Database initialized");
        Ok(manager)
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create database schema")?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn salary_records(&self) -> SalaryRepository {
        SalaryRepository::new(self.pool.clone())
    }

    pub fn weather_records(&self) -> WeatherRepository {
        WeatherRepository::new(self.pool.clone())
    }

    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .context("Database connectivity check failed")
    }

    pub async fn close(self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display())),
        _ => Ok(()),
    }
}
