//! Saved salary calculations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::services::SalaryCalculation;

/// Records shown by `/history`
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SalaryRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub base_salary: f64,
    pub hours_worked: f64,
    pub bonus: f64,
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSalaryRecord {
    pub user_id: i64,
    pub base_salary: Decimal,
    pub hours_worked: Decimal,
    pub bonus: Decimal,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
}

impl NewSalaryRecord {
    pub fn from_calculation(user_id: i64, calc: &SalaryCalculation) -> Self {
        Self {
            user_id,
            base_salary: calc.salary_by_position,
            hours_worked: calc.hours_by_timesheet,
            bonus: calc.monthly_bonus,
            gross: calc.total_accrued,
            tax: calc.tax,
            net: calc.net,
        }
    }
}

fn real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[derive(Clone, Debug)]
pub struct SalaryRepository {
    pool: SqlitePool,
}

impl SalaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, record: &NewSalaryRecord) -> Result<SalaryRecordRow> {
        let row = sqlx::query_as::<_, SalaryRecordRow>(
            r#"INSERT INTO salary_records (user_id, base_salary, hours_worked, bonus, gross, tax, net, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id, user_id, base_salary, hours_worked, bonus, gross, tax, net, created_at"#,
        )
        .bind(record.user_id)
        .bind(real(record.base_salary))
        .bind(real(record.hours_worked))
        .bind(real(record.bonus))
        .bind(real(record.gross))
        .bind(real(record.tax))
        .bind(real(record.net))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create salary record")?;

        info!(user_id = record.user_id, record_id = row.id, "Saved salary record");
        Ok(row)
    }

    /// Most recent records first
    pub async fn get_user_records(&self, user_id: i64, limit: i64) -> Result<Vec<SalaryRecordRow>> {
        sqlx::query_as::<_, SalaryRecordRow>(
            r#"SELECT id, user_id, base_salary, hours_worked, bonus, gross, tax, net, created_at
               FROM salary_records WHERE user_id = ?
               ORDER BY id DESC LIMIT ?"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list salary records")
    }
}
