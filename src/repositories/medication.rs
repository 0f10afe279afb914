// src/repositories/medication.rs

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use sqlx::SqlitePool;

use super::CrudRepository;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Alerts, DashboardStats, ExpiringMedication, LowStockMedication, Medication, MedicationRecord,
    EXPIRY_ALERT_DAYS, LOW_STOCK_THRESHOLD,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MedicationRepository;

impl MedicationRepository {
    pub fn new() -> Self {
        Self
    }

    /// Total rows, rows expiring between `today` and the end of its month,
    /// and rows below the low-stock threshold.
    pub async fn dashboard_stats(&self, pool: &SqlitePool, today: NaiveDate) -> ApiResult<DashboardStats> {
        let total = self.count(pool).await?;

        let expiring_month: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medications WHERE expiry_date BETWEEN ? AND ?"
        )
            .bind(today)
            .bind(last_day_of_month(today)?)
            .fetch_one(pool)
            .await?;

        let low_stock: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medications WHERE quantity_remaining < ?"
        )
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_one(pool)
            .await?;

        Ok(DashboardStats {
            total,
            expiring_month,
            low_stock,
        })
    }

    pub async fn alerts(&self, pool: &SqlitePool, today: NaiveDate) -> ApiResult<Alerts> {
        let horizon = today + Duration::days(EXPIRY_ALERT_DAYS);

        let expiring: Vec<ExpiringMedication> = sqlx::query_as(
            r#"
            SELECT medication_id, medication_name, expiry_date
            FROM medications
            WHERE expiry_date BETWEEN ? AND ?
            ORDER BY expiry_date ASC, medication_id ASC
            "#
        )
            .bind(today)
            .bind(horizon)
            .fetch_all(pool)
            .await?;

        let low_stock: Vec<LowStockMedication> = sqlx::query_as(
            r#"
            SELECT medication_id, medication_name, quantity_remaining
            FROM medications
            WHERE quantity_remaining < ?
            ORDER BY quantity_remaining ASC, medication_id ASC
            "#
        )
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_all(pool)
            .await?;

        Ok(Alerts {
            expiring: expiring.into_iter().map(|m| m.annotate(today)).collect(),
            low_stock,
        })
    }
}

#[async_trait]
impl CrudRepository<Medication, MedicationRecord> for MedicationRepository {
    fn table_name(&self) -> &'static str {
        "medications"
    }

    fn id_field(&self) -> &'static str {
        "medication_id"
    }

    fn default_sort_field(&self) -> &'static str {
        "expiry_date"
    }

    async fn create(&self, pool: &SqlitePool, data: &MedicationRecord) -> ApiResult<i64> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO medications
            (medication_name, generic_name, medication_type, manufacturer, strength,
             expiry_date, purchase_date, quantity_remaining, price,
             prescription_required, storage_instructions, side_effects)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
            .bind(&data.name)
            .bind(&data.generic_name)
            .bind(&data.med_type)
            .bind(&data.manufacturer)
            .bind(&data.strength)
            .bind(data.expiry_date)
            .bind(data.purchase_date)
            .bind(data.quantity_remaining)
            .bind(data.price)
            .bind(data.prescription_required)
            .bind(&data.storage_instructions)
            .bind(&data.side_effects)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        log::info!("💊 Added medication '{}' ({})", data.name, id);
        Ok(id)
    }

    async fn update(&self, pool: &SqlitePool, id: i64, data: &MedicationRecord) -> ApiResult<bool> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE medications SET
                medication_name = ?,
                generic_name = ?,
                medication_type = ?,
                manufacturer = ?,
                strength = ?,
                expiry_date = ?,
                purchase_date = ?,
                quantity_remaining = ?,
                price = ?,
                prescription_required = ?,
                storage_instructions = ?,
                side_effects = ?
            WHERE medication_id = ?
            "#
        )
            .bind(&data.name)
            .bind(&data.generic_name)
            .bind(&data.med_type)
            .bind(&data.manufacturer)
            .bind(&data.strength)
            .bind(data.expiry_date)
            .bind(data.purchase_date)
            .bind(data.quantity_remaining)
            .bind(data.price)
            .bind(data.prescription_required)
            .bind(&data.storage_instructions)
            .bind(&data.side_effects)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let updated = result.rows_affected() > 0;
        if updated {
            log::info!("💊 Updated medication {}", id);
        }
        Ok(updated)
    }
}

fn last_day_of_month(date: NaiveDate) -> ApiResult<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .ok_or_else(|| ApiError::internal(format!("No month end for {}", date)))
}
