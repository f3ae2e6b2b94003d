//! PostgreSQL 设备仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_common::UserId;
use sentra_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Device, DeviceId};
use crate::domain::repositories::DeviceRepository;

pub struct PostgresDeviceRepository {
    pool: PgPool,
}

impl PostgresDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn find_active_by_user(&self, user_id: &UserId) -> AppResult<Vec<Device>> {
        sqlx::query_as::<_, DeviceRow>(
            "SELECT * FROM devices WHERE user_id = $1 AND is_active = true ORDER BY last_seen DESC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| AppError::database(format!("Failed to find active devices: {}", e)))
    }

    async fn find_by_user_and_fingerprint(
        &self,
        user_id: &UserId,
        fingerprint: &str,
    ) -> AppResult<Option<Device>> {
        sqlx::query_as::<_, DeviceRow>(
            "SELECT * FROM devices WHERE user_id = $1 AND fingerprint = $2",
        )
        .bind(user_id.0)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Into::into))
        .map_err(|e| AppError::database(format!("Failed to find device by fingerprint: {}", e)))
    }

    async fn insert_within_cap(&self, device: &Device, max_active: u32) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        // 按用户粒度的事务级咨询锁，串行化同一用户的并发注册。
        // 锁在事务结束时自动释放。
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(device.user_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire user lock: {}", e)))?;

        // 持锁后重新计数，准入检查到这里之间可能有并发插入
        let active: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM devices WHERE user_id = $1 AND is_active = true",
        )
        .bind(device.user_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to count active devices: {}", e)))?;

        if active.0 >= max_active as i64 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO devices (id, user_id, fingerprint, device_name, device_type, browser,
                                 os, ip_address, city, country, login_count, first_seen,
                                 last_seen, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(device.id.0)
        .bind(device.user_id.0)
        .bind(&device.fingerprint)
        .bind(&device.device_name)
        .bind(&device.device_type)
        .bind(&device.browser)
        .bind(&device.os)
        .bind(&device.ip_address)
        .bind(&device.city)
        .bind(&device.country)
        .bind(device.login_count)
        .bind(device.first_seen)
        .bind(device.last_seen)
        .bind(device.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert device: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(true)
    }

    async fn update(&self, device: &Device) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE devices
            SET ip_address = $2, city = $3, country = $4, login_count = $5,
                last_seen = $6, is_active = $7
            WHERE id = $1
            "#,
        )
        .bind(device.id.0)
        .bind(&device.ip_address)
        .bind(&device.city)
        .bind(&device.country)
        .bind(device.login_count)
        .bind(device.last_seen)
        .bind(device.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update device: {}", e)))?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: Uuid,
    user_id: Uuid,
    fingerprint: String,
    device_name: String,
    device_type: String,
    browser: String,
    os: String,
    ip_address: String,
    city: Option<String>,
    country: Option<String>,
    login_count: i64,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    is_active: bool,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: DeviceId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            fingerprint: row.fingerprint,
            device_name: row.device_name,
            device_type: row.device_type,
            browser: row.browser,
            os: row.os,
            ip_address: row.ip_address,
            city: row.city,
            country: row.country,
            login_count: row.login_count,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            is_active: row.is_active,
        }
    }
}
