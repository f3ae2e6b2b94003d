//! PostgreSQL 登录事件仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_common::UserId;
use sentra_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{LoginEvent, LoginEventId, LoginFailureReason};
use crate::domain::repositories::LoginEventRepository;

pub struct PostgresLoginEventRepository {
    pool: PgPool,
}

impl PostgresLoginEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginEventRepository for PostgresLoginEventRepository {
    async fn save(&self, event: &LoginEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_events (id, user_id, device_fingerprint, ip_address, city,
                                      country, latitude, longitude, success, failure_reason,
                                      login_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id.0)
        .bind(event.user_id.0)
        .bind(&event.device_fingerprint)
        .bind(&event.ip_address)
        .bind(&event.city)
        .bind(&event.country)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.success)
        .bind(event.failure_reason.as_ref().map(|r| r.as_str().to_string()))
        .bind(event.login_time)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save login event: {}", e)))?;

        Ok(())
    }

    async fn find_recent_successful(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<LoginEvent>> {
        // id 为 UUIDv7，同毫秒事件用它作稳定的次级排序键
        sqlx::query_as::<_, LoginEventRow>(
            r#"
            SELECT * FROM login_events
            WHERE user_id = $1 AND success = true AND login_time >= $2
            ORDER BY login_time DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id.0)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| AppError::database(format!("Failed to find recent logins: {}", e)))
    }

    async fn find_by_user_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<LoginEvent>> {
        sqlx::query_as::<_, LoginEventRow>(
            r#"
            SELECT * FROM login_events
            WHERE user_id = $1 AND login_time >= $2
            ORDER BY login_time DESC, id DESC
            "#,
        )
        .bind(user_id.0)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| AppError::database(format!("Failed to find login events: {}", e)))
    }
}

#[derive(sqlx::FromRow)]
struct LoginEventRow {
    id: Uuid,
    user_id: Uuid,
    device_fingerprint: Option<String>,
    ip_address: String,
    city: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    success: bool,
    failure_reason: Option<String>,
    login_time: DateTime<Utc>,
}

impl From<LoginEventRow> for LoginEvent {
    fn from(row: LoginEventRow) -> Self {
        LoginEvent {
            id: LoginEventId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            device_fingerprint: row.device_fingerprint,
            ip_address: row.ip_address,
            city: row.city,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            success: row.success,
            failure_reason: row.failure_reason.as_deref().map(LoginFailureReason::from_str),
            login_time: row.login_time,
        }
    }
}
