//! PostgreSQL 账号标记仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_common::{PagedResult, Pagination, UserId};
use sentra_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{AccountFlag, AccountFlagId, FlagEvidence, FlagReason, FlagStatus};
use crate::domain::repositories::AccountFlagRepository;

pub struct PostgresAccountFlagRepository {
    pool: PgPool,
}

impl PostgresAccountFlagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountFlagRepository for PostgresAccountFlagRepository {
    async fn save(&self, flag: &AccountFlag) -> AppResult<()> {
        let evidence = serde_json::to_value(&flag.evidence)?;

        sqlx::query(
            r#"
            INSERT INTO account_flags (id, user_id, reason, evidence, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(flag.id.0)
        .bind(flag.user_id.0)
        .bind(flag.reason.as_str())
        .bind(evidence)
        .bind(flag.status.as_str())
        .bind(flag.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save account flag: {}", e)))?;

        Ok(())
    }

    async fn find_pending(
        &self,
        user_id: &UserId,
        reason: FlagReason,
    ) -> AppResult<Option<AccountFlag>> {
        let row = sqlx::query_as::<_, AccountFlagRow>(
            r#"
            SELECT * FROM account_flags
            WHERE user_id = $1 AND reason = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.0)
        .bind(reason.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find pending flag: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_pending(&self, pagination: &Pagination) -> AppResult<PagedResult<AccountFlag>> {
        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM account_flags WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count pending flags: {}", e)))?;

        let rows = sqlx::query_as::<_, AccountFlagRow>(
            r#"
            SELECT * FROM account_flags
            WHERE status = 'pending'
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.page_size as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list pending flags: {}", e)))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PagedResult::new(items, total.0 as u64, pagination))
    }
}

#[derive(sqlx::FromRow)]
struct AccountFlagRow {
    id: Uuid,
    user_id: Uuid,
    reason: String,
    evidence: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountFlagRow> for AccountFlag {
    type Error = AppError;

    fn try_from(row: AccountFlagRow) -> AppResult<Self> {
        let reason = FlagReason::parse(&row.reason)
            .ok_or_else(|| AppError::internal(format!("Unknown flag reason: {}", row.reason)))?;
        let status = FlagStatus::parse(&row.status)
            .ok_or_else(|| AppError::internal(format!("Unknown flag status: {}", row.status)))?;
        let evidence: FlagEvidence = serde_json::from_value(row.evidence)?;

        Ok(AccountFlag {
            id: AccountFlagId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            reason,
            evidence,
            status,
            created_at: row.created_at,
        })
    }
}
