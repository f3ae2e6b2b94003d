//! 账号标记服务

use std::sync::Arc;

use sentra_common::UserId;
use sentra_errors::AppResult;

use crate::domain::entities::{AccountFlag, FlagEvidence, FlagReason};
use crate::domain::repositories::AccountFlagRepository;

/// 账号标记服务
///
/// 对检测器的命中结果去重落库：同一 (user_id, reason) 存在
/// 待审核标记时不再重复创建，避免每次登录都刷出新标记。
pub struct FlaggingService {
    flag_repo: Arc<dyn AccountFlagRepository>,
}

impl FlaggingService {
    pub fn new(flag_repo: Arc<dyn AccountFlagRepository>) -> Self {
        Self { flag_repo }
    }

    /// 无同原因待审核标记时创建新标记
    ///
    /// 返回是否实际创建。去重检查与插入之间的并发竞争最多产生
    /// 一条多余标记，属可接受（不破坏正确性）。
    pub async fn flag_if_new(
        &self,
        user_id: &UserId,
        reason: FlagReason,
        evidence: FlagEvidence,
    ) -> AppResult<bool> {
        if let Some(existing) = self.flag_repo.find_pending(user_id, reason).await? {
            tracing::debug!(
                user_id = %user_id,
                reason = %reason,
                flag_id = %existing.id,
                "Pending flag already exists, skipping"
            );
            return Ok(false);
        }

        let flag = AccountFlag::new(user_id.clone(), reason, evidence);
        self.flag_repo.save(&flag).await?;

        tracing::warn!(
            user_id = %user_id,
            reason = %reason,
            flag_id = %flag.id,
            "Account flagged for review"
        );
        metrics::counter!("fraud_flags_created", "reason" => reason.as_str()).increment(1);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_common::{PagedResult, Pagination};
    use std::sync::Mutex;

    struct MockFlagRepo {
        flags: Mutex<Vec<AccountFlag>>,
    }

    impl MockFlagRepo {
        fn new() -> Self {
            Self {
                flags: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.flags.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl AccountFlagRepository for MockFlagRepo {
        async fn save(&self, flag: &AccountFlag) -> AppResult<()> {
            self.flags.lock().unwrap().push(flag.clone());
            Ok(())
        }

        async fn find_pending(
            &self,
            user_id: &UserId,
            reason: FlagReason,
        ) -> AppResult<Option<AccountFlag>> {
            let flags = self.flags.lock().unwrap();
            Ok(flags
                .iter()
                .find(|f| &f.user_id == user_id && f.reason == reason && f.is_pending())
                .cloned())
        }

        async fn list_pending(&self, pagination: &Pagination) -> AppResult<PagedResult<AccountFlag>> {
            let flags = self.flags.lock().unwrap();
            let pending: Vec<_> = flags.iter().filter(|f| f.is_pending()).cloned().collect();
            let total = pending.len() as u64;
            let items = pending
                .into_iter()
                .skip(pagination.offset() as usize)
                .take(pagination.page_size as usize)
                .collect();
            Ok(PagedResult::new(items, total, pagination))
        }
    }

    fn pattern_evidence() -> FlagEvidence {
        FlagEvidence::LoginPattern {
            risk_score: 60,
            reasons: vec!["test".to_string()],
        }
    }

    #[tokio::test]
    async fn test_flag_created_when_none_pending() {
        let repo = Arc::new(MockFlagRepo::new());
        let service = FlaggingService::new(repo.clone());
        let user_id = UserId::new();

        let created = service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();

        assert!(created);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_pending_flag_suppressed() {
        let repo = Arc::new(MockFlagRepo::new());
        let service = FlaggingService::new(repo.clone());
        let user_id = UserId::new();

        let first = service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();
        let second = service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_different_reasons_flagged_independently() {
        let repo = Arc::new(MockFlagRepo::new());
        let service = FlaggingService::new(repo.clone());
        let user_id = UserId::new();

        service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();
        let created = service
            .flag_if_new(
                &user_id,
                FlagReason::ImpossibleTravel,
                FlagEvidence::ImpossibleTravel {
                    distance_km: 5570.0,
                    elapsed_hours: 0.5,
                    speed_kmh: Some(11140.0),
                    from_city: None,
                    to_city: None,
                },
            )
            .await
            .unwrap();

        assert!(created);
        assert_eq!(repo.count(), 2);
    }

    #[tokio::test]
    async fn test_resolved_flag_allows_new_one() {
        let repo = Arc::new(MockFlagRepo::new());
        let service = FlaggingService::new(repo.clone());
        let user_id = UserId::new();

        service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();

        // 审核协作方处理掉待审核标记后，新命中可以再次创建
        {
            let mut flags = repo.flags.lock().unwrap();
            flags[0].status = crate::domain::entities::FlagStatus::Dismissed;
        }

        let created = service
            .flag_if_new(&user_id, FlagReason::SuspiciousLoginPattern, pattern_evidence())
            .await
            .unwrap();
        assert!(created);
        assert_eq!(repo.count(), 2);
    }
}
