//! 账号标记仓储接口

use async_trait::async_trait;
use sentra_common::{PagedResult, Pagination, UserId};
use sentra_errors::AppResult;

use crate::domain::entities::{AccountFlag, FlagReason};

/// 账号标记仓储接口
#[async_trait]
pub trait AccountFlagRepository: Send + Sync {
    /// 保存标记
    async fn save(&self, flag: &AccountFlag) -> AppResult<()>;

    /// 查询用户指定原因的待审核标记
    async fn find_pending(
        &self,
        user_id: &UserId,
        reason: FlagReason,
    ) -> AppResult<Option<AccountFlag>>;

    /// 分页查询待审核标记（供审核协作方读取）
    async fn list_pending(&self, pagination: &Pagination) -> AppResult<PagedResult<AccountFlag>>;
}
