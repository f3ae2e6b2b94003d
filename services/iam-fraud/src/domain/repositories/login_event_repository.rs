//! 登录事件仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_common::UserId;
use sentra_errors::AppResult;

use crate::domain::entities::LoginEvent;

/// 登录事件仓储接口
///
/// 登录事件仅追加。查询结果按 login_time 降序，以事件 ID
///（UUIDv7，时间有序）作为稳定的次级排序键：两个检测器都依赖
/// "最近 N 条" 语义，排序歧义会导致误判。
#[async_trait]
pub trait LoginEventRepository: Send + Sync {
    /// 追加一条登录事件
    async fn save(&self, event: &LoginEvent) -> AppResult<()>;

    /// 查询用户自 since 以来最近的成功登录事件（新到旧）
    async fn find_recent_successful(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<LoginEvent>>;

    /// 查询用户自 since 以来的全部登录事件（新到旧）
    async fn find_by_user_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<LoginEvent>>;
}
