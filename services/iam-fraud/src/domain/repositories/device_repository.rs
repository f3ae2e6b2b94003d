//! 设备仓储接口

use async_trait::async_trait;
use sentra_common::UserId;
use sentra_errors::AppResult;

use crate::domain::entities::Device;

/// 设备仓储接口
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// 查询用户的全部活跃设备
    async fn find_active_by_user(&self, user_id: &UserId) -> AppResult<Vec<Device>>;

    /// 按 (user_id, fingerprint) 查询设备（含已停用）
    async fn find_by_user_and_fingerprint(
        &self,
        user_id: &UserId,
        fingerprint: &str,
    ) -> AppResult<Option<Device>>;

    /// 在活跃设备数上限内插入新设备
    ///
    /// 计数检查与插入必须对同一用户的并发注册原子：实现需在单个
    /// 事务内持有按用户粒度的锁，插入前重新校验计数。
    /// 返回 false 表示已达上限、未插入。
    async fn insert_within_cap(&self, device: &Device, max_active: u32) -> AppResult<bool>;

    /// 更新已存在的设备（last_seen / login_count / 地理信息 / is_active）
    async fn update(&self, device: &Device) -> AppResult<()>;
}
