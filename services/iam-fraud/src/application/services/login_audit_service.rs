//! 登录审计服务

use std::sync::Arc;

use sentra_common::UserId;

use crate::domain::entities::{GeoLocation, LoginEvent, LoginFailureReason};
use crate::domain::repositories::LoginEventRepository;

/// 登录审计服务
///
/// 为每次登录尝试追加一条不可变事件。记录失败只记日志、不向上
/// 传播：缺一条审计记录不能阻断合法登录（策略选择，见错误处理
/// 设计）。
pub struct LoginAuditService {
    login_event_repo: Arc<dyn LoginEventRepository>,
}

impl LoginAuditService {
    pub fn new(login_event_repo: Arc<dyn LoginEventRepository>) -> Self {
        Self { login_event_repo }
    }

    /// 记录成功登录
    pub async fn record_success(
        &self,
        user_id: &UserId,
        device_fingerprint: Option<String>,
        ip_address: &str,
        geo: Option<&GeoLocation>,
    ) {
        let mut event = LoginEvent::success(user_id.clone(), device_fingerprint, ip_address.to_string());
        if let Some(geo) = geo {
            event.set_location(geo);
        }
        self.save(event).await;
    }

    /// 记录失败登录
    pub async fn record_failure(
        &self,
        user_id: &UserId,
        device_fingerprint: Option<String>,
        ip_address: &str,
        reason: LoginFailureReason,
        geo: Option<&GeoLocation>,
    ) {
        let mut event = LoginEvent::failure(
            user_id.clone(),
            device_fingerprint,
            ip_address.to_string(),
            reason,
        );
        if let Some(geo) = geo {
            event.set_location(geo);
        }
        self.save(event).await;
    }

    async fn save(&self, event: LoginEvent) {
        if let Err(e) = self.login_event_repo.save(&event).await {
            tracing::error!(
                user_id = %event.user_id,
                event_id = %event.id,
                error = %e,
                "Failed to record login event"
            );
        }
    }
}
