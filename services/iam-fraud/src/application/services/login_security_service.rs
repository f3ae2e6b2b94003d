//! 登录安全门面服务

use std::sync::Arc;

use sentra_common::UserId;
use sentra_errors::{AppError, AppResult};

use crate::application::services::{FraudCheckService, LoginAuditService};
use crate::domain::entities::{Device, DeviceInfo, GeoLocation, LoginFailureReason};
use crate::domain::services::{DeviceLimitCheck, DeviceRegistry};
use crate::domain::value_objects::ClientAttributes;

/// 一次登录的安全评估结果
#[derive(Debug, Clone)]
pub struct LoginAssessment {
    /// 本次计算出的设备指纹
    pub fingerprint: String,
    /// 设备准入结论
    pub admission: DeviceLimitCheck,
    /// 准入通过时的设备记录
    pub device: Option<Device>,
}

impl LoginAssessment {
    pub fn is_allowed(&self) -> bool {
        self.admission.allowed
    }
}

/// 登录安全门面
///
/// 认证协作方在凭证校验之后调用：成功路径走指纹计算、设备准入、
/// 审计与欺诈检查；失败路径只做审计与欺诈检查。准入结论的存储
/// 错误向上传播，审计与检测的错误不阻断登录。
pub struct LoginSecurityService {
    device_registry: Arc<DeviceRegistry>,
    audit: Arc<LoginAuditService>,
    fraud_checks: Arc<FraudCheckService>,
}

impl LoginSecurityService {
    pub fn new(
        device_registry: Arc<DeviceRegistry>,
        audit: Arc<LoginAuditService>,
        fraud_checks: Arc<FraudCheckService>,
    ) -> Self {
        Self {
            device_registry,
            audit,
            fraud_checks,
        }
    }

    /// 处理一次凭证校验成功的登录
    ///
    /// 返回 Err 仅代表准入结论无法得出（存储故障），调用方应按
    /// 服务端错误处理；设备超限是正常返回，`is_allowed()` 为 false。
    pub async fn process_successful_login(
        &self,
        user_id: &UserId,
        attributes: &ClientAttributes,
        geo: Option<GeoLocation>,
    ) -> AppResult<LoginAssessment> {
        let fingerprint = attributes.fingerprint();

        let admission = self
            .device_registry
            .check_device_limit(user_id, &fingerprint)
            .await?;

        if !admission.allowed {
            return self
                .deny(user_id, fingerprint, admission, &attributes.ip_address, geo.as_ref())
                .await;
        }

        let info = DeviceInfo::from_user_agent(&attributes.user_agent);
        let device = match self
            .device_registry
            .register_device(user_id, &fingerprint, info, &attributes.ip_address, geo.as_ref())
            .await
        {
            Ok(device) => device,
            // 检查与注册之间被并发登录占满名额
            Err(AppError::ResourceExhausted(message)) => {
                let admission = DeviceLimitCheck {
                    allowed: false,
                    active_device_count: admission.active_device_count,
                    is_new_device: true,
                    message: Some(message),
                };
                return self
                    .deny(user_id, fingerprint, admission, &attributes.ip_address, geo.as_ref())
                    .await;
            }
            Err(e) => return Err(e),
        };

        // 先在既有历史上跑检测，再落本次事件：不可能旅行要对比的
        // 是上一次登录，不能让本次事件自比
        self.fraud_checks.run_fraud_checks(user_id, geo.as_ref()).await;
        self.audit
            .record_success(user_id, Some(fingerprint.clone()), &attributes.ip_address, geo.as_ref())
            .await;

        Ok(LoginAssessment {
            fingerprint,
            admission,
            device: Some(device),
        })
    }

    /// 处理一次凭证校验失败的登录
    pub async fn process_failed_login(
        &self,
        user_id: &UserId,
        attributes: &ClientAttributes,
        reason: LoginFailureReason,
        geo: Option<GeoLocation>,
    ) {
        let fingerprint = attributes.fingerprint();
        self.fraud_checks.run_fraud_checks(user_id, geo.as_ref()).await;
        self.audit
            .record_failure(
                user_id,
                Some(fingerprint),
                &attributes.ip_address,
                reason,
                geo.as_ref(),
            )
            .await;
    }

    async fn deny(
        &self,
        user_id: &UserId,
        fingerprint: String,
        admission: DeviceLimitCheck,
        ip_address: &str,
        geo: Option<&GeoLocation>,
    ) -> AppResult<LoginAssessment> {
        tracing::info!(
            user_id = %user_id,
            active_devices = admission.active_device_count,
            "Login denied by device limit"
        );
        self.fraud_checks.run_fraud_checks(user_id, geo).await;
        self.audit
            .record_failure(
                user_id,
                Some(fingerprint.clone()),
                ip_address,
                LoginFailureReason::DeviceLimitExceeded,
                geo,
            )
            .await;

        Ok(LoginAssessment {
            fingerprint,
            admission,
            device: None,
        })
    }
}
