//! 设备注册服务

use std::sync::Arc;

use sentra_common::UserId;
use sentra_errors::{AppError, AppResult};

use crate::domain::entities::{Device, DeviceInfo, GeoLocation};
use crate::domain::repositories::DeviceRepository;

/// 设备准入检查结果
#[derive(Debug, Clone)]
pub struct DeviceLimitCheck {
    pub allowed: bool,
    pub active_device_count: u32,
    pub is_new_device: bool,
    /// 拒绝时的用户可读提示
    pub message: Option<String>,
}

/// 设备注册服务
///
/// 维护每用户活跃设备上限。上限只约束新设备：已活跃的指纹总是
/// 重新准入，即使历史数据已达到上限。
pub struct DeviceRegistry {
    device_repo: Arc<dyn DeviceRepository>,
    max_devices: u32,
}

impl DeviceRegistry {
    pub fn new(device_repo: Arc<dyn DeviceRepository>, max_devices: u32) -> Self {
        Self {
            device_repo,
            max_devices,
        }
    }

    /// 检查设备准入
    ///
    /// 已知活跃设备总是放行；新设备在活跃数达到上限时拒绝。
    /// 存储错误直接向上传播，准入结论不能在存储失败时猜测。
    pub async fn check_device_limit(
        &self,
        user_id: &UserId,
        fingerprint: &str,
    ) -> AppResult<DeviceLimitCheck> {
        let active_devices = self.device_repo.find_active_by_user(user_id).await?;
        let active_device_count = active_devices.len() as u32;

        if active_devices.iter().any(|d| d.fingerprint == fingerprint) {
            return Ok(DeviceLimitCheck {
                allowed: true,
                active_device_count,
                is_new_device: false,
                message: None,
            });
        }

        if active_device_count >= self.max_devices {
            tracing::info!(
                user_id = %user_id,
                active_device_count,
                max_devices = self.max_devices,
                "New device denied by device limit"
            );
            metrics::counter!("fraud_device_registrations_denied").increment(1);
            return Ok(DeviceLimitCheck {
                allowed: false,
                active_device_count,
                is_new_device: true,
                message: Some(self.limit_message()),
            });
        }

        Ok(DeviceLimitCheck {
            allowed: true,
            active_device_count,
            is_new_device: true,
            message: None,
        })
    }

    /// 注册或更新设备
    ///
    /// 已有 (user_id, fingerprint) 记录则更新；否则走
    /// `insert_within_cap`，由仓储在单事务内完成计数复查与插入，
    /// 并发注册不会突破上限。
    pub async fn register_device(
        &self,
        user_id: &UserId,
        fingerprint: &str,
        info: DeviceInfo,
        ip_address: &str,
        geo: Option<&GeoLocation>,
    ) -> AppResult<Device> {
        if let Some(mut device) = self
            .device_repo
            .find_by_user_and_fingerprint(user_id, fingerprint)
            .await?
        {
            device.record_login(ip_address.to_string(), geo);
            self.device_repo.update(&device).await?;

            tracing::debug!(
                user_id = %user_id,
                device_id = %device.id,
                login_count = device.login_count,
                "Known device login recorded"
            );
            return Ok(device);
        }

        let device = Device::new(
            user_id.clone(),
            fingerprint.to_string(),
            info,
            ip_address.to_string(),
            geo,
        );

        let inserted = self
            .device_repo
            .insert_within_cap(&device, self.max_devices)
            .await?;

        if !inserted {
            // 检查与注册之间有并发注册占满了名额
            metrics::counter!("fraud_device_registrations_denied").increment(1);
            return Err(AppError::resource_exhausted(self.limit_message()));
        }

        tracing::info!(
            user_id = %user_id,
            device_id = %device.id,
            device_name = %device.device_name,
            "New device registered"
        );
        metrics::counter!("fraud_devices_registered").increment(1);

        Ok(device)
    }

    fn limit_message(&self) -> String {
        format!(
            "Device limit reached ({} devices). Please remove a device in your account settings before signing in from a new one.",
            self.max_devices
        )
    }
}
