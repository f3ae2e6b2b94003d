//! 登录事件实体

use chrono::{DateTime, Utc};
use sentra_common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 登录事件 ID
///
/// 使用 UUIDv7（时间有序），作为 login_time 排序的稳定次级排序键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoginEventId(pub Uuid);

impl LoginEventId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LoginEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoginEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 登录失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginFailureReason {
    InvalidCredentials,
    AccountLocked,
    AccountDisabled,
    DeviceLimitExceeded,
    Other(String),
}

impl std::fmt::Display for LoginFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::AccountLocked => write!(f, "Account locked"),
            Self::AccountDisabled => write!(f, "Account disabled"),
            Self::DeviceLimitExceeded => write!(f, "Device limit exceeded"),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl LoginFailureReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountLocked => "account_locked",
            Self::AccountDisabled => "account_disabled",
            Self::DeviceLimitExceeded => "device_limit_exceeded",
            Self::Other(msg) => msg,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "invalid_credentials" => Self::InvalidCredentials,
            "account_locked" => Self::AccountLocked,
            "account_disabled" => Self::AccountDisabled,
            "device_limit_exceeded" => Self::DeviceLimitExceeded,
            other => Self::Other(other.to_string()),
        }
    }
}

/// 解析后的地理位置
///
/// 由 IP 定位协作方提供，本引擎不做独立校验。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoLocation {
    /// 经纬度是否齐全
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// 登录事件实体（仅追加，创建后不修改不删除）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: LoginEventId,
    pub user_id: UserId,
    /// 设备指纹（不可用时为空）
    pub device_fingerprint: Option<String>,
    pub ip_address: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub success: bool,
    pub failure_reason: Option<LoginFailureReason>,
    pub login_time: DateTime<Utc>,
}

impl LoginEvent {
    /// 创建成功登录事件
    pub fn success(user_id: UserId, device_fingerprint: Option<String>, ip_address: String) -> Self {
        Self {
            id: LoginEventId::new(),
            user_id,
            device_fingerprint,
            ip_address,
            city: None,
            country: None,
            latitude: None,
            longitude: None,
            success: true,
            failure_reason: None,
            login_time: Utc::now(),
        }
    }

    /// 创建失败登录事件
    pub fn failure(
        user_id: UserId,
        device_fingerprint: Option<String>,
        ip_address: String,
        reason: LoginFailureReason,
    ) -> Self {
        Self {
            id: LoginEventId::new(),
            user_id,
            device_fingerprint,
            ip_address,
            city: None,
            country: None,
            latitude: None,
            longitude: None,
            success: false,
            failure_reason: Some(reason),
            login_time: Utc::now(),
        }
    }

    /// 附加地理位置
    pub fn set_location(&mut self, geo: &GeoLocation) {
        self.city = geo.city.clone();
        self.country = geo.country.clone();
        self.latitude = geo.latitude;
        self.longitude = geo.longitude;
    }

    /// 经纬度是否齐全
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_event() {
        let event = LoginEvent::success(UserId::new(), Some("fp".to_string()), "1.2.3.4".to_string());
        assert!(event.success);
        assert!(event.failure_reason.is_none());
        assert!(!event.has_coordinates());
    }

    #[test]
    fn test_failure_event() {
        let event = LoginEvent::failure(
            UserId::new(),
            None,
            "1.2.3.4".to_string(),
            LoginFailureReason::InvalidCredentials,
        );
        assert!(!event.success);
        assert_eq!(event.failure_reason, Some(LoginFailureReason::InvalidCredentials));
    }

    #[test]
    fn test_set_location() {
        let mut event = LoginEvent::success(UserId::new(), None, "1.2.3.4".to_string());
        let geo = GeoLocation {
            city: Some("New York".to_string()),
            country: Some("US".to_string()),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
        };
        event.set_location(&geo);

        assert!(event.has_coordinates());
        assert_eq!(event.city.as_deref(), Some("New York"));
    }

    #[test]
    fn test_failure_reason_roundtrip() {
        let reason = LoginFailureReason::DeviceLimitExceeded;
        assert_eq!(LoginFailureReason::from_str(reason.as_str()), reason);

        let other = LoginFailureReason::from_str("mfa_timeout");
        assert_eq!(other, LoginFailureReason::Other("mfa_timeout".to_string()));
    }

    #[test]
    fn test_event_ids_are_time_ordered() {
        let a = LoginEventId::new();
        let b = LoginEventId::new();
        // UUIDv7 单调有序，可作次级排序键
        assert!(a < b);
    }
}
