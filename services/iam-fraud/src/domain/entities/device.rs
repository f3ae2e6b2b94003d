//! 授权设备实体

use chrono::{DateTime, Utc};
use sentra_common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GeoLocation;

/// 设备 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 设备信息（从 User-Agent 解析的尽力而为的元数据）
///
/// 仅用于展示，准入判断不依赖解析结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// 设备类型（mobile / tablet / desktop）
    pub device_type: String,
    /// 操作系统
    pub os: String,
    /// 浏览器
    pub browser: String,
    /// 展示名称，如 "Chrome on Windows"
    pub device_name: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_type: "desktop".to_string(),
            os: "Unknown".to_string(),
            browser: "Unknown".to_string(),
            device_name: "Unknown device".to_string(),
        }
    }
}

impl DeviceInfo {
    /// 从 User-Agent 解析设备信息
    ///
    /// 大小写不敏感的子串匹配，未命中回退到 Unknown / desktop。
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();

        let browser = if ua.contains("edg") {
            // Edge 的 UA 同时包含 Chrome 与 Safari，需要先判断
            "Edge"
        } else if ua.contains("chrome") {
            "Chrome"
        } else if ua.contains("firefox") {
            "Firefox"
        } else if ua.contains("safari") {
            "Safari"
        } else {
            "Unknown"
        };

        let os = if ua.contains("windows") {
            "Windows"
        } else if ua.contains("android") {
            "Android"
        } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
            "iOS"
        } else if ua.contains("mac os") || ua.contains("macos") {
            "macOS"
        } else if ua.contains("linux") {
            "Linux"
        } else {
            "Unknown"
        };

        let device_type = if ua.contains("tablet") || ua.contains("ipad") {
            "tablet"
        } else if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
            "mobile"
        } else {
            "desktop"
        };

        let device_name = if browser == "Unknown" && os == "Unknown" {
            "Unknown device".to_string()
        } else {
            format!("{} on {}", browser, os)
        };

        Self {
            device_type: device_type.to_string(),
            os: os.to_string(),
            browser: browser.to_string(),
            device_name,
        }
    }
}

/// 授权设备实体
///
/// 每个用户的活跃设备数不超过配置上限；(user_id, fingerprint) 唯一。
/// 本引擎只创建与更新设备，停用由设备管理协作方执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: UserId,
    /// 设备指纹（稳定哈希）
    pub fingerprint: String,
    pub device_name: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    /// 最近一次登录的 IP
    pub ip_address: String,
    /// 最近一次登录的地理位置
    pub city: Option<String>,
    pub country: Option<String>,
    /// 累计登录次数
    pub login_count: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
}

impl Device {
    /// 首次成功登录时创建设备
    pub fn new(
        user_id: UserId,
        fingerprint: String,
        info: DeviceInfo,
        ip_address: String,
        geo: Option<&GeoLocation>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DeviceId::new(),
            user_id,
            fingerprint,
            device_name: info.device_name,
            device_type: info.device_type,
            browser: info.browser,
            os: info.os,
            ip_address,
            city: geo.and_then(|g| g.city.clone()),
            country: geo.and_then(|g| g.country.clone()),
            login_count: 1,
            first_seen: now,
            last_seen: now,
            is_active: true,
        }
    }

    /// 同一指纹再次登录时更新设备
    ///
    /// 地理字段仅在新的定位结果存在时覆盖。
    pub fn record_login(&mut self, ip_address: String, geo: Option<&GeoLocation>) {
        self.last_seen = Utc::now();
        self.login_count += 1;
        self.ip_address = ip_address;
        if let Some(geo) = geo {
            if geo.city.is_some() {
                self.city = geo.city.clone();
            }
            if geo.country.is_some() {
                self.country = geo.country.clone();
            }
        }
        self.is_active = true;
    }

    /// 停用设备（由设备管理协作方调用）
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_desktop_chrome() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
        let info = DeviceInfo::from_user_agent(ua);

        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.device_name, "Chrome on Windows");
    }

    #[test]
    fn test_device_info_mobile_safari() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";
        let info = DeviceInfo::from_user_agent(ua);

        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "iOS");
        assert_eq!(info.device_type, "mobile");
    }

    #[test]
    fn test_device_info_edge_before_chrome() {
        // Edge 的 UA 中同时出现 Chrome 与 Safari
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
        let info = DeviceInfo::from_user_agent(ua);

        assert_eq!(info.browser, "Edge");
    }

    #[test]
    fn test_device_info_unknown() {
        let info = DeviceInfo::from_user_agent("curl/8.0.1");
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.device_name, "Unknown device");
    }

    #[test]
    fn test_record_login_preserves_geo_when_absent() {
        let geo = GeoLocation {
            city: Some("Beijing".to_string()),
            country: Some("CN".to_string()),
            latitude: Some(39.9042),
            longitude: Some(116.4074),
        };
        let mut device = Device::new(
            UserId::new(),
            "fp".to_string(),
            DeviceInfo::default(),
            "1.2.3.4".to_string(),
            Some(&geo),
        );
        assert_eq!(device.login_count, 1);

        // 无新定位时保留原有地理字段
        device.record_login("5.6.7.8".to_string(), None);
        assert_eq!(device.login_count, 2);
        assert_eq!(device.ip_address, "5.6.7.8");
        assert_eq!(device.city.as_deref(), Some("Beijing"));

        // 新定位存在时覆盖
        let geo2 = GeoLocation {
            city: Some("Shanghai".to_string()),
            country: Some("CN".to_string()),
            latitude: None,
            longitude: None,
        };
        device.record_login("5.6.7.8".to_string(), Some(&geo2));
        assert_eq!(device.city.as_deref(), Some("Shanghai"));
    }

    #[test]
    fn test_deactivate_then_login_reactivates() {
        let mut device = Device::new(
            UserId::new(),
            "fp".to_string(),
            DeviceInfo::default(),
            "1.2.3.4".to_string(),
            None,
        );
        device.deactivate();
        assert!(!device.is_active);

        device.record_login("1.2.3.4".to_string(), None);
        assert!(device.is_active);
    }
}
