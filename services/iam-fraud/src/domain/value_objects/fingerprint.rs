//! 设备指纹值对象

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 字段拼接分隔符，不会出现在任何请求头字段中
const FIELD_SEPARATOR: &str = "||";

/// 客户端可观测属性
///
/// 来自 HTTP 层与客户端提示，任意字段可为空字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAttributes {
    pub user_agent: String,
    pub accept_language: String,
    pub ip_address: String,
    pub platform: String,
    pub screen_resolution: String,
}

impl ClientAttributes {
    /// 生成稳定的设备指纹
    ///
    /// 按固定顺序拼接字段后做 SHA-256，hex 编码。相同输入在任何
    /// 进程、任何实现语言下产生相同输出。
    pub fn fingerprint(&self) -> String {
        let raw = [
            self.user_agent.as_str(),
            self.accept_language.as_str(),
            self.ip_address.as_str(),
            self.platform.as_str(),
            self.screen_resolution.as_str(),
        ]
        .join(FIELD_SEPARATOR);

        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// 全部字段为空时指纹退化、易碰撞，调用方应视为低可信
    pub fn is_low_trust(&self) -> bool {
        self.user_agent.is_empty()
            && self.accept_language.is_empty()
            && self.ip_address.is_empty()
            && self.platform.is_empty()
            && self.screen_resolution.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientAttributes {
        ClientAttributes {
            user_agent: "Mozilla/5.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            ip_address: "203.0.113.7".to_string(),
            platform: "Win32".to_string(),
            screen_resolution: "1920x1080".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let attrs = sample();
        assert_eq!(attrs.fingerprint(), attrs.fingerprint());
        assert_eq!(attrs.fingerprint(), sample().fingerprint());
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = sample().fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_sensitive_to_each_field() {
        let base = sample().fingerprint();

        let mut attrs = sample();
        attrs.user_agent = "Other/1.0".to_string();
        assert_ne!(attrs.fingerprint(), base);

        let mut attrs = sample();
        attrs.accept_language = "zh-CN".to_string();
        assert_ne!(attrs.fingerprint(), base);

        let mut attrs = sample();
        attrs.ip_address = "198.51.100.1".to_string();
        assert_ne!(attrs.fingerprint(), base);

        let mut attrs = sample();
        attrs.platform = "Linux x86_64".to_string();
        assert_ne!(attrs.fingerprint(), base);

        let mut attrs = sample();
        attrs.screen_resolution = "2560x1440".to_string();
        assert_ne!(attrs.fingerprint(), base);
    }

    #[test]
    fn test_all_empty_still_produces_fingerprint() {
        let attrs = ClientAttributes::default();
        let fp = attrs.fingerprint();

        assert_eq!(fp.len(), 64);
        assert!(attrs.is_low_trust());
        assert!(!sample().is_low_trust());
    }
}
