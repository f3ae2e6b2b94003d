//! 服务配置

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use sentra_errors::{AppError, AppResult};
use serde::Deserialize;

/// 欺诈检测配置
#[derive(Debug, Clone, Deserialize)]
pub struct FraudDetectionConfig {
    /// 每个用户允许的活跃设备数上限
    #[serde(default = "default_max_devices")]
    pub max_devices_per_user: u32,
    /// 不可能旅行的速度阈值（km/h，约为民航巡航速度）
    #[serde(default = "default_max_speed")]
    pub impossible_travel_speed_kmh: f64,
    /// 不可能旅行检测的回溯窗口（小时）
    #[serde(default = "default_travel_lookback")]
    pub travel_lookback_hours: i64,
    /// 行为模式分析的时间窗口（天）
    #[serde(default = "default_pattern_window")]
    pub pattern_window_days: i64,
    /// 判定为可疑的风险分数阈值
    #[serde(default = "default_suspicious_threshold")]
    pub suspicious_score_threshold: u32,
    /// 模式分析所需的最少事件数
    #[serde(default = "default_min_events")]
    pub min_events_for_analysis: usize,
    /// 近同时异地登录的时间窗口（分钟）
    #[serde(default = "default_rapid_window")]
    pub rapid_login_window_minutes: i64,
}

fn default_max_devices() -> u32 {
    3
}

fn default_max_speed() -> f64 {
    800.0
}

fn default_travel_lookback() -> i64 {
    24
}

fn default_pattern_window() -> i64 {
    7
}

fn default_suspicious_threshold() -> u32 {
    50
}

fn default_min_events() -> usize {
    3
}

fn default_rapid_window() -> i64 {
    30
}

impl Default for FraudDetectionConfig {
    fn default() -> Self {
        Self {
            max_devices_per_user: default_max_devices(),
            impossible_travel_speed_kmh: default_max_speed(),
            travel_lookback_hours: default_travel_lookback(),
            pattern_window_days: default_pattern_window(),
            suspicious_score_threshold: default_suspicious_threshold(),
            min_events_for_analysis: default_min_events(),
            rapid_login_window_minutes: default_rapid_window(),
        }
    }
}

impl FraudDetectionConfig {
    /// 从配置文件与环境变量加载（环境变量优先）
    pub fn load() -> AppResult<Self> {
        Figment::new()
            .merge(Toml::file("fraud.toml"))
            .merge(Env::prefixed("FRAUD_"))
            .extract()
            .map_err(|e| AppError::validation(format!("Failed to load fraud config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FraudDetectionConfig::default();
        assert_eq!(config.max_devices_per_user, 3);
        assert_eq!(config.impossible_travel_speed_kmh, 800.0);
        assert_eq!(config.suspicious_score_threshold, 50);
    }
}
