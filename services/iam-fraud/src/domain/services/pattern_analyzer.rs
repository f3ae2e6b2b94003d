//! 登录行为模式分析服务

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sentra_common::UserId;
use sentra_errors::AppResult;

use crate::domain::repositories::LoginEventRepository;

/// 位置多样性分值（≥3 个不同地点）
const LOCATION_DIVERSITY_SCORE: u32 = 20;
/// 设备多样性分值（不同设备数超过上限）
const DEVICE_DIVERSITY_SCORE: u32 = 30;
/// 每对近同时异地登录的分值（不封顶，逐对累加）
const RAPID_PAIR_SCORE: u32 = 40;
/// 触发位置多样性的最少地点数
const LOCATION_DIVERSITY_THRESHOLD: usize = 3;

/// 模式分析结果
#[derive(Debug, Clone)]
pub struct PatternAnalysis {
    pub suspicious: bool,
    /// 累加的风险分数，刻意不封顶；展示用 `display_score`
    pub risk_score: u32,
    pub reasons: Vec<String>,
}

impl PatternAnalysis {
    fn not_suspicious() -> Self {
        Self {
            suspicious: false,
            risk_score: 0,
            reasons: Vec::new(),
        }
    }

    /// 展示用分数，封顶 100；可疑判定始终基于未封顶的原始分数
    pub fn display_score(&self) -> u32 {
        self.risk_score.min(100)
    }
}

/// 登录行为模式分析服务
///
/// 对时间窗口内的登录事件做多因子累加评分：位置多样性、设备
/// 多样性、近同时异地登录。各因子独立触发。
pub struct LoginPatternAnalyzer {
    login_event_repo: Arc<dyn LoginEventRepository>,
    max_devices: u32,
    window_days: i64,
    suspicious_threshold: u32,
    min_events: usize,
    rapid_window_minutes: i64,
}

impl LoginPatternAnalyzer {
    pub fn new(
        login_event_repo: Arc<dyn LoginEventRepository>,
        max_devices: u32,
        window_days: i64,
        suspicious_threshold: u32,
        min_events: usize,
        rapid_window_minutes: i64,
    ) -> Self {
        Self {
            login_event_repo,
            max_devices,
            window_days,
            suspicious_threshold,
            min_events,
            rapid_window_minutes,
        }
    }

    /// 分析用户近期登录模式
    pub async fn analyze(&self, user_id: &UserId) -> AppResult<PatternAnalysis> {
        let since = Utc::now() - Duration::days(self.window_days);
        let events = self.login_event_repo.find_by_user_since(user_id, since).await?;

        // 事件过少，信号不足
        if events.len() < self.min_events {
            return Ok(PatternAnalysis::not_suspicious());
        }

        let mut risk_score = 0u32;
        let mut reasons = Vec::new();

        // 位置多样性
        let locations: HashSet<(&str, Option<&str>)> = events
            .iter()
            .filter_map(|e| e.city.as_deref().map(|city| (city, e.country.as_deref())))
            .collect();
        if locations.len() >= LOCATION_DIVERSITY_THRESHOLD {
            risk_score += LOCATION_DIVERSITY_SCORE;
            reasons.push(format!(
                "Logins from {} distinct locations in {} days",
                locations.len(),
                self.window_days
            ));
        }

        // 设备多样性
        let devices: HashSet<&str> = events
            .iter()
            .filter_map(|e| e.device_fingerprint.as_deref())
            .collect();
        if devices.len() > self.max_devices as usize {
            risk_score += DEVICE_DIVERSITY_SCORE;
            reasons.push(format!(
                "{} distinct devices used in {} days (limit {})",
                devices.len(),
                self.window_days,
                self.max_devices
            ));
        }

        // 近同时异地登录：相邻事件对（新到旧）逐对累加
        for pair in events.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            let (Some(newer_city), Some(older_city)) = (newer.city.as_deref(), older.city.as_deref())
            else {
                continue;
            };
            if newer_city == older_city {
                continue;
            }

            let delta_minutes = (newer.login_time - older.login_time).num_minutes().abs();
            if delta_minutes < self.rapid_window_minutes {
                risk_score += RAPID_PAIR_SCORE;
                reasons.push(format!(
                    "Near-simultaneous logins in {} and {} within {} minutes",
                    older_city, newer_city, delta_minutes
                ));
            }
        }

        let suspicious = risk_score >= self.suspicious_threshold;
        if suspicious {
            tracing::warn!(
                user_id = %user_id,
                risk_score,
                reasons = ?reasons,
                "Suspicious login pattern detected"
            );
            metrics::counter!("fraud_suspicious_patterns_detected").increment(1);
        }

        Ok(PatternAnalysis {
            suspicious,
            risk_score,
            reasons,
        })
    }
}
