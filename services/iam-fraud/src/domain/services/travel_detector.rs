//! 不可能旅行检测服务

use std::sync::Arc;

use chrono::{Duration, Utc};
use sentra_common::UserId;
use sentra_errors::AppResult;

use crate::domain::repositories::LoginEventRepository;

/// 地球平均半径（km）
const EARTH_RADIUS_KM: f64 = 6371.0;

/// 参与比对的最近成功登录条数
const RECENT_LOGIN_LIMIT: i64 = 5;

/// Haversine 大圆距离（km）
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// 不可能旅行判定结果
#[derive(Debug, Clone)]
pub struct TravelViolation {
    pub distance_km: f64,
    pub elapsed_hours: f64,
    /// 经过时间为零或为负时无法计算
    pub speed_kmh: Option<f64>,
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub details: String,
}

/// 不可能旅行检测服务
///
/// 比较本次登录坐标与回溯窗口内最近一次带坐标的成功登录，
/// 由大圆距离与经过时间推算移动速度。
pub struct ImpossibleTravelDetector {
    login_event_repo: Arc<dyn LoginEventRepository>,
    max_speed_kmh: f64,
    lookback_hours: i64,
}

impl ImpossibleTravelDetector {
    pub fn new(
        login_event_repo: Arc<dyn LoginEventRepository>,
        max_speed_kmh: f64,
        lookback_hours: i64,
    ) -> Self {
        Self {
            login_event_repo,
            max_speed_kmh,
            lookback_hours,
        }
    }

    /// 检测本次登录是否构成不可能旅行
    ///
    /// 无历史坐标时返回 None（信号不足按不可疑处理）。速度严格
    /// 超过阈值才判定；恰好等于阈值不判定。经过时间为零或为负
    ///（时钟偏移、同时登录）时无条件判定，不做除法。
    pub async fn detect(
        &self,
        user_id: &UserId,
        current_lat: f64,
        current_lon: f64,
    ) -> AppResult<Option<TravelViolation>> {
        let now = Utc::now();
        let since = now - Duration::hours(self.lookback_hours);

        let recent = self
            .login_event_repo
            .find_recent_successful(user_id, since, RECENT_LOGIN_LIMIT)
            .await?;

        // 只使用最新一条带坐标的记录
        let Some(prior) = recent.iter().find(|e| e.has_coordinates()) else {
            return Ok(None);
        };
        let (Some(prior_lat), Some(prior_lon)) = (prior.latitude, prior.longitude) else {
            return Ok(None);
        };

        let distance_km = haversine_km(prior_lat, prior_lon, current_lat, current_lon);
        let elapsed_hours = (now - prior.login_time).num_milliseconds() as f64 / 3_600_000.0;

        if elapsed_hours <= 0.0 {
            let details = format!(
                "Logins {:.0} km apart with non-positive elapsed time ({:.2} h); treated as impossible travel",
                distance_km, elapsed_hours
            );
            tracing::warn!(user_id = %user_id, distance_km, elapsed_hours, "Impossible travel detected");
            metrics::counter!("fraud_impossible_travel_detected").increment(1);

            return Ok(Some(TravelViolation {
                distance_km,
                elapsed_hours,
                speed_kmh: None,
                from_city: prior.city.clone(),
                to_city: None,
                details,
            }));
        }

        let speed_kmh = distance_km / elapsed_hours;
        if speed_kmh <= self.max_speed_kmh {
            return Ok(None);
        }

        let details = format!(
            "Travelled {:.0} km in {:.2} h, implied speed {:.0} km/h exceeds {:.0} km/h",
            distance_km, elapsed_hours, speed_kmh, self.max_speed_kmh
        );
        tracing::warn!(
            user_id = %user_id,
            distance_km,
            elapsed_hours,
            speed_kmh,
            "Impossible travel detected"
        );
        metrics::counter!("fraud_impossible_travel_detected").increment(1);

        Ok(Some(TravelViolation {
            distance_km,
            elapsed_hours,
            speed_kmh: Some(speed_kmh),
            from_city: prior.city.clone(),
            to_city: None,
            details,
        }))
    }
}
