//! 欺诈检查编排服务

use std::sync::Arc;

use sentra_common::UserId;

use crate::domain::entities::{FlagEvidence, FlagReason, GeoLocation};
use crate::domain::services::{FlaggingService, ImpossibleTravelDetector, LoginPatternAnalyzer};

/// 欺诈检查编排服务
///
/// 在每次登录后依次运行不可能旅行检测与行为模式分析。两个检测
/// 器相互独立：任一失败只记日志，不影响另一个，也不影响登录
/// 结果本身。
pub struct FraudCheckService {
    travel_detector: Arc<ImpossibleTravelDetector>,
    pattern_analyzer: Arc<LoginPatternAnalyzer>,
    flagging: Arc<FlaggingService>,
}

impl FraudCheckService {
    pub fn new(
        travel_detector: Arc<ImpossibleTravelDetector>,
        pattern_analyzer: Arc<LoginPatternAnalyzer>,
        flagging: Arc<FlaggingService>,
    ) -> Self {
        Self {
            travel_detector,
            pattern_analyzer,
            flagging,
        }
    }

    /// 运行全部欺诈检查
    pub async fn run_fraud_checks(&self, user_id: &UserId, geo: Option<&GeoLocation>) {
        self.check_impossible_travel(user_id, geo).await;
        self.check_login_patterns(user_id).await;
    }

    async fn check_impossible_travel(&self, user_id: &UserId, geo: Option<&GeoLocation>) {
        let Some(geo) = geo else {
            return;
        };
        let (Some(lat), Some(lon)) = (geo.latitude, geo.longitude) else {
            return;
        };

        match self.travel_detector.detect(user_id, lat, lon).await {
            Ok(Some(violation)) => {
                let evidence = FlagEvidence::ImpossibleTravel {
                    distance_km: violation.distance_km,
                    elapsed_hours: violation.elapsed_hours,
                    speed_kmh: violation.speed_kmh,
                    from_city: violation.from_city,
                    to_city: geo.city.clone(),
                };
                if let Err(e) = self
                    .flagging
                    .flag_if_new(user_id, FlagReason::ImpossibleTravel, evidence)
                    .await
                {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to persist impossible travel flag");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Impossible travel detection failed");
            }
        }
    }

    async fn check_login_patterns(&self, user_id: &UserId) {
        match self.pattern_analyzer.analyze(user_id).await {
            Ok(analysis) if analysis.suspicious => {
                let evidence = FlagEvidence::LoginPattern {
                    risk_score: analysis.risk_score,
                    reasons: analysis.reasons,
                };
                if let Err(e) = self
                    .flagging
                    .flag_if_new(user_id, FlagReason::SuspiciousLoginPattern, evidence)
                    .await
                {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to persist login pattern flag");
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Login pattern analysis failed");
            }
        }
    }
}
