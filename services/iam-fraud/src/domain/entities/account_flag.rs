//! 账号标记实体

use chrono::{DateTime, Utc};
use sentra_common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 账号标记 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountFlagId(pub Uuid);

impl AccountFlagId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AccountFlagId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountFlagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 标记原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagReason {
    ImpossibleTravel,
    SuspiciousLoginPattern,
}

impl FlagReason {
    /// 持久化使用的稳定标识
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImpossibleTravel => "impossible_travel",
            Self::SuspiciousLoginPattern => "suspicious_login_pattern",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "impossible_travel" => Some(Self::ImpossibleTravel),
            "suspicious_login_pattern" => Some(Self::SuspiciousLoginPattern),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 标记状态
///
/// Pending 之外的状态迁移由审核协作方执行，本引擎只创建与读取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagStatus {
    Pending,
    Reviewed,
    Dismissed,
    Confirmed,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Dismissed => "dismissed",
            Self::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "dismissed" => Some(Self::Dismissed),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

/// 检测证据
///
/// 按原因区分的带标签联合，持久化为 jsonb，避免无类型的黑盒数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlagEvidence {
    ImpossibleTravel {
        distance_km: f64,
        elapsed_hours: f64,
        /// 经过时间为零或为负时无法计算
        speed_kmh: Option<f64>,
        from_city: Option<String>,
        to_city: Option<String>,
    },
    LoginPattern {
        risk_score: u32,
        reasons: Vec<String>,
    },
}

/// 账号标记实体
///
/// 不变量：每个 (user_id, reason) 至多一条 Pending 标记。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountFlag {
    pub id: AccountFlagId,
    pub user_id: UserId,
    pub reason: FlagReason,
    pub evidence: FlagEvidence,
    pub status: FlagStatus,
    pub created_at: DateTime<Utc>,
}

impl AccountFlag {
    /// 检测器命中时创建待审核标记
    pub fn new(user_id: UserId, reason: FlagReason, evidence: FlagEvidence) -> Self {
        Self {
            id: AccountFlagId::new(),
            user_id,
            reason,
            evidence,
            status: FlagStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FlagStatus::Pending
    }
}
