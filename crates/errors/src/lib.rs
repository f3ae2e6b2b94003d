//! sentra-errors - 统一错误处理

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Database(_) => 500,
            Self::Serialization(_) => 500,
            Self::ResourceExhausted(_) => 429,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl AppError {
    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        let (r#type, title) = match self {
            Self::NotFound(_) => ("not-found", "Resource Not Found"),
            Self::Validation(_) => ("validation", "Validation Error"),
            Self::Conflict(_) => ("conflict", "Conflict"),
            Self::Internal(_) => ("internal", "Internal Server Error"),
            Self::Database(_) => ("database", "Database Error"),
            Self::Serialization(_) => ("serialization", "Serialization Error"),
            Self::ResourceExhausted(_) => ("resource-exhausted", "Resource Exhausted"),
        };

        ProblemDetails {
            r#type: format!("https://api.sentra-id.dev/problems/{}", r#type),
            title: title.to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
