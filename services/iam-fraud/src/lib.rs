//! IAM Fraud Detection Engine
//!
//! 设备指纹与账号共享欺诈检测引擎：
//! - `domain`: 领域层（设备、登录事件、账号标记实体与检测服务）
//! - `application`: 应用层（登录审计、欺诈检查编排、登录安全门面）
//! - `infrastructure`: 基础设施层（PostgreSQL 仓储实现）
//!
//! 引擎在每次登录请求中被同步调用：生成设备指纹、执行设备数量
//! 准入检查、记录登录事件，并运行两个独立的检测器（不可能旅行、
//! 行为模式分析），检测结果去重后写入账号标记供人工审核。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
