//! PostgreSQL 持久化实现

mod postgres_account_flag_repository;
mod postgres_device_repository;
mod postgres_login_event_repository;

pub use postgres_account_flag_repository::*;
pub use postgres_device_repository::*;
pub use postgres_login_event_repository::*;
