//! 仓储接口

mod account_flag_repository;
mod device_repository;
mod login_event_repository;

pub use account_flag_repository::*;
pub use device_repository::*;
pub use login_event_repository::*;
