//! 领域实体

mod account_flag;
mod device;
mod login_event;

pub use account_flag::*;
pub use device::*;
pub use login_event::*;
