//! 应用服务

mod fraud_check_service;
mod login_audit_service;
mod login_security_service;

pub use fraud_check_service::*;
pub use login_audit_service::*;
pub use login_security_service::*;
