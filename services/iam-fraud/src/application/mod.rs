//! 应用层

pub mod services;
