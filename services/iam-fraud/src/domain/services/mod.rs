//! 领域服务

mod device_registry;
mod flagging_service;
mod pattern_analyzer;
mod travel_detector;

pub use device_registry::*;
pub use flagging_service::*;
pub use pattern_analyzer::*;
pub use travel_detector::*;
