//! 值对象

mod fingerprint;

pub use fingerprint::*;
