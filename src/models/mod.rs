//! Data models

pub mod reading;
pub mod assessment;
pub mod alert;

pub use reading::*;
pub use assessment::*;
pub use alert::*;
