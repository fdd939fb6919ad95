//! Risk classification and the pluggable risk model

pub mod level;
pub mod model;
pub mod stub;

pub use level::*;
pub use model::*;
pub use stub::*;
