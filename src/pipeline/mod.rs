//! Ingestion -> trigger -> assessment -> alerting

pub mod assessment;
pub mod gate;
pub mod ingest;
pub mod notify;
pub mod scheduler;
pub mod trigger;

pub use assessment::*;
pub use gate::*;
pub use ingest::*;
pub use notify::*;
pub use trigger::*;
