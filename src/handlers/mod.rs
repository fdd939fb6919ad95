//! HTTP handlers

pub mod health;
pub mod readings;
pub mod assessments;
pub mod risk_map;
pub mod alerts;
pub mod forecast;
