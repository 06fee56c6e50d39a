//! Payment-extension decision engine and the review workflow built around it.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
