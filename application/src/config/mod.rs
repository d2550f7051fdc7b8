//! Application-level configuration.
//!
//! - [`ConsultationLimits`]: timeouts, iteration cap and concurrency bound
//! - [`ConsultationConfig`]: limits plus council, retry and dedup settings

pub mod consultation_config;
pub mod limits;

pub use consultation_config::{ConsultationConfig, RetryPolicy};
pub use limits::ConsultationLimits;
