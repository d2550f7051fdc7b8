//! Infrastructure layer for expert-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration loading, the JSONL usage log,
//! the local lookup backend and the HTTP model gateway.

pub mod config;
pub mod logging;
pub mod lookup;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileConfig, FileCouncilConfig,
    FileLimitsConfig, FileLoggingConfig, FileProviderConfig, FileRoleConfig, FileToolsConfig,
};
pub use logging::JsonlUsageLog;
pub use lookup::LocalCodeBackend;
#[cfg(feature = "web-tools")]
pub use lookup::DuckDuckGoSearch;
#[cfg(feature = "http-provider")]
pub use providers::OpenAiCompatGateway;
