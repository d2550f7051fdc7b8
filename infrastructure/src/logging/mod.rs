//! Usage log adapters.
//!
//! Provides [`JsonlUsageLog`], an append-only JSONL writer that implements
//! the [`UsageLog`](council_application::UsageLog) port.

mod jsonl_usage_log;

pub use jsonl_usage_log::JsonlUsageLog;
