//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL usage/audit log; disabled when unset
    pub usage_log: Option<PathBuf>,
    /// Diagnostic log file, same as `--log-file`
    pub log_file: Option<PathBuf>,
}
