//! Tools configuration from TOML (`[tools]` section)
//!
//! ```toml
//! [tools]
//! project_root = "."
//! memory_file = ".council/memory.md"
//! retry_attempts = 1
//! allowed = ["search_code", "read_file"]
//! ```

use council_application::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Root the code lookup tools are confined to (default: current directory)
    pub project_root: Option<PathBuf>,
    /// Markdown or text file the `recall` tool searches
    pub memory_file: Option<PathBuf>,
    /// Extra attempts for a timed-out or failed tool call
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Replaces every role's tool set when present
    pub allowed: Option<Vec<String>>,
    /// Whether `web_search` may reach the network
    pub web_enabled: bool,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            memory_file: None,
            retry_attempts: 0,
            retry_backoff_ms: 500,
            allowed: None,
            web_enabled: true,
        }
    }
}

impl FileToolsConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn project_root(&self) -> PathBuf {
        self.project_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
