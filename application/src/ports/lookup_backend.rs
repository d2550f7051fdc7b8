//! Lookup backend port
//!
//! Code, memory and web lookups that expert tools are served from.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Source of everything an expert can look up.
///
/// Results are rendered as text for the model. Implementations live in the
/// infrastructure layer.
#[async_trait]
pub trait LookupBackend: Send + Sync {
    /// Regex or keyword search over source files
    async fn search_code(
        &self,
        query: &str,
        path: Option<&str>,
        limit: usize,
    ) -> Result<String, BackendError>;

    /// Symbols defined in a file
    async fn symbols(&self, file_path: &str) -> Result<String, BackendError>;

    /// File contents, optionally restricted to an inclusive 1-based line range
    async fn read_file(
        &self,
        file_path: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
    ) -> Result<String, BackendError>;

    /// Call sites of a function
    async fn callers(&self, function_name: &str, limit: usize) -> Result<String, BackendError>;

    /// Functions called from a function's body
    async fn callees(&self, function_name: &str, limit: usize) -> Result<String, BackendError>;

    /// Stored project memories matching a query
    async fn recall(&self, query: &str, limit: usize) -> Result<String, BackendError>;

    /// Web search
    async fn web_query(&self, query: &str, limit: usize) -> Result<String, BackendError>;

    /// Generic remote-procedure invocation
    async fn invoke_remote(
        &self,
        procedure: &str,
        _arguments: &serde_json::Value,
    ) -> Result<String, BackendError> {
        Err(BackendError::Unsupported(format!(
            "remote procedure `{}` has no backend",
            procedure
        )))
    }
}
