//! Tool invocation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tool call as it happened: what was asked, what came back, how long it took.
///
/// Exactly one of `output` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub call_id: String,
    pub tool_name: String,
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ToolInvocationRecord {
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: serde_json::Value,
        output: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            input,
            output: Some(output.into()),
            error: None,
            latency_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: serde_json::Value,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            input,
            output: None,
            error: Some(error.into()),
            latency_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The text fed back to the model for this call
    pub fn content_for_model(&self) -> String {
        match (&self.output, &self.error) {
            (_, Some(error)) => format!("Error: {}", error),
            (Some(output), None) => output.clone(),
            (None, None) => String::new(),
        }
    }
}
