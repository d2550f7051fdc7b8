//! LLM Gateway port
//!
//! Defines the interface for calling models on behalf of experts and the
//! council coordinator.

use async_trait::async_trait;
use council_domain::{Model, ToolCall, ToolDefinition, Transcript};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// What a model call is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPurpose {
    /// Expert turn that may request tools
    Dialogue,
    /// Deep analysis over an expert's transcript
    Analysis,
    Plan,
    Review,
    Synthesis,
}

impl ModelPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelPurpose::Dialogue => "dialogue",
            ModelPurpose::Analysis => "analysis",
            ModelPurpose::Plan => "plan",
            ModelPurpose::Review => "review",
            ModelPurpose::Synthesis => "synthesis",
        }
    }
}

/// One model invocation
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: Model,
    pub purpose: ModelPurpose,
    /// Usage label, e.g. `expert:security` or `council:plan`
    pub label: String,
    pub system_prompt: String,
    pub transcript: Transcript,
    /// Trailing user instruction appended after the transcript
    pub instruction: Option<String>,
    /// Tools the model may call; empty means a plain completion
    pub tools: Vec<ToolDefinition>,
    /// Time budget for this call; adapters may use it as a request timeout
    pub timeout: Duration,
}

/// A model's answer: text, tool calls, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(commentary: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            text: commentary.into(),
            tool_calls: calls,
        }
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer. The caller
/// enforces deadlines; implementations only need to be cancellation safe.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn call(&self, request: ModelRequest) -> Result<ModelReply, GatewayError>;
}
