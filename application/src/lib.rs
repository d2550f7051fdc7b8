//! Application layer for expert-council
//!
//! This crate contains use cases, port definitions, and consultation
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{ConsultationConfig, ConsultationLimits, RetryPolicy};
pub use ports::{
    llm_gateway::{GatewayError, LlmGateway, ModelPurpose, ModelReply, ModelRequest},
    lookup_backend::{BackendError, LookupBackend},
    progress::{NoProgress, ProgressNotifier},
    usage_log::{NoUsageLog, UsageEvent, UsageLog},
};
pub use use_cases::consult::{ConsultError, ConsultExpertsUseCase};
pub use use_cases::council::CouncilPipeline;
pub use use_cases::expert_loop::{ExpertLoop, ExpertRun};
pub use use_cases::findings_store::FindingsStore;
pub use use_cases::parallel::ParallelFallback;
pub use use_cases::pipeline_input::{ExpertAssignment, PipelineInput};
pub use use_cases::reasoning::{NextAction, Reasoner, ReasoningError};
pub use use_cases::tool_gateway::{ToolGateway, ToolGatewayError, ToolScope};
