//! Domain layer for expert-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Experts
//!
//! An expert is a role-bound persona (architect, security, performance, ...)
//! that runs one bounded, tool-using reasoning session. Roles live in an
//! immutable [`RoleCatalog`] snapshot.
//!
//! ## Findings
//!
//! Experts report severity-tagged [`Finding`]s. Findings are append-only;
//! duplicates collapse by (category, location) with the losers kept as
//! [`Supersession`]s for audit.
//!
//! ## Council
//!
//! With two or more experts, a consultation runs Plan → Execute → Review →
//! Delta → Synthesize. Otherwise experts run side by side and their findings
//! are merged.

pub mod consultation;
pub mod core;
pub mod expert;
pub mod findings;
pub mod prompt;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use consultation::{
    phase::CouncilPhase,
    plan::{CouncilPlan, PlannedTask, parse_plan},
    request::{ConsultationMode, ConsultationRequest},
    result::{ConsultationResult, ConsultationStatus, ExecutionPath, ExpertReport},
    review::{Disagreement, ReviewVerdict, parse_review},
};
pub use crate::core::{error::DomainError, model::Model};
pub use expert::{
    catalog::RoleCatalog,
    role::{ExpertKind, ExpertRole},
    session::{ExpertSession, SessionStatus, Transcript, Turn},
    strategy::{ReasoningStrategy, StrategyKind},
};
pub use findings::{
    dedupe::{DedupGranularity, Dedupe, FindingKey, Supersession, dedupe_findings},
    entities::{DEFAULT_CONFIDENCE, Finding, FindingId, FindingOrigin, Severity},
    parsing::{finding_from_tool_call, parse_findings},
};
pub use prompt::PromptTemplate;
pub use tool::{
    entities::{ToolCall, ToolCatalog, ToolDefinition, ToolParameter},
    record::ToolInvocationRecord,
};
