//! Resolved inputs shared by the council and parallel pipelines.

use council_domain::{ExpertKind, ExpertRole, ReasoningStrategy};

/// One expert as the front door resolved it
#[derive(Debug, Clone)]
pub struct ExpertAssignment {
    pub role: ExpertRole,
    pub strategy: ReasoningStrategy,
    /// Canonical tool names, before any pipeline-specific additions
    pub allowed_tools: Vec<String>,
}

impl ExpertAssignment {
    pub fn kind(&self) -> ExpertKind {
        self.role.kind
    }

    /// Session id for the assignment at `index` (`security:2`)
    pub fn session_id(&self, index: usize) -> String {
        format!("{}:{}", self.role.key(), index + 1)
    }
}

/// What a pipeline runs over
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub scope: String,
    pub context: Option<String>,
    pub assignments: Vec<ExpertAssignment>,
}

impl PipelineInput {
    pub fn kinds(&self) -> Vec<ExpertKind> {
        self.assignments.iter().map(|a| a.kind()).collect()
    }
}
