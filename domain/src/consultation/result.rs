//! Consultation results

use crate::consultation::review::ReviewVerdict;
use crate::expert::role::ExpertKind;
use crate::expert::session::{SessionStatus, Transcript};
use crate::findings::dedupe::Supersession;
use crate::findings::entities::Finding;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Complete,
    Partial,
    Failed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Complete => "complete",
            ConsultationStatus::Partial => "partial",
            ConsultationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which pipeline produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPath {
    Council,
    Parallel,
    /// Nothing ran (the request failed up front)
    None,
}

/// What one expert session produced, kept for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertReport {
    pub session_id: String,
    pub expert: ExpertKind,
    pub display_name: String,
    /// Strategy the session ran with, e.g. `single(deepseek-chat)`
    pub strategy: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub iterations: u32,
    pub tool_calls: usize,
    pub findings: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub transcript: Transcript,
}

impl ExpertReport {
    /// Report for a session that never got to run
    pub fn not_started(
        session_id: impl Into<String>,
        expert: ExpertKind,
        status: SessionStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            expert,
            display_name: expert.display_name().to_string(),
            strategy: String::new(),
            status,
            answer: None,
            iterations: 0,
            tool_calls: 0,
            findings: 0,
            elapsed_ms: 0,
            error: Some(reason.into()),
            transcript: Transcript::new(),
        }
    }
}

/// The terminal artifact of one consultation.
///
/// `status` follows the expert sessions alone: `partial` iff one of them
/// timed out or failed. A pipeline deadline that only cuts off review or
/// synthesis leaves `status` as is and marks the result through
/// `timed_out` and a warning instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationResult {
    pub status: ConsultationStatus,
    pub path: ExecutionPath,
    pub scope: String,
    pub narrative: String,
    /// Deduplicated findings, in arrival order of their key
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<Supersession>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<ReviewVerdict>,
    pub experts: Vec<ExpertReport>,
    pub elapsed_ms: u64,
    /// Set when a session or the pipeline deadline cut work short, even if
    /// every expert completed
    pub timed_out: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConsultationResult {
    /// `partial` iff any expert timed out or failed, else `complete`
    pub fn status_for(experts: &[ExpertReport]) -> ConsultationStatus {
        if experts.iter().any(|e| e.status.is_degraded()) {
            ConsultationStatus::Partial
        } else {
            ConsultationStatus::Complete
        }
    }

    /// A result for a consultation that could not produce anything
    pub fn failed(scope: impl Into<String>, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            status: ConsultationStatus::Failed,
            path: ExecutionPath::None,
            scope: scope.into(),
            narrative: String::new(),
            findings: Vec::new(),
            superseded: Vec::new(),
            reviews: Vec::new(),
            experts: Vec::new(),
            elapsed_ms,
            timed_out: false,
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.experts
            .iter()
            .filter(|e| e.status == SessionStatus::Completed)
            .count()
    }

    pub fn degraded_count(&self) -> usize {
        self.experts.len() - self.succeeded_count()
    }

    /// `Consulted N experts: X succeeded, Y degraded`
    pub fn footer(&self) -> String {
        format!(
            "Consulted {} expert{}: {} succeeded, {} degraded",
            self.experts.len(),
            if self.experts.len() == 1 { "" } else { "s" },
            self.succeeded_count(),
            self.degraded_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(expert: ExpertKind, status: SessionStatus) -> ExpertReport {
        ExpertReport {
            status,
            ..ExpertReport::not_started(format!("{}-1", expert.key()), expert, status, "")
        }
    }

    #[test]
    fn test_status_rule() {
        let all_done = vec![
            report(ExpertKind::Security, SessionStatus::Completed),
            report(ExpertKind::Architect, SessionStatus::Completed),
        ];
        assert_eq!(ConsultationResult::status_for(&all_done), ConsultationStatus::Complete);

        let one_timed_out = vec![
            report(ExpertKind::Security, SessionStatus::Completed),
            report(ExpertKind::Architect, SessionStatus::TimedOut),
        ];
        assert_eq!(ConsultationResult::status_for(&one_timed_out), ConsultationStatus::Partial);

        let cancelled = vec![report(ExpertKind::Security, SessionStatus::Cancelled)];
        assert_eq!(ConsultationResult::status_for(&cancelled), ConsultationStatus::Complete);
    }

    #[test]
    fn test_failed_result_and_footer() {
        let mut result = ConsultationResult::failed("scope", "no roles resolved", 3);
        assert_eq!(result.status, ConsultationStatus::Failed);
        assert_eq!(result.path, ExecutionPath::None);

        result.experts = vec![
            report(ExpertKind::Security, SessionStatus::Completed),
            report(ExpertKind::Architect, SessionStatus::Failed),
        ];
        assert_eq!(result.footer(), "Consulted 2 experts: 1 succeeded, 1 degraded");
    }

    #[test]
    fn test_serializes_status_lowercase() {
        let result = ConsultationResult::failed("scope", "boom", 0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["path"], "none");
        assert!(json.get("warnings").is_none());
    }
}
