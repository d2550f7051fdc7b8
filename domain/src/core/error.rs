//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Unknown expert role: {0}")]
    UnknownRole(String),

    #[error("Consultation scope must not be empty")]
    EmptyScope,

    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("Invalid consultation mode: {0}")]
    InvalidMode(String),

    #[error("Council planning failed: {0}")]
    PlanningFailed(String),

    #[error("Malformed review: {0}")]
    MalformedReview(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_display() {
        let error = DomainError::UnknownRole("wizard".to_string());
        assert_eq!(error.to_string(), "Unknown expert role: wizard");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyScope.is_cancelled());
        assert!(!DomainError::PlanningFailed("no tasks".to_string()).is_cancelled());
    }
}
