//! Consultation configuration snapshot.

use super::limits::ConsultationLimits;
use council_domain::{DedupGranularity, Model};
use std::time::Duration;

/// Retry policy for transient tool failures (timeouts and execution errors).
///
/// The tool gateway never retries on its own; the expert loop consults this
/// policy before turning a failure into a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 = no retry)
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Immutable configuration handed to the consultation use case.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationConfig {
    pub limits: ConsultationLimits,
    /// When false, multi-expert requests always use the parallel path
    pub council_enabled: bool,
    pub coordinator_model: Model,
    pub synthesis_model: Model,
    /// Analysis model for roles forced into decoupled mode without one
    pub fallback_analysis_model: Model,
    pub dedup: DedupGranularity,
    /// Roles consulted when a request names none
    pub default_roles: Vec<String>,
    /// Replaces every role's tool subset when set
    pub tool_allowlist: Option<Vec<String>>,
    pub retry: RetryPolicy,
}

impl Default for ConsultationConfig {
    fn default() -> Self {
        Self {
            limits: ConsultationLimits::default(),
            council_enabled: true,
            coordinator_model: Model::default(),
            synthesis_model: Model::default_analysis(),
            fallback_analysis_model: Model::default_analysis(),
            dedup: DedupGranularity::default(),
            default_roles: vec![
                "architect".to_string(),
                "code_reviewer".to_string(),
                "security".to_string(),
            ],
            tool_allowlist: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl ConsultationConfig {
    pub fn with_limits(mut self, limits: ConsultationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_council_enabled(mut self, enabled: bool) -> Self {
        self.council_enabled = enabled;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupGranularity) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_roles(mut self, roles: Vec<String>) -> Self {
        self.default_roles = roles;
        self
    }
}
