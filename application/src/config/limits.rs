//! Consultation limits: every bound the orchestrator enforces.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts, iteration cap and concurrency bound for one consultation.
///
/// | Limit | Default | Scope |
/// |-------|---------|-------|
/// | `expert_timeout` | 10 min | one expert session |
/// | `llm_call_timeout` | 6 min | one model call |
/// | `parallel_timeout` | 15 min | whole pipeline, from Plan start |
/// | `tool_timeout` | 60 s | one tool call |
/// | `coordinator_timeout` | 2 min | plan and synthesis calls |
/// | `synthesis_grace` | 60 s | synthesis after the pipeline deadline |
/// | `max_parallel_tool_calls` | 4 | tool calls of one turn outside the council |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationLimits {
    pub expert_timeout: Duration,
    pub llm_call_timeout: Duration,
    pub parallel_timeout: Duration,
    pub tool_timeout: Duration,
    pub coordinator_timeout: Duration,
    pub synthesis_grace: Duration,
    pub max_iterations: u32,
    pub max_concurrent_experts: usize,
    /// Tool calls of one model turn that may run at once
    pub max_parallel_tool_calls: usize,
    /// Tool output beyond this many bytes is cut before entering a transcript
    pub max_tool_output_chars: usize,
}

impl Default for ConsultationLimits {
    fn default() -> Self {
        Self {
            expert_timeout: Duration::from_secs(600),
            llm_call_timeout: Duration::from_secs(360),
            parallel_timeout: Duration::from_secs(900),
            tool_timeout: Duration::from_secs(60),
            coordinator_timeout: Duration::from_secs(120),
            synthesis_grace: Duration::from_secs(60),
            max_iterations: 100,
            max_concurrent_experts: 3,
            max_parallel_tool_calls: 4,
            max_tool_output_chars: 16_000,
        }
    }
}

impl ConsultationLimits {
    /// Upper bound on a whole consultation, including the outer guard's slack
    pub fn outer_bound(&self) -> Duration {
        self.parallel_timeout + self.synthesis_grace + Duration::from_secs(5)
    }

    // ==================== Builder Methods ====================

    pub fn with_expert_timeout(mut self, timeout: Duration) -> Self {
        self.expert_timeout = timeout;
        self
    }

    pub fn with_llm_call_timeout(mut self, timeout: Duration) -> Self {
        self.llm_call_timeout = timeout;
        self
    }

    pub fn with_parallel_timeout(mut self, timeout: Duration) -> Self {
        self.parallel_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_coordinator_timeout(mut self, timeout: Duration) -> Self {
        self.coordinator_timeout = timeout;
        self
    }

    pub fn with_synthesis_grace(mut self, grace: Duration) -> Self {
        self.synthesis_grace = grace;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_concurrent_experts(mut self, max: usize) -> Self {
        self.max_concurrent_experts = max;
        self
    }

    pub fn with_max_parallel_tool_calls(mut self, max: usize) -> Self {
        self.max_parallel_tool_calls = max;
        self
    }

    pub fn with_max_tool_output_chars(mut self, max: usize) -> Self {
        self.max_tool_output_chars = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = ConsultationLimits::default();
        assert_eq!(limits.expert_timeout, Duration::from_secs(600));
        assert_eq!(limits.llm_call_timeout, Duration::from_secs(360));
        assert_eq!(limits.parallel_timeout, Duration::from_secs(900));
        assert_eq!(limits.max_iterations, 100);
        assert_eq!(limits.max_concurrent_experts, 3);
        assert_eq!(limits.max_parallel_tool_calls, 4);
        assert_eq!(limits.outer_bound(), Duration::from_secs(965));
    }

    #[test]
    fn test_builder() {
        let limits = ConsultationLimits::default()
            .with_max_iterations(5)
            .with_max_concurrent_experts(1)
            .with_tool_timeout(Duration::from_secs(2));
        assert_eq!(limits.max_iterations, 5);
        assert_eq!(limits.max_concurrent_experts, 1);
        assert_eq!(limits.tool_timeout, Duration::from_secs(2));
    }
}
