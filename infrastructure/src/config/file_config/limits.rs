//! Limits configuration from TOML (`[limits]` section)
//!
//! ```toml
//! [limits]
//! expert_timeout_secs = 600
//! max_iterations = 100
//! max_concurrent_experts = 3
//! ```

use super::ConfigValidationError;
use council_application::ConsultationLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    /// Budget of one expert session
    pub expert_timeout_secs: u64,
    /// Budget of one model call
    pub llm_call_timeout_secs: u64,
    /// Budget of a whole consultation
    pub parallel_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    /// Budget of the plan, review and synthesis calls
    pub coordinator_timeout_secs: u64,
    /// Extra time synthesis may use after the consultation deadline
    pub synthesis_grace_secs: u64,
    pub max_iterations: u32,
    pub max_concurrent_experts: usize,
    /// Tool calls of one turn run at once (outside the council)
    pub max_parallel_tool_calls: usize,
    pub max_tool_output_chars: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        let limits = ConsultationLimits::default();
        Self {
            expert_timeout_secs: limits.expert_timeout.as_secs(),
            llm_call_timeout_secs: limits.llm_call_timeout.as_secs(),
            parallel_timeout_secs: limits.parallel_timeout.as_secs(),
            tool_timeout_secs: limits.tool_timeout.as_secs(),
            coordinator_timeout_secs: limits.coordinator_timeout.as_secs(),
            synthesis_grace_secs: limits.synthesis_grace.as_secs(),
            max_iterations: limits.max_iterations,
            max_concurrent_experts: limits.max_concurrent_experts,
            max_parallel_tool_calls: limits.max_parallel_tool_calls,
            max_tool_output_chars: limits.max_tool_output_chars,
        }
    }
}

impl FileLimitsConfig {
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let timeouts = [
            ("limits.expert_timeout_secs", self.expert_timeout_secs),
            ("limits.llm_call_timeout_secs", self.llm_call_timeout_secs),
            ("limits.parallel_timeout_secs", self.parallel_timeout_secs),
            ("limits.tool_timeout_secs", self.tool_timeout_secs),
            ("limits.coordinator_timeout_secs", self.coordinator_timeout_secs),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                issues.push(ConfigValidationError::ZeroTimeout(field));
            }
        }
        if self.max_iterations == 0 {
            issues.push(ConfigValidationError::ZeroIterations);
        }
        if self.max_concurrent_experts == 0 {
            issues.push(ConfigValidationError::ZeroConcurrency("limits.max_concurrent_experts"));
        }
        if self.max_parallel_tool_calls == 0 {
            issues.push(ConfigValidationError::ZeroConcurrency("limits.max_parallel_tool_calls"));
        }
        issues
    }

    pub fn to_limits(&self) -> ConsultationLimits {
        ConsultationLimits::default()
            .with_expert_timeout(Duration::from_secs(self.expert_timeout_secs))
            .with_llm_call_timeout(Duration::from_secs(self.llm_call_timeout_secs))
            .with_parallel_timeout(Duration::from_secs(self.parallel_timeout_secs))
            .with_tool_timeout(Duration::from_secs(self.tool_timeout_secs))
            .with_coordinator_timeout(Duration::from_secs(self.coordinator_timeout_secs))
            .with_synthesis_grace(Duration::from_secs(self.synthesis_grace_secs))
            .with_max_iterations(self.max_iterations)
            .with_max_concurrent_experts(self.max_concurrent_experts)
            .with_max_parallel_tool_calls(self.max_parallel_tool_calls)
            .with_max_tool_output_chars(self.max_tool_output_chars)
    }
}
