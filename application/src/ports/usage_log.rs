//! Port for the usage and audit log.
//!
//! Every tool invocation, model call and finding is mirrored here as an
//! append-only structured record. This is separate from `tracing`: tracing
//! carries diagnostics, this carries data for later audit and billing.

use council_domain::{ConsultationResult, Finding, ToolInvocationRecord};
use serde_json::{Value, json};

/// A structured usage event.
pub struct UsageEvent {
    /// Event type identifier (e.g., "tool_invocation", "model_call").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl UsageEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn tool_invocation(session_id: &str, record: &ToolInvocationRecord) -> Self {
        Self::new(
            "tool_invocation",
            json!({
                "session": session_id,
                "call_id": record.call_id,
                "tool": record.tool_name,
                "input": record.input,
                "success": record.is_success(),
                "error": record.error,
                "output_bytes": record.output.as_ref().map(|o| o.len()),
                "latency_ms": record.latency_ms,
            }),
        )
    }

    pub fn model_call(
        label: &str,
        model: &str,
        purpose: &str,
        latency_ms: u64,
        error: Option<&str>,
    ) -> Self {
        Self::new(
            "model_call",
            json!({
                "label": label,
                "model": model,
                "purpose": purpose,
                "latency_ms": latency_ms,
                "success": error.is_none(),
                "error": error,
            }),
        )
    }

    pub fn finding(finding: &Finding) -> Self {
        Self::new("finding", json!(finding))
    }

    pub fn consultation_complete(result: &ConsultationResult) -> Self {
        Self::new(
            "consultation_complete",
            json!({
                "status": result.status,
                "path": result.path,
                "experts": result.experts.len(),
                "findings": result.findings.len(),
                "superseded": result.superseded.len(),
                "elapsed_ms": result.elapsed_ms,
                "timed_out": result.timed_out,
                "error": result.error,
            }),
        )
    }
}

/// Port for recording usage events.
///
/// `record` is synchronous and infallible: it must never block or fail the
/// caller. Failures are the adapter's problem.
pub trait UsageLog: Send + Sync {
    fn record(&self, event: UsageEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoUsageLog;

impl UsageLog for NoUsageLog {
    fn record(&self, _event: UsageEvent) {}
}
