//! Tool gateway: the single path from an expert to the outside world.
//!
//! Resolves the requested tool, enforces the allow-list and the effective
//! timeout `min(tool_timeout, deadline)`, dispatches to the lookup backend
//! and mirrors the outcome to the usage log. It performs no retries.

use crate::ports::lookup_backend::{BackendError, LookupBackend};
use crate::ports::usage_log::{UsageEvent, UsageLog};
use crate::use_cases::findings_store::FindingsStore;
use council_domain::tool::names;
use council_domain::util::truncate_with_notice;
use council_domain::{
    ExpertKind, FindingOrigin, ToolCall, ToolCatalog, ToolInvocationRecord, finding_from_tool_call,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolGatewayError {
    #[error("Tool not allowed: {0}")]
    NotAllowed(String),

    #[error("Tool {tool} timed out after {}ms", .after.as_millis())]
    Timeout { tool: String, after: Duration },

    #[error("Tool {tool} failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolGatewayError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, ToolGatewayError::NotAllowed(_))
    }
}

/// Who is calling and what they may touch
pub struct ToolScope<'a> {
    pub session_id: &'a str,
    pub expert: ExpertKind,
    pub allowed: &'a [String],
    /// Target for `store_finding`
    pub findings: &'a FindingsStore,
}

pub struct ToolGateway<B: LookupBackend + 'static> {
    backend: Arc<B>,
    catalog: ToolCatalog,
    usage: Arc<dyn UsageLog>,
    tool_timeout: Duration,
    max_output_chars: usize,
}

impl<B: LookupBackend + 'static> ToolGateway<B> {
    pub fn new(backend: Arc<B>, catalog: ToolCatalog, usage: Arc<dyn UsageLog>) -> Self {
        Self {
            backend,
            catalog,
            usage,
            tool_timeout: Duration::from_secs(60),
            max_output_chars: 16_000,
        }
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_max_output_chars(mut self, max: usize) -> Self {
        self.max_output_chars = max;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Invoke one tool call.
    ///
    /// On success the returned record is also written to the usage log;
    /// failures are logged for audit before being returned.
    pub async fn invoke(
        &self,
        call: &ToolCall,
        scope: &ToolScope<'_>,
        deadline: Instant,
    ) -> Result<ToolInvocationRecord, ToolGatewayError> {
        let started = Instant::now();
        let result = self.invoke_inner(call, scope, deadline).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let input = call.input_json();
        let record = match &result {
            Ok(output) => ToolInvocationRecord::success(
                &call.id,
                &call.tool_name,
                input,
                output.as_str(),
                latency_ms,
            ),
            Err(e) => ToolInvocationRecord::failure(
                &call.id,
                &call.tool_name,
                input,
                e.to_string(),
                latency_ms,
            ),
        };
        self.usage.record(UsageEvent::tool_invocation(scope.session_id, &record));

        debug!(
            session = scope.session_id,
            tool = %call.tool_name,
            latency_ms,
            success = result.is_ok(),
            "Tool invocation finished"
        );
        result.map(|_| record)
    }

    async fn invoke_inner(
        &self,
        call: &ToolCall,
        scope: &ToolScope<'_>,
        deadline: Instant,
    ) -> Result<String, ToolGatewayError> {
        let canonical = self
            .catalog
            .resolve(&call.tool_name)
            .ok_or_else(|| ToolGatewayError::NotAllowed(call.tool_name.clone()))?
            .to_string();
        if !scope.allowed.iter().any(|a| a == &canonical) {
            return Err(ToolGatewayError::NotAllowed(call.tool_name.clone()));
        }

        let budget = self
            .tool_timeout
            .min(deadline.saturating_duration_since(Instant::now()));
        if budget.is_zero() {
            return Err(ToolGatewayError::Timeout {
                tool: canonical,
                after: Duration::ZERO,
            });
        }

        let output = tokio::time::timeout(budget, self.dispatch(&canonical, call, scope))
            .await
            .map_err(|_| ToolGatewayError::Timeout {
                tool: canonical.clone(),
                after: budget,
            })?
            .map_err(|message| ToolGatewayError::Execution {
                tool: canonical.clone(),
                message,
            })?;

        Ok(truncate_with_notice(&output, self.max_output_chars))
    }

    async fn dispatch(
        &self,
        tool: &str,
        call: &ToolCall,
        scope: &ToolScope<'_>,
    ) -> Result<String, String> {
        let limit = |default: usize| {
            call.get_u64("limit")
                .map(|n| n.clamp(1, 200) as usize)
                .unwrap_or(default)
        };
        let backend = self.backend.as_ref();

        let result = match tool {
            names::SEARCH_CODE => {
                let query = call.require_string("query")?;
                backend.search_code(query, call.get_string("path"), limit(20)).await
            }
            names::GET_SYMBOLS => backend.symbols(call.require_string("file_path")?).await,
            names::READ_FILE => {
                let start = call.get_u64("start_line").map(|n| n as usize);
                let end = call.get_u64("end_line").map(|n| n as usize);
                backend.read_file(call.require_string("file_path")?, start, end).await
            }
            names::FIND_CALLERS => {
                backend.callers(call.require_string("function_name")?, limit(20)).await
            }
            names::FIND_CALLEES => {
                backend.callees(call.require_string("function_name")?, limit(20)).await
            }
            names::RECALL => backend.recall(call.require_string("query")?, limit(5)).await,
            names::WEB_SEARCH => backend.web_query(call.require_string("query")?, limit(5)).await,
            names::STORE_FINDING => {
                let finding =
                    finding_from_tool_call(call, scope.expert)?.with_origin(FindingOrigin::Execute);
                let id = scope.findings.append(finding);
                return Ok(format!("Stored finding {}", id));
            }
            remote => {
                let procedure = remote
                    .strip_prefix(names::REMOTE_PREFIX)
                    .ok_or_else(|| format!("Unknown tool: {}", remote))?;
                let arguments = match call.get_string("arguments") {
                    Some(raw) => serde_json::from_str(raw)
                        .map_err(|e| format!("Invalid arguments JSON: {}", e))?,
                    None => call.input_json(),
                };
                backend.invoke_remote(procedure, &arguments).await
            }
        };

        result.map_err(|e: BackendError| e.to_string())
    }
}
