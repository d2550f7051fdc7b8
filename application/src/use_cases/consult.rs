//! Consult experts use case: the orchestrator's front door.
//!
//! Resolves roles, tools and strategies for a request, picks the council or
//! the parallel path, and always hands back a [`ConsultationResult`].

use crate::config::ConsultationConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::lookup_backend::LookupBackend;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::usage_log::{NoUsageLog, UsageEvent, UsageLog};
use crate::use_cases::council::CouncilPipeline;
use crate::use_cases::expert_loop::ExpertLoop;
use crate::use_cases::findings_store::FindingsStore;
use crate::use_cases::parallel::ParallelFallback;
use crate::use_cases::pipeline_input::{ExpertAssignment, PipelineInput};
use crate::use_cases::reasoning::Reasoner;
use crate::use_cases::tool_gateway::ToolGateway;
use council_domain::{
    ConsultationMode, ConsultationRequest, ConsultationResult, ConsultationStatus, DomainError,
    ExecutionPath, ExpertKind, RoleCatalog, ToolCatalog,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Why a consultation could not run at all.
///
/// Never returned to callers: the front door turns it into a `failed`
/// result.
#[derive(Error, Debug)]
pub enum ConsultError {
    #[error("No expert roles could be resolved")]
    NoRoles,

    #[error("Consultation scope is empty")]
    EmptyScope,

    #[error("consultation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub struct ConsultExpertsUseCase<G: LlmGateway + 'static, B: LookupBackend + 'static> {
    gateway: Arc<G>,
    backend: Arc<B>,
    roles: Arc<RoleCatalog>,
    tools: ToolCatalog,
    config: Arc<ConsultationConfig>,
    usage: Arc<dyn UsageLog>,
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> Clone for ConsultExpertsUseCase<G, B> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            backend: Arc::clone(&self.backend),
            roles: Arc::clone(&self.roles),
            tools: self.tools.clone(),
            config: Arc::clone(&self.config),
            usage: Arc::clone(&self.usage),
        }
    }
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> ConsultExpertsUseCase<G, B> {
    pub fn new(
        gateway: Arc<G>,
        backend: Arc<B>,
        roles: RoleCatalog,
        config: ConsultationConfig,
    ) -> Self {
        Self {
            gateway,
            backend,
            roles: Arc::new(roles),
            tools: ToolCatalog::builtin(),
            config: Arc::new(config),
            usage: Arc::new(NoUsageLog),
        }
    }

    pub fn with_usage_log(mut self, usage: Arc<dyn UsageLog>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_tool_catalog(mut self, tools: ToolCatalog) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &ConsultationConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleCatalog {
        &self.roles
    }

    /// Run a consultation with no progress reporting
    pub async fn consult(&self, request: ConsultationRequest) -> ConsultationResult {
        self.execute(request, Arc::new(NoProgress), CancellationToken::new()).await
    }

    /// Run a consultation that stops early when `cancel` fires.
    ///
    /// A cancelled consultation returns a `failed` result that still carries
    /// whatever findings and reports were collected.
    pub async fn consult_cancellable(
        &self,
        request: ConsultationRequest,
        cancel: CancellationToken,
    ) -> ConsultationResult {
        self.execute(request, Arc::new(NoProgress), cancel).await
    }

    pub async fn consult_with_progress(
        &self,
        request: ConsultationRequest,
        progress: Arc<dyn ProgressNotifier>,
        cancel: CancellationToken,
    ) -> ConsultationResult {
        self.execute(request, progress, cancel).await
    }

    async fn execute(
        &self,
        request: ConsultationRequest,
        progress: Arc<dyn ProgressNotifier>,
        cancel: CancellationToken,
    ) -> ConsultationResult {
        let started = Instant::now();
        let mut result = match self.prepare(&request) {
            Ok((input, warnings)) => {
                let mut result = self.run_bounded(&request, input, progress, cancel, started).await;
                let mut all_warnings = warnings;
                all_warnings.append(&mut result.warnings);
                result.warnings = all_warnings;
                result
            }
            Err((error, warnings)) => {
                warn!(error = %error, "Consultation could not start");
                let mut result = ConsultationResult::failed(request.scope(), error.to_string(), 0);
                result.warnings = warnings;
                result
            }
        };
        result.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            status = %result.status,
            path = ?result.path,
            findings = result.findings.len(),
            elapsed_ms = result.elapsed_ms,
            "Consultation finished"
        );
        self.usage.record(UsageEvent::consultation_complete(&result));
        result
    }

    /// Resolve roles, strategies and tools; warnings describe what was skipped
    #[allow(clippy::type_complexity)]
    fn prepare(
        &self,
        request: &ConsultationRequest,
    ) -> Result<(PipelineInput, Vec<String>), (ConsultError, Vec<String>)> {
        let mut warnings = Vec::new();
        if request.validate().is_err() {
            return Err((ConsultError::EmptyScope, warnings));
        }

        let requested: Vec<String> = if request.roles().is_empty() {
            self.config.default_roles.clone()
        } else {
            request.roles().to_vec()
        };

        let mut assignments: Vec<ExpertAssignment> = Vec::new();
        for name in &requested {
            let Some(role) = self.roles.get_role(name) else {
                warn!(role = %name, "Unknown role skipped");
                warnings.push(format!("unknown role `{}` skipped", name));
                continue;
            };
            if assignments.iter().any(|a| a.kind() == role.kind) {
                continue;
            }
            let allowed_tools =
                self.resolve_tools(request, role.allowed_tools.as_slice(), &mut warnings);
            let strategy =
                role.strategy_for(request.strategy(), &self.config.fallback_analysis_model);
            assignments.push(ExpertAssignment {
                role: role.clone(),
                strategy,
                allowed_tools,
            });
        }

        if assignments.is_empty() {
            return Err((ConsultError::NoRoles, warnings));
        }
        if request.mode() == ConsultationMode::Single {
            assignments.truncate(1);
        }

        Ok((
            PipelineInput {
                scope: request.scope().to_string(),
                context: request.context().map(str::to_string),
                assignments,
            },
            warnings,
        ))
    }

    /// Request allow-list, else configured allow-list, else the role's own
    /// tools; every name canonicalised through the catalog.
    fn resolve_tools(
        &self,
        request: &ConsultationRequest,
        role_tools: &[String],
        warnings: &mut Vec<String>,
    ) -> Vec<String> {
        let source: &[String] = request
            .tool_allowlist()
            .or(self.config.tool_allowlist.as_deref())
            .unwrap_or(role_tools);

        let mut tools: Vec<String> = Vec::new();
        for name in source {
            match self.tools.resolve(name) {
                Some(canonical) => {
                    if !tools.iter().any(|t| t == canonical) {
                        tools.push(canonical.to_string());
                    }
                }
                None => {
                    let warning = format!("unknown tool `{}` ignored", name);
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                }
            }
        }
        tools
    }

    fn uses_council(&self, request: &ConsultationRequest, input: &PipelineInput) -> bool {
        request.mode() == ConsultationMode::Council
            && self.config.council_enabled
            && input.assignments.len() >= 2
    }

    /// Run the chosen path under the outer time bound
    async fn run_bounded(
        &self,
        request: &ConsultationRequest,
        input: PipelineInput,
        progress: Arc<dyn ProgressNotifier>,
        cancel: CancellationToken,
        started: Instant,
    ) -> ConsultationResult {
        let limits = &self.config.limits;
        let store = Arc::new(
            FindingsStore::new(self.config.dedup).with_usage_log(Arc::clone(&self.usage)),
        );
        let deadline = started + limits.parallel_timeout;

        let reasoner = Reasoner::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.usage),
            limits.llm_call_timeout,
        );
        let tool_gateway =
            ToolGateway::new(Arc::clone(&self.backend), self.tools.clone(), Arc::clone(&self.usage))
                .with_tool_timeout(limits.tool_timeout)
                .with_max_output_chars(limits.max_tool_output_chars);
        let expert_loop =
            ExpertLoop::new(reasoner.clone(), Arc::new(tool_gateway), limits.max_iterations)
                .with_retry(self.config.retry.clone())
                .with_parallel_tool_calls(limits.max_parallel_tool_calls)
                .with_cancellation(cancel.clone());

        let use_council = self.uses_council(request, &input);
        info!(
            experts = input.assignments.len(),
            path = if use_council { "council" } else { "parallel" },
            "Starting consultation"
        );

        let pipeline = async {
            if use_council {
                // council experts append findings through tools, one call at a time
                let council_loop = expert_loop.clone().with_parallel_tool_calls(1);
                let council =
                    CouncilPipeline::new(reasoner, council_loop, Arc::clone(&self.config));
                let outcome =
                    council.run(&input, Arc::clone(&store), deadline, Arc::clone(&progress)).await;
                match outcome {
                    Ok(result) => return Ok(result),
                    Err(DomainError::Cancelled) => return Err(ConsultError::Cancelled),
                    Err(e) => {
                        warn!(
                            error = %e,
                            "Council planning failed, falling back to parallel experts"
                        );
                        let parallel = ParallelFallback::new(expert_loop, Arc::clone(&self.config));
                        let mut result =
                            parallel.run(&input, Arc::clone(&store), deadline, progress).await;
                        let warning = format!("{}; fell back to parallel consultation", e);
                        result.warnings.insert(0, warning);
                        return Ok(result);
                    }
                }
            }
            let parallel = ParallelFallback::new(expert_loop, Arc::clone(&self.config));
            Ok(parallel.run(&input, Arc::clone(&store), deadline, progress).await)
        };

        let outcome = match tokio::time::timeout(limits.outer_bound(), pipeline).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ConsultError::Internal(format!(
                "consultation exceeded its {}s bound",
                limits.outer_bound().as_secs()
            ))),
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(error) => {
                let mut result = ConsultationResult::failed(&input.scope, error.to_string(), 0);
                let dedupe = store.dedupe();
                result.path = if use_council {
                    ExecutionPath::Council
                } else {
                    ExecutionPath::Parallel
                };
                result.findings = dedupe.kept;
                result.superseded = dedupe.superseded;
                result.timed_out = matches!(error, ConsultError::Internal(_));
                result
            }
        };

        if cancel.is_cancelled() && result.status != ConsultationStatus::Failed {
            result.status = ConsultationStatus::Failed;
            result.error = Some(ConsultError::Cancelled.to_string());
        }
        result
    }

    /// Kinds a request would consult, for display before running
    pub fn resolve_roles(&self, request: &ConsultationRequest) -> Vec<ExpertKind> {
        self.prepare(request)
            .map(|(input, _)| input.kinds())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsultationLimits;
    use crate::ports::llm_gateway::{ModelPurpose, ModelReply, ModelRequest};
    use crate::testing::{
        CountingProgress, MockBackend, RecordingUsageLog, Scripted, ScriptedGateway,
    };
    use council_domain::tool::names;
    use council_domain::{SessionStatus, StrategyKind, ToolCall};
    use std::time::Duration;

    const PLAN: &str = r#"{"goal": "Assess the login flow", "tasks": [{"role": "security", "task": "Audit token handling"}]}"#;
    const NO_OPINION: &str = r#"{"agreements": []}"#;

    fn use_case(
        gateway: &Arc<ScriptedGateway>,
        config: ConsultationConfig,
    ) -> ConsultExpertsUseCase<ScriptedGateway, MockBackend> {
        let backend = Arc::new(MockBackend::new());
        ConsultExpertsUseCase::new(Arc::clone(gateway), backend, RoleCatalog::builtin(), config)
    }

    /// Each expert reports one finding at a file named after its role
    fn answer_for(label: &str) -> String {
        let key = label.trim_start_matches("expert:");
        format!("- [MEDIUM] {} @ src/{}.rs:1 (confidence 0.8): issue seen by {}", key, key, key)
    }

    fn council_script(req: &ModelRequest) -> Scripted {
        match req.label.as_str() {
            "council:plan" => ModelReply::text(PLAN).into(),
            "council:synthesis" => ModelReply::text("Synthesized report").into(),
            label if label.starts_with("council:review:") => ModelReply::text(NO_OPINION).into(),
            label => ModelReply::text(answer_for(label)).into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_role_takes_parallel_path() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let request = ConsultationRequest::new("Review the login handler").with_role("security");

        let result = use_case(&gateway, ConsultationConfig::default()).consult(request).await;

        assert_eq!(result.status, ConsultationStatus::Complete);
        assert_eq!(result.path, ExecutionPath::Parallel);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.narrative, answer_for("expert:security"));
        assert_eq!(gateway.labels(), vec!["expert:security"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_expert_times_out_and_result_is_partial() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label == "expert:performance" {
                if req.transcript.tool_call_count() == 0 {
                    return ModelReply::tools(
                        "- [LOW] performance: listing issues one query per row",
                        vec![ToolCall::new(names::SEARCH_CODE).with_arg("query", "SELECT")],
                    )
                    .into();
                }
                return (Duration::from_secs(3600), ModelReply::text("never")).into();
            }
            council_script(req)
        }));
        let limits = ConsultationLimits::default().with_llm_call_timeout(Duration::from_secs(3600));
        let config = ConsultationConfig::default().with_limits(limits);
        let request = ConsultationRequest::new("Review the login flow")
            .with_roles(["security", "architect", "code_reviewer", "performance"]);

        let result = use_case(&gateway, config).consult(request).await;

        assert_eq!(result.status, ConsultationStatus::Partial);
        assert_eq!(result.path, ExecutionPath::Council);
        assert!(result.timed_out);
        assert_eq!(result.experts.len(), 4);
        for key in ["security", "architect", "code_reviewer"] {
            assert!(
                result.findings.iter().any(|f| f.expert.key() == key),
                "missing findings from {}",
                key
            );
        }
        let slow = result.experts.iter().find(|e| e.expert.key() == "performance").unwrap();
        assert_eq!(slow.status, SessionStatus::TimedOut);
        assert!(slow.answer.as_deref().unwrap().contains("one query per row"));
        assert!(result.findings.iter().any(|f| f.expert.key() == "performance"));
        assert!(result.narrative.starts_with("Synthesized report"));
        assert!(result.narrative.ends_with("Consulted 4 experts: 3 succeeded, 1 degraded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            (Duration::from_secs(10), ModelReply::text(answer_for(&req.label))).into()
        }));
        let progress = Arc::new(CountingProgress::default());
        let request = ConsultationRequest::new("Review everything")
            .with_roles(["security", "architect", "code_reviewer", "performance", "documentation"])
            .with_mode(ConsultationMode::Parallel);

        let result = use_case(&gateway, ConsultationConfig::default())
            .consult_with_progress(request, progress.clone(), CancellationToken::new())
            .await;

        assert_eq!(progress.max_running(), 3);
        assert_eq!(progress.finished().len(), 5);
        assert!(result.experts.iter().all(|e| e.status == SessionStatus::Completed));
        assert_eq!(result.status, ConsultationStatus::Complete);
        assert_eq!(result.findings.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_timeout_still_synthesizes() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label == "expert:architect" {
                return (Duration::from_secs(300), ModelReply::text("late")).into();
            }
            council_script(req)
        }));
        let limits = ConsultationLimits::default().with_parallel_timeout(Duration::from_secs(100));
        let config = ConsultationConfig::default().with_limits(limits.clone());
        let request = ConsultationRequest::new("Review auth").with_roles(["security", "architect"]);
        let started = Instant::now();

        let result = use_case(&gateway, config).consult(request).await;

        assert!(started.elapsed() < limits.outer_bound());
        assert_eq!(result.status, ConsultationStatus::Partial);
        assert!(result.timed_out);
        assert_eq!(gateway.count_label("council:synthesis"), 1);
        assert_eq!(gateway.count_label("council:review:security"), 0);
        assert!(result.narrative.starts_with("Synthesized report"));
        assert!(result.findings.iter().any(|f| f.expert.key() == "security"));
        let architect = result.experts.iter().find(|e| e.expert.key() == "architect").unwrap();
        assert_eq!(architect.status, SessionStatus::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_review_marks_result_timed_out() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label.starts_with("council:review:") {
                return (Duration::from_secs(300), ModelReply::text(NO_OPINION)).into();
            }
            council_script(req)
        }));
        let limits = ConsultationLimits::default().with_parallel_timeout(Duration::from_secs(100));
        let config = ConsultationConfig::default().with_limits(limits.clone());
        let request = ConsultationRequest::new("Review auth").with_roles(["security", "architect"]);
        let started = Instant::now();

        let result = use_case(&gateway, config).consult(request).await;

        assert!(started.elapsed() < limits.outer_bound());
        assert_eq!(result.path, ExecutionPath::Council);
        assert!(result.experts.iter().all(|e| e.status == SessionStatus::Completed));
        assert_eq!(result.status, ConsultationStatus::Complete);
        assert!(result.timed_out);
        assert!(result.reviews.is_empty());
        let cut_off = format!(
            "{} review cut off by the pipeline deadline",
            ExpertKind::Security.display_name()
        );
        assert!(result.warnings.contains(&cut_off));
        assert_eq!(gateway.count_label("council:synthesis"), 1);
        assert!(result.narrative.starts_with("Synthesized report"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_after_deadline_is_bounded_by_grace() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label.starts_with("council:review:") || req.label == "council:synthesis" {
                return (Duration::from_secs(3600), ModelReply::text("too late")).into();
            }
            council_script(req)
        }));
        let limits = ConsultationLimits::default()
            .with_parallel_timeout(Duration::from_secs(100))
            .with_synthesis_grace(Duration::from_secs(60));
        let config = ConsultationConfig::default().with_limits(limits.clone());
        let request = ConsultationRequest::new("Review auth").with_roles(["security", "architect"]);
        let started = Instant::now();

        let result = use_case(&gateway, config).consult(request).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(160));
        assert!(elapsed < limits.outer_bound());
        assert!(result.timed_out);
        assert_eq!(result.status, ConsultationStatus::Complete);
        assert!(result.warnings.iter().any(|w| w == "synthesis did not finish in time"));
        assert!(result.narrative.starts_with("## Findings"));
        assert_eq!(result.findings.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_planning_failure_falls_back_to_parallel() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label == "council:plan" {
                return ModelReply::text("I would rather not plan.").into();
            }
            council_script(req)
        }));
        let request = ConsultationRequest::new("Review auth").with_roles(["security", "architect"]);

        let result = use_case(&gateway, ConsultationConfig::default()).consult(request).await;

        assert_eq!(result.path, ExecutionPath::Parallel);
        assert_eq!(result.status, ConsultationStatus::Complete);
        assert_eq!(result.experts.len(), 2);
        assert!(result.warnings.iter().any(|w| w.contains("fell back to parallel")));
        let heading = format!("## {} (completed)", ExpertKind::Security.display_name());
        assert!(result.narrative.contains(&heading));
        assert_eq!(gateway.count_label("council:synthesis"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_fails_but_keeps_findings() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.label == "expert:architect" {
                return (Duration::from_secs(300), ModelReply::text("late")).into();
            }
            ModelReply::text(answer_for(&req.label)).into()
        }));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            canceller.cancel();
        });
        let request = ConsultationRequest::new("Review auth")
            .with_roles(["security", "architect"])
            .with_mode(ConsultationMode::Parallel);

        let result = use_case(&gateway, ConsultationConfig::default())
            .consult_cancellable(request, token)
            .await;

        assert_eq!(result.status, ConsultationStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("consultation cancelled"));
        assert_eq!(result.findings.len(), 1);
        let architect = result.experts.iter().find(|e| e.expert.key() == "architect").unwrap();
        assert_eq!(architect.status, SessionStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_roles_are_skipped_and_none_left_is_failed() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let use_case = use_case(&gateway, ConsultationConfig::default());

        let request =
            ConsultationRequest::new("Review").with_roles(["wizard", "security", "security"]);
        let result = use_case.consult(request).await;
        assert_eq!(result.status, ConsultationStatus::Complete);
        assert_eq!(result.experts.len(), 1);
        assert_eq!(result.warnings, vec!["unknown role `wizard` skipped".to_string()]);

        let request = ConsultationRequest::new("Review").with_roles(["wizard"]);
        let result = use_case.consult(request).await;
        assert_eq!(result.status, ConsultationStatus::Failed);
        assert_eq!(result.path, ExecutionPath::None);
        assert_eq!(result.error.as_deref(), Some("No expert roles could be resolved"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_scope_is_failed_result() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let result = use_case(&gateway, ConsultationConfig::default())
            .consult(ConsultationRequest::new("   "))
            .await;
        assert_eq!(result.status, ConsultationStatus::Failed);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_roles_and_single_mode() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let use_case = use_case(&gateway, ConsultationConfig::default());

        let request = ConsultationRequest::new("Review").with_mode(ConsultationMode::Single);
        let result = use_case.consult(request).await;
        assert_eq!(result.path, ExecutionPath::Parallel);
        assert_eq!(gateway.labels(), vec!["expert:architect"]);

        let request = ConsultationRequest::new("Review");
        assert_eq!(
            use_case.resolve_roles(&request),
            vec![ExpertKind::Architect, ExpertKind::CodeReviewer, ExpertKind::Security]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_council_disabled_uses_parallel() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let config = ConsultationConfig::default().with_council_enabled(false);
        let request = ConsultationRequest::new("Review").with_roles(["security", "architect"]);

        let result = use_case(&gateway, config).consult(request).await;

        assert_eq!(result.path, ExecutionPath::Parallel);
        assert_eq!(gateway.count_label("council:plan"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_decoupled_strategy_and_tool_allowlist() {
        let gateway = Arc::new(ScriptedGateway::new(|req| match req.purpose {
            ModelPurpose::Analysis => {
                ModelReply::text("- [HIGH] security: secrets in env dump").into()
            }
            _ => ModelReply::text("done").into(),
        }));
        let request = ConsultationRequest::new("Review")
            .with_role("security")
            .with_strategy(StrategyKind::Decoupled)
            .with_tool_allowlist(vec!["grep".to_string(), "telepathy".to_string()]);

        let result = use_case(&gateway, ConsultationConfig::default()).consult(request).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        let offered: Vec<&str> = calls[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(offered, vec![names::SEARCH_CODE]);
        assert_eq!(calls[1].purpose, ModelPurpose::Analysis);
        assert!(result.experts[0].strategy.starts_with("decoupled("));
        assert_eq!(result.warnings, vec!["unknown tool `telepathy` ignored".to_string()]);
        assert_eq!(result.findings.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_usage_log_sees_model_calls_findings_and_completion() {
        let gateway = Arc::new(ScriptedGateway::new(council_script));
        let usage = Arc::new(RecordingUsageLog::default());
        let use_case =
            use_case(&gateway, ConsultationConfig::default()).with_usage_log(usage.clone());

        use_case.consult(ConsultationRequest::new("Review").with_role("security")).await;

        assert_eq!(usage.event_types(), vec!["model_call", "finding", "consultation_complete"]);
    }
}
