//! Expert loop
//!
//! Drives one expert session from its task to a terminal status:
//! think (model call), act (tool calls), repeat until a final answer, the
//! iteration cap, the session deadline or cancellation. The tool calls of one
//! turn run with bounded concurrency and are recorded in call order. The
//! session is owned here, outside the guarded futures, so a deadline never
//! loses the transcript or the partial answer.

use crate::config::RetryPolicy;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::lookup_backend::LookupBackend;
use crate::use_cases::findings_store::FindingsStore;
use crate::use_cases::reasoning::{NextAction, Reasoner, ReasoningError};
use crate::use_cases::shared::{Guarded, guard};
use crate::use_cases::tool_gateway::{ToolGateway, ToolGatewayError, ToolScope};
use council_domain::{
    ExpertReport, ExpertRole, ExpertSession, FindingOrigin, PromptTemplate, ReasoningStrategy,
    SessionStatus, ToolCall, ToolInvocationRecord, parse_findings,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything one session needs to run
#[derive(Debug, Clone)]
pub struct ExpertRun {
    pub session_id: String,
    pub role: ExpertRole,
    pub strategy: ReasoningStrategy,
    /// First user turn (scope, context and assignment)
    pub task: String,
    /// Canonical tool names this session may call
    pub allowed_tools: Vec<String>,
}

/// How the think/act cycle ended
enum Exit {
    Answer(String),
    Failed(String),
    TimedOut,
    Cancelled,
}

pub struct ExpertLoop<G: LlmGateway + 'static, B: LookupBackend + 'static> {
    reasoner: Reasoner<G>,
    tools: Arc<ToolGateway<B>>,
    max_iterations: u32,
    max_parallel_tool_calls: usize,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> Clone for ExpertLoop<G, B> {
    fn clone(&self) -> Self {
        Self {
            reasoner: self.reasoner.clone(),
            tools: Arc::clone(&self.tools),
            max_iterations: self.max_iterations,
            max_parallel_tool_calls: self.max_parallel_tool_calls,
            retry: self.retry.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> ExpertLoop<G, B> {
    pub fn new(reasoner: Reasoner<G>, tools: Arc<ToolGateway<B>>, max_iterations: u32) -> Self {
        Self {
            reasoner,
            tools,
            max_iterations,
            max_parallel_tool_calls: 1,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Tool calls of one turn that may run at once (at least one)
    pub fn with_parallel_tool_calls(mut self, max: usize) -> Self {
        self.max_parallel_tool_calls = max.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run one session to a terminal status by `deadline`.
    ///
    /// Findings in the final (or partial) answer are appended to `store`
    /// whatever the status.
    pub async fn run(
        &self,
        run: ExpertRun,
        deadline: Instant,
        store: &FindingsStore,
    ) -> ExpertReport {
        let started = Instant::now();
        let kind = run.role.kind;
        let mut session = ExpertSession::new(&run.session_id, kind, self.max_iterations);
        session.record_task(&run.task);

        info!(
            session = %run.session_id,
            role = kind.key(),
            strategy = %run.strategy,
            "Expert session started"
        );

        let exit = self.think_and_act(&run, deadline, &mut session, store).await;

        let (status, answer, error) = match exit {
            Exit::Answer(text) => (SessionStatus::Completed, Some(text), None),
            Exit::Failed(reason) => (
                SessionStatus::Failed,
                session.partial_answer().map(str::to_string),
                Some(reason),
            ),
            Exit::TimedOut => (
                SessionStatus::TimedOut,
                session.partial_answer().map(str::to_string),
                Some("session deadline reached".to_string()),
            ),
            Exit::Cancelled => (
                SessionStatus::Cancelled,
                session.partial_answer().map(str::to_string),
                Some("consultation cancelled".to_string()),
            ),
        };
        session.finish(status);

        if let Some(answer) = &answer {
            let parsed: Vec<_> = parse_findings(answer, kind)
                .into_iter()
                .map(|f| f.with_origin(FindingOrigin::Execute))
                .collect();
            store.append_all(parsed);
        }

        info!(
            session = %run.session_id,
            role = kind.key(),
            status = status.as_str(),
            iterations = session.iterations(),
            "Expert session finished"
        );

        ExpertReport {
            session_id: run.session_id.clone(),
            expert: kind,
            display_name: run.role.display_name.clone(),
            strategy: run.strategy.to_string(),
            status,
            answer,
            iterations: session.iterations(),
            tool_calls: session.transcript().tool_call_count(),
            findings: store.by_expert(kind).len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            error,
            transcript: session.into_transcript(),
        }
    }

    async fn think_and_act(
        &self,
        run: &ExpertRun,
        deadline: Instant,
        session: &mut ExpertSession,
        store: &FindingsStore,
    ) -> Exit {
        let catalog = self.tools.catalog();
        let tool_defs = catalog.subset(&run.allowed_tools);
        let system = PromptTemplate::expert_system(&run.role, &tool_defs);
        let label = format!("expert:{}", run.role.key());

        loop {
            let action = self.reasoner.next_action(
                &run.strategy,
                &label,
                &system,
                session.transcript(),
                &tool_defs,
            );
            let (calls, commentary) = match guard(deadline, &self.cancel, action).await {
                Guarded::Cancelled => return Exit::Cancelled,
                Guarded::DeadlineReached => return Exit::TimedOut,
                Guarded::Done(Err(e)) => {
                    warn!(session = session.id(), error = %e, "Reasoning call failed");
                    return Exit::Failed(e.to_string());
                }
                Guarded::Done(Ok(NextAction::FinalAnswer(text))) => {
                    session.record_assistant(text.as_str(), Vec::new());
                    if !run.strategy.is_decoupled() {
                        return Exit::Answer(text);
                    }
                    let analysis =
                        self.reasoner.analyze(&run.strategy, &label, &system, session.transcript());
                    return self.final_answer(run, deadline, analysis).await;
                }
                Guarded::Done(Ok(NextAction::UseTools { calls, commentary })) => {
                    (calls, commentary)
                }
            };

            let calls = self.admit_calls(session, calls);
            session.record_assistant(commentary, calls.clone());

            let tool_scope = ToolScope {
                session_id: &run.session_id,
                expert: run.role.kind,
                allowed: &run.allowed_tools,
                findings: store,
            };
            let admitted = calls.iter().take_while(|_| session.try_begin_iteration()).count();
            let scope = &tool_scope;
            let invocations: Vec<_> = calls[..admitted]
                .iter()
                .map(|call| self.invoke_with_retry(call, scope, deadline))
                .collect();
            let outcomes: Vec<_> = futures::stream::iter(invocations)
                .buffered(self.max_parallel_tool_calls)
                .collect()
                .await;

            let mut interrupted = None;
            for outcome in outcomes {
                match outcome {
                    Guarded::Done(record) => session.record_tool(record),
                    Guarded::DeadlineReached => {
                        interrupted.get_or_insert(Exit::TimedOut);
                    }
                    Guarded::Cancelled => {
                        interrupted.get_or_insert(Exit::Cancelled);
                    }
                }
            }
            if let Some(exit) = interrupted {
                return exit;
            }

            if session.iterations_exhausted() {
                debug!(session = session.id(), "Iteration cap reached, concluding");
                return self.conclude(run, deadline, session, &label, &system).await;
            }
        }
    }

    /// Keep only the calls that fit the remaining iteration budget, giving
    /// each an id.
    fn admit_calls(&self, session: &ExpertSession, mut calls: Vec<ToolCall>) -> Vec<ToolCall> {
        let remaining = session.max_iterations().saturating_sub(session.iterations()) as usize;
        if calls.len() > remaining {
            debug!(
                session = session.id(),
                requested = calls.len(),
                remaining,
                "Dropping tool calls beyond the iteration cap"
            );
            calls.truncate(remaining);
        }
        let base = session.iterations();
        for (offset, call) in calls.iter_mut().enumerate() {
            if call.id.trim().is_empty() {
                call.id = format!("call_{}", base as usize + offset + 1);
            }
        }
        calls
    }

    /// One tool call with the configured retry policy.
    ///
    /// Failures come back as failure records for the transcript; only the
    /// deadline and cancellation escape.
    async fn invoke_with_retry(
        &self,
        call: &ToolCall,
        scope: &ToolScope<'_>,
        deadline: Instant,
    ) -> Guarded<ToolInvocationRecord> {
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            let invocation = self.tools.invoke(call, scope, deadline);
            let error: ToolGatewayError = match guard(deadline, &self.cancel, invocation).await {
                Guarded::Done(Ok(record)) => return Guarded::Done(record),
                Guarded::Done(Err(e)) => e,
                Guarded::DeadlineReached => return Guarded::DeadlineReached,
                Guarded::Cancelled => return Guarded::Cancelled,
            };

            if error.is_transient() && attempt < self.retry.attempts {
                attempt += 1;
                warn!(
                    session = scope.session_id,
                    tool = %call.tool_name,
                    attempt,
                    error = %error,
                    "Retrying tool call"
                );
                let backoff = tokio::time::sleep(self.retry.backoff * attempt);
                match guard(deadline, &self.cancel, backoff).await {
                    Guarded::Done(()) => continue,
                    Guarded::DeadlineReached => return Guarded::DeadlineReached,
                    Guarded::Cancelled => return Guarded::Cancelled,
                }
            }

            warn!(
                session = scope.session_id,
                tool = %call.tool_name,
                error = %error,
                "Tool call failed"
            );
            return Guarded::Done(ToolInvocationRecord::failure(
                &call.id,
                &call.tool_name,
                call.input_json(),
                error.to_string(),
                started.elapsed().as_millis() as u64,
            ));
        }
    }

    /// The iteration cap ends the session successfully, with a marker
    async fn conclude(
        &self,
        run: &ExpertRun,
        deadline: Instant,
        session: &mut ExpertSession,
        label: &str,
        system: &str,
    ) -> Exit {
        let marker = format!("[max iterations reached: {}]", session.max_iterations());
        let conclusion = self.reasoner.conclude(
            &run.strategy,
            label,
            system,
            session.transcript(),
            session.max_iterations(),
        );
        match guard(deadline, &self.cancel, conclusion).await {
            Guarded::Done(Ok(text)) => {
                session.record_assistant(text.as_str(), Vec::new());
                Exit::Answer(format!("{}\n\n{}", text.trim_end(), marker))
            }
            Guarded::Done(Err(e)) => {
                warn!(
                    session = session.id(),
                    error = %e,
                    "Concluding call failed after iteration cap"
                );
                session.note(format!("conclusion failed: {}", e));
                let partial = session.partial_answer().unwrap_or_default().trim_end().to_string();
                if partial.is_empty() {
                    Exit::Answer(marker)
                } else {
                    Exit::Answer(format!("{}\n\n{}", partial, marker))
                }
            }
            Guarded::DeadlineReached => Exit::TimedOut,
            Guarded::Cancelled => Exit::Cancelled,
        }
    }

    async fn final_answer(
        &self,
        run: &ExpertRun,
        deadline: Instant,
        analysis: impl Future<Output = Result<String, ReasoningError>>,
    ) -> Exit {
        match guard(deadline, &self.cancel, analysis).await {
            Guarded::Done(Ok(text)) => Exit::Answer(text),
            Guarded::Done(Err(e)) => {
                warn!(session = %run.session_id, error = %e, "Analysis call failed");
                Exit::Failed(e.to_string())
            }
            Guarded::DeadlineReached => Exit::TimedOut,
            Guarded::Cancelled => Exit::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{GatewayError, ModelPurpose, ModelReply};
    use crate::ports::usage_log::NoUsageLog;
    use crate::testing::{MockBackend, ScriptedGateway};
    use council_domain::tool::names;
    use council_domain::{DedupGranularity, ExpertKind, Model, ToolCatalog, Turn};
    use std::time::Duration;

    fn expert_loop(
        gateway: &Arc<ScriptedGateway>,
        backend: MockBackend,
        max_iterations: u32,
    ) -> ExpertLoop<ScriptedGateway, MockBackend> {
        let reasoner =
            Reasoner::new(Arc::clone(gateway), Arc::new(NoUsageLog), Duration::from_secs(360));
        let tools =
            ToolGateway::new(Arc::new(backend), ToolCatalog::builtin(), Arc::new(NoUsageLog))
                .with_tool_timeout(Duration::from_secs(60));
        ExpertLoop::new(reasoner, Arc::new(tools), max_iterations)
    }

    fn run_for(kind: ExpertKind, strategy: ReasoningStrategy) -> ExpertRun {
        ExpertRun {
            session_id: format!("{}:1", kind.key()),
            role: ExpertRole::builtin(kind, Model::default()),
            strategy,
            task: "Review the session handling".to_string(),
            allowed_tools: vec![names::SEARCH_CODE.to_string(), names::READ_FILE.to_string()],
        }
    }

    fn single() -> ReasoningStrategy {
        ReasoningStrategy::Single { model: Model::default() }
    }

    fn search(query: &str) -> ToolCall {
        ToolCall::new(names::SEARCH_CODE).with_arg("query", query)
    }

    fn deadline_in(secs: u64) -> Instant {
        Instant::now() + Duration::from_secs(secs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_decoupled_makes_one_analysis_call_at_loop_end() {
        let gateway = Arc::new(ScriptedGateway::new(|req| match req.purpose {
            ModelPurpose::Analysis => ModelReply::text(
                "- [HIGH] security @ src/auth.rs:10 (confidence 0.9): token written to logs",
            )
            .into(),
            _ if req.transcript.tool_call_count() < 3 => {
                ModelReply::tools("", vec![search("token")]).into()
            }
            _ => ModelReply::text("done").into(),
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let strategy = ReasoningStrategy::Decoupled {
            dialogue: Model::DeepSeekChat,
            analysis: Model::DeepSeekReasoner,
        };

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .run(run_for(ExpertKind::Security, strategy), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.tool_calls, 3);
        let calls = gateway.calls();
        assert_eq!(calls.iter().filter(|c| c.purpose == ModelPurpose::Analysis).count(), 1);
        assert_eq!(calls.iter().filter(|c| c.purpose == ModelPurpose::Dialogue).count(), 4);
        assert_eq!(calls.last().map(|c| c.label.as_str()), Some("expert:security:analysis"));
        assert_eq!(calls.last().map(|c| c.model.clone()), Some(Model::DeepSeekReasoner));
        assert_eq!(store.by_expert(ExpertKind::Security).len(), 1);
        assert_eq!(report.findings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_iterations_completes_with_marker() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.tools.is_empty() {
                ModelReply::text("Sessions are never invalidated.").into()
            } else {
                ModelReply::tools("digging", vec![search("session"), search("logout")]).into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);

        let report = expert_loop(&gateway, MockBackend::new(), 5)
            .run(run_for(ExpertKind::CodeReviewer, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.iterations, 5);
        assert_eq!(report.tool_calls, 5);
        let answer = report.answer.unwrap();
        assert!(answer.starts_with("Sessions are never invalidated."));
        assert!(answer.ends_with("[max iterations reached: 5]"));
        // three tool turns, then one concluding call
        assert_eq!(gateway.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_calls_of_one_turn_run_concurrently_in_order() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                ModelReply::tools("", vec![search("alpha"), search("beta"), search("gamma")]).into()
            } else {
                ModelReply::text("done").into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let backend = MockBackend::new().with_delay(names::SEARCH_CODE, Duration::from_secs(10));
        let started = Instant::now();

        let report = expert_loop(&gateway, backend, 100)
            .with_parallel_tool_calls(2)
            .run(run_for(ExpertKind::Security, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.iterations, 3);
        let ids: Vec<String> =
            report.transcript.tool_records().map(|r| r.call_id.clone()).collect();
        assert_eq!(ids, vec!["call_1", "call_2", "call_3"]);
        // two at a time: 10s for the first pair, 10s for the last call
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_calls_run_one_at_a_time_by_default() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                ModelReply::tools("", vec![search("alpha"), search("beta")]).into()
            } else {
                ModelReply::text("done").into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let backend = MockBackend::new().with_delay(names::SEARCH_CODE, Duration::from_secs(10));
        let started = Instant::now();

        let report = expert_loop(&gateway, backend, 100)
            .run(run_for(ExpertKind::Security, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.tool_calls, 2);
        assert!(started.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_failure_is_recorded_and_loop_continues() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                ModelReply::tools("", vec![search("password")]).into()
            } else {
                ModelReply::text("Could not search; no findings.").into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let backend = MockBackend::new().with_failure(names::SEARCH_CODE, "index unavailable");

        let report = expert_loop(&gateway, backend, 100)
            .run(run_for(ExpertKind::Security, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        let record = report.transcript.tool_records().next().unwrap().clone();
        assert!(!record.is_success());
        assert_eq!(record.call_id, "call_1");
        assert!(record.content_for_model().starts_with("Error: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disallowed_tool_does_not_fail_session() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                let call = ToolCall::new(names::WEB_SEARCH).with_arg("query", "cve");
                ModelReply::tools("", vec![call]).into()
            } else {
                ModelReply::text("- [LOW] docs: README is stale").into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .run(run_for(ExpertKind::Documentation, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.iterations, 1);
        assert!(report.transcript.tool_records().all(|r| !r.is_success()));
        assert_eq!(report.findings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_partial_answer() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                let partial = "- [MEDIUM] architecture: session store is global";
                ModelReply::tools(partial, vec![search("SessionStore")]).into()
            } else {
                (Duration::from_secs(3600), ModelReply::text("too late")).into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let started = Instant::now();

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .run(run_for(ExpertKind::Architect, single()), deadline_in(300), &store)
            .await;

        assert_eq!(report.status, SessionStatus::TimedOut);
        assert!(started.elapsed() <= Duration::from_secs(301));
        assert_eq!(
            report.answer.as_deref(),
            Some("- [MEDIUM] architecture: session store is global")
        );
        assert_eq!(store.by_expert(ExpertKind::Architect).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reasoning_error_fails_session() {
        let gateway = Arc::new(ScriptedGateway::new(|_| {
            GatewayError::RequestFailed("HTTP 500".to_string()).into()
        }));
        let store = FindingsStore::new(DedupGranularity::Location);

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .run(run_for(ExpertKind::Performance, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Failed);
        assert!(report.error.unwrap().contains("HTTP 500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_call_timeout_is_a_failure_not_a_timeout() {
        let gateway = Arc::new(ScriptedGateway::new(|_| {
            (Duration::from_secs(400), ModelReply::text("slow")).into()
        }));
        let store = FindingsStore::new(DedupGranularity::Location);

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .run(run_for(ExpertKind::Performance, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_retries_transient_failures() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            if req.transcript.tool_call_count() == 0 {
                ModelReply::tools("", vec![search("x")]).into()
            } else {
                ModelReply::text("done").into()
            }
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let backend = MockBackend::new().with_failure(names::SEARCH_CODE, "flaky");
        let retry = RetryPolicy {
            attempts: 2,
            backoff: Duration::from_secs(1),
        };
        let started = Instant::now();

        let report = expert_loop(&gateway, backend, 100)
            .with_retry(retry)
            .run(run_for(ExpertKind::Security, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Completed);
        // backoff of 1s then 2s, and retries do not use iterations
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(report.iterations, 1);
        assert_eq!(report.tool_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_ends_session_as_cancelled() {
        let gateway = Arc::new(ScriptedGateway::new(|_| {
            (Duration::from_secs(60), ModelReply::text("late")).into()
        }));
        let store = FindingsStore::new(DedupGranularity::Location);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let report = expert_loop(&gateway, MockBackend::new(), 100)
            .with_cancellation(token)
            .run(run_for(ExpertKind::Architect, single()), deadline_in(600), &store)
            .await;

        assert_eq!(report.status, SessionStatus::Cancelled);
        assert!(matches!(report.transcript.turns().first(), Some(Turn::Task { .. })));
    }
}
