//! Council pipeline
//!
//! Plan, Execute, Review, Delta, Synthesize. The whole pipeline is bounded
//! by one deadline; once it passes, the remaining phases are skipped and
//! synthesis runs over whatever the findings store holds.

use crate::config::ConsultationConfig;
use crate::ports::llm_gateway::{LlmGateway, ModelPurpose};
use crate::ports::lookup_backend::LookupBackend;
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::expert_loop::{ExpertLoop, ExpertRun};
use crate::use_cases::findings_store::FindingsStore;
use crate::use_cases::pipeline_input::PipelineInput;
use crate::use_cases::reasoning::Reasoner;
use crate::use_cases::shared::{FanOutLimits, Guarded, guard, run_experts};
use council_domain::tool::names;
use council_domain::{
    ConsultationResult, CouncilPhase, CouncilPlan, DomainError, ExecutionPath, ExpertReport,
    Finding, FindingOrigin, PromptTemplate, ReviewVerdict, SessionStatus, parse_plan, parse_review,
};
use futures::StreamExt;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct CouncilPipeline<G: LlmGateway + 'static, B: LookupBackend + 'static> {
    reasoner: Reasoner<G>,
    expert_loop: ExpertLoop<G, B>,
    config: Arc<ConsultationConfig>,
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> CouncilPipeline<G, B> {
    pub fn new(
        reasoner: Reasoner<G>,
        expert_loop: ExpertLoop<G, B>,
        config: Arc<ConsultationConfig>,
    ) -> Self {
        Self {
            reasoner,
            expert_loop,
            config,
        }
    }

    /// Run the council.
    ///
    /// Fails only when no plan could be made (or the consultation was
    /// cancelled while planning); the caller is expected to fall back to the
    /// parallel path over the same experts.
    pub async fn run(
        &self,
        input: &PipelineInput,
        store: Arc<FindingsStore>,
        deadline: Instant,
        progress: Arc<dyn ProgressNotifier>,
    ) -> Result<ConsultationResult, DomainError> {
        let started = Instant::now();
        let mut warnings = Vec::new();

        let plan = self.phase_plan(input, deadline, progress.as_ref()).await?;
        let reports = self.phase_execute(input, &plan, &store, deadline, &progress).await;

        let cancelled = self.expert_loop.cancellation().is_cancelled();
        let mut timed_out = Instant::now() >= deadline;
        let reviews = if timed_out || cancelled {
            info!("Skipping review: pipeline deadline reached or consultation cancelled");
            Vec::new()
        } else {
            let reviews = self
                .phase_review(input, &reports, &store, deadline, progress.as_ref(), &mut warnings)
                .await;
            self.phase_delta(&reviews, &store, progress.as_ref());
            reviews
        };

        timed_out |= Instant::now() >= deadline
            || reports.iter().any(|r| r.status == SessionStatus::TimedOut);

        let dedupe = store.dedupe();
        let mut result = ConsultationResult {
            status: ConsultationResult::status_for(&reports),
            path: ExecutionPath::Council,
            scope: input.scope.clone(),
            narrative: String::new(),
            findings: dedupe.kept,
            superseded: dedupe.superseded,
            reviews,
            experts: reports,
            elapsed_ms: 0,
            timed_out,
            warnings: Vec::new(),
            error: None,
        };

        let narrative = if cancelled {
            fallback_narrative(&result.findings)
        } else {
            self.phase_synthesize(&result, deadline, progress.as_ref(), &mut warnings).await
        };
        result.narrative = format!("{}\n\n---\n{}", narrative.trim_end(), result.footer());
        result.warnings = warnings;
        result.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Phase 1: one coordinator call decomposes the scope into tasks
    async fn phase_plan(
        &self,
        input: &PipelineInput,
        deadline: Instant,
        progress: &dyn ProgressNotifier,
    ) -> Result<CouncilPlan, DomainError> {
        info!("Phase 1: Plan");
        progress.on_phase_start(&CouncilPhase::Plan, 1);

        let roles: Vec<_> = input.assignments.iter().map(|a| &a.role).collect();
        let prompt = PromptTemplate::plan_prompt(&input.scope, input.context.as_deref(), &roles);
        let timeout = self
            .config
            .limits
            .coordinator_timeout
            .min(deadline.saturating_duration_since(Instant::now()));

        let call = self.reasoner.consult_once(
            &self.config.coordinator_model,
            ModelPurpose::Plan,
            "council:plan",
            PromptTemplate::plan_system(),
            &prompt,
            timeout,
        );
        let outcome = guard(deadline, self.expert_loop.cancellation(), call).await;
        progress.on_phase_complete(&CouncilPhase::Plan);

        let text = match outcome {
            Guarded::Done(Ok(text)) => text,
            Guarded::Done(Err(e)) => return Err(DomainError::PlanningFailed(e.to_string())),
            Guarded::DeadlineReached => {
                return Err(DomainError::PlanningFailed(
                    "coordinator did not answer before the pipeline deadline".to_string(),
                ));
            }
            Guarded::Cancelled => return Err(DomainError::Cancelled),
        };

        let plan = parse_plan(&text, &input.kinds(), &input.scope)?;
        debug!(goal = %plan.goal, tasks = plan.tasks.len(), "Council plan ready");
        Ok(plan)
    }

    /// Phase 2: one expert session per planned task
    async fn phase_execute(
        &self,
        input: &PipelineInput,
        plan: &CouncilPlan,
        store: &Arc<FindingsStore>,
        deadline: Instant,
        progress: &Arc<dyn ProgressNotifier>,
    ) -> Vec<ExpertReport> {
        info!("Phase 2: Execute");
        progress.on_phase_start(&CouncilPhase::Execute, input.assignments.len());

        let runs: Vec<ExpertRun> = input
            .assignments
            .iter()
            .enumerate()
            .map(|(index, assignment)| {
                let mut allowed_tools = assignment.allowed_tools.clone();
                if !allowed_tools.iter().any(|t| t == names::STORE_FINDING) {
                    allowed_tools.push(names::STORE_FINDING.to_string());
                }
                ExpertRun {
                    session_id: assignment.session_id(index),
                    role: assignment.role.clone(),
                    strategy: assignment.strategy.clone(),
                    task: PromptTemplate::expert_task(
                        &input.scope,
                        input.context.as_deref(),
                        plan.task_for(assignment.kind()),
                    ),
                    allowed_tools,
                }
            })
            .collect();

        let limits = FanOutLimits {
            max_concurrent: self.config.limits.max_concurrent_experts,
            expert_timeout: self.config.limits.expert_timeout,
            pipeline_deadline: deadline,
        };
        let reports = run_experts(
            &self.expert_loop,
            runs,
            Arc::clone(store),
            limits,
            Arc::clone(progress),
        )
        .await;

        progress.on_phase_complete(&CouncilPhase::Execute);
        reports
    }

    /// Phase 3: each completed expert reviews the others' findings
    async fn phase_review(
        &self,
        input: &PipelineInput,
        reports: &[ExpertReport],
        store: &FindingsStore,
        deadline: Instant,
        progress: &dyn ProgressNotifier,
        warnings: &mut Vec<String>,
    ) -> Vec<ReviewVerdict> {
        let current = store.dedupe().kept;
        let mut requests = Vec::new();
        for report in reports.iter().filter(|r| r.status == SessionStatus::Completed) {
            let assignment = input.assignments.iter().find(|a| a.kind() == report.expert);
            let Some(assignment) = assignment else {
                continue;
            };
            let others: Vec<Finding> = current
                .iter()
                .filter(|f| f.expert != report.expert)
                .cloned()
                .collect();
            if others.is_empty() {
                debug!(role = report.expert.key(), "Nothing to review");
                continue;
            }
            requests.push((assignment, report.answer.clone(), others));
        }

        info!("Phase 3: Review");
        progress.on_phase_start(&CouncilPhase::Review, requests.len());

        let timeout = self
            .config
            .limits
            .coordinator_timeout
            .min(deadline.saturating_duration_since(Instant::now()));
        let cancel = self.expert_loop.cancellation();

        let outcomes: Vec<_> = futures::stream::iter(requests)
            .map(|(assignment, own_answer, others)| async move {
                let label = format!("council:review:{}", assignment.role.key());
                let system = PromptTemplate::review_system(&assignment.role);
                let prompt =
                    PromptTemplate::review_prompt(&input.scope, own_answer.as_deref(), &others);
                let call = self.reasoner.consult_once(
                    assignment.strategy.dialogue_model(),
                    ModelPurpose::Review,
                    &label,
                    &system,
                    &prompt,
                    timeout,
                );
                (assignment.kind(), guard(deadline, cancel, call).await)
            })
            .buffered(self.config.limits.max_concurrent_experts.max(1))
            .collect()
            .await;

        let mut verdicts = Vec::new();
        for (reviewer, outcome) in outcomes {
            match outcome {
                Guarded::Done(Ok(text)) => match parse_review(&text, reviewer) {
                    Ok(verdict) => verdicts.push(verdict),
                    Err(e) => {
                        warn!(role = reviewer.key(), error = %e, "Unusable review");
                        warnings.push(format!("{} review ignored: {}", reviewer.display_name(), e));
                    }
                },
                Guarded::Done(Err(e)) => {
                    warn!(role = reviewer.key(), error = %e, "Review call failed");
                    warnings.push(format!("{} review failed: {}", reviewer.display_name(), e));
                }
                Guarded::DeadlineReached => {
                    warnings.push(format!(
                        "{} review cut off by the pipeline deadline",
                        reviewer.display_name()
                    ));
                }
                Guarded::Cancelled => {}
            }
        }

        progress.on_phase_complete(&CouncilPhase::Review);
        verdicts
    }

    /// Phase 4: append review gaps and disputed revisions.
    ///
    /// Nothing is removed; a disputed finding is superseded by a new entry
    /// that points back at it.
    fn phase_delta(
        &self,
        reviews: &[ReviewVerdict],
        store: &FindingsStore,
        progress: &dyn ProgressNotifier,
    ) {
        info!("Phase 4: Delta");
        progress.on_phase_start(&CouncilPhase::Delta, reviews.len());

        let granularity = store.granularity();
        let mut known: HashSet<_> = store.all().iter().map(|f| f.dedup_key(granularity)).collect();
        let mut added = 0;

        for verdict in reviews {
            for gap in &verdict.gaps {
                let gap = gap.clone().with_origin(FindingOrigin::Review);
                if known.insert(gap.dedup_key(granularity)) {
                    store.append(gap);
                    added += 1;
                }
            }

            for disagreement in &verdict.disagreements {
                let Some(target) = store.get(disagreement.finding_id) else {
                    debug!(
                        finding = %disagreement.finding_id,
                        "Disagreement names an unknown finding"
                    );
                    continue;
                };
                if target.expert == verdict.reviewer {
                    continue;
                }
                let description = format!(
                    "Disputed by {}: {}",
                    verdict.reviewer.display_name(),
                    disagreement.reason.trim()
                );
                let mut revision = Finding::new(
                    verdict.reviewer,
                    disagreement.severity.unwrap_or(target.severity),
                    target.category.clone(),
                    description,
                )
                .with_confidence(disagreement.confidence.unwrap_or(target.confidence))
                .with_origin(FindingOrigin::Delta)
                .superseding(target.id);
                revision.location = target.location.clone();
                store.append(revision);
                added += 1;
            }
        }

        debug!(added, "Delta applied");
        progress.on_phase_complete(&CouncilPhase::Delta);
    }

    /// Phase 5: one coordinator call writes the narrative
    async fn phase_synthesize(
        &self,
        result: &ConsultationResult,
        deadline: Instant,
        progress: &dyn ProgressNotifier,
        warnings: &mut Vec<String>,
    ) -> String {
        info!("Phase 5: Synthesize");
        progress.on_phase_start(&CouncilPhase::Synthesize, 1);

        let limits = &self.config.limits;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let timeout = limits.coordinator_timeout.min(remaining.max(limits.synthesis_grace));

        let notes: Vec<String> = result
            .experts
            .iter()
            .filter(|r| r.status != SessionStatus::Completed)
            .map(|r| {
                format!(
                    "{} ended {}{}",
                    r.display_name,
                    r.status,
                    r.error.as_deref().map(|e| format!(": {}", e)).unwrap_or_default()
                )
            })
            .chain(warnings.iter().cloned())
            .collect();
        let prompt = PromptTemplate::synthesis_prompt(
            &result.scope,
            &result.findings,
            &result.reviews,
            &notes,
        );

        let call = self.reasoner.consult_once(
            &self.config.synthesis_model,
            ModelPurpose::Synthesis,
            "council:synthesis",
            PromptTemplate::synthesis_system(),
            &prompt,
            timeout,
        );
        let outcome = guard(Instant::now() + timeout, self.expert_loop.cancellation(), call).await;
        progress.on_phase_complete(&CouncilPhase::Synthesize);

        match outcome {
            Guarded::Done(Ok(text)) => text,
            Guarded::Done(Err(e)) => {
                warn!(error = %e, "Synthesis failed, rendering findings directly");
                warnings.push(format!("synthesis failed: {}", e));
                fallback_narrative(&result.findings)
            }
            Guarded::DeadlineReached => {
                warnings.push("synthesis did not finish in time".to_string());
                fallback_narrative(&result.findings)
            }
            Guarded::Cancelled => fallback_narrative(&result.findings),
        }
    }
}

/// Deterministic narrative used when no synthesis is available
pub(crate) fn fallback_narrative(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No findings were reported.".to_string();
    }
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by_key(|f| Reverse(f.severity.rank()));

    let mut narrative = String::from("## Findings\n\n");
    for finding in sorted {
        narrative.push_str(&format!("- {}\n", finding.summary_line()));
    }
    narrative
}
