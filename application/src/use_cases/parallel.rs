//! Parallel fallback
//!
//! Runs the requested experts side by side and merges their answers without
//! review. Used for single-expert requests, when council mode is off, and
//! when the council cannot make a plan.

use crate::config::ConsultationConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::lookup_backend::LookupBackend;
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::expert_loop::{ExpertLoop, ExpertRun};
use crate::use_cases::findings_store::FindingsStore;
use crate::use_cases::pipeline_input::PipelineInput;
use crate::use_cases::shared::{FanOutLimits, run_experts};
use council_domain::tool::names;
use council_domain::{
    ConsultationResult, CouncilPhase, ExecutionPath, ExpertReport, PromptTemplate, SessionStatus,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

pub struct ParallelFallback<G: LlmGateway + 'static, B: LookupBackend + 'static> {
    expert_loop: ExpertLoop<G, B>,
    config: Arc<ConsultationConfig>,
}

impl<G: LlmGateway + 'static, B: LookupBackend + 'static> ParallelFallback<G, B> {
    pub fn new(expert_loop: ExpertLoop<G, B>, config: Arc<ConsultationConfig>) -> Self {
        Self { expert_loop, config }
    }

    pub async fn run(
        &self,
        input: &PipelineInput,
        store: Arc<FindingsStore>,
        deadline: Instant,
        progress: Arc<dyn ProgressNotifier>,
    ) -> ConsultationResult {
        let started = Instant::now();
        info!("Parallel consultation with {} expert(s)", input.assignments.len());
        progress.on_phase_start(&CouncilPhase::Execute, input.assignments.len());

        let runs: Vec<ExpertRun> = input
            .assignments
            .iter()
            .enumerate()
            .map(|(index, assignment)| ExpertRun {
                session_id: assignment.session_id(index),
                role: assignment.role.clone(),
                strategy: assignment.strategy.clone(),
                task: PromptTemplate::expert_task(&input.scope, input.context.as_deref(), None),
                allowed_tools: assignment
                    .allowed_tools
                    .iter()
                    .filter(|t| t.as_str() != names::STORE_FINDING)
                    .cloned()
                    .collect(),
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
            Arc::clone(&store),
            limits,
            Arc::clone(&progress),
        )
        .await;
        progress.on_phase_complete(&CouncilPhase::Execute);

        progress.on_phase_start(&CouncilPhase::Merge, 1);
        let dedupe = store.dedupe();
        let timed_out = Instant::now() >= deadline
            || reports.iter().any(|r| r.status == SessionStatus::TimedOut);
        let mut result = ConsultationResult {
            status: ConsultationResult::status_for(&reports),
            path: ExecutionPath::Parallel,
            scope: input.scope.clone(),
            narrative: String::new(),
            findings: dedupe.kept,
            superseded: dedupe.superseded,
            reviews: Vec::new(),
            experts: reports,
            elapsed_ms: started.elapsed().as_millis() as u64,
            timed_out,
            warnings: Vec::new(),
            error: None,
        };
        result.narrative = merge_narrative(&result);
        progress.on_phase_complete(&CouncilPhase::Merge);
        result
    }
}

/// Concatenate expert answers; a lone expert's answer stands on its own
fn merge_narrative(result: &ConsultationResult) -> String {
    if let [only] = result.experts.as_slice() {
        return answer_or_reason(only);
    }

    let sections: Vec<String> = result
        .experts
        .iter()
        .map(|report| {
            let body = answer_or_reason(report);
            format!("## {} ({})\n\n{}", report.display_name, report.status, body)
        })
        .collect();
    format!("{}\n\n---\n{}", sections.join("\n\n"), result.footer())
}

fn answer_or_reason(report: &ExpertReport) -> String {
    match (&report.answer, &report.error) {
        (Some(answer), _) => answer.trim().to_string(),
        (None, Some(error)) => format!("_No answer: {}_", error),
        (None, None) => "_No answer._".to_string(),
    }
}
