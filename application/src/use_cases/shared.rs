//! Shared helpers for the consultation pipelines.

use crate::ports::llm_gateway::LlmGateway;
use crate::ports::lookup_backend::LookupBackend;
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::expert_loop::{ExpertLoop, ExpertRun};
use crate::use_cases::findings_store::FindingsStore;
use council_domain::{ExpertReport, SessionStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of a future raced against a deadline and a cancellation token
#[derive(Debug)]
pub(crate) enum Guarded<T> {
    Done(T),
    DeadlineReached,
    Cancelled,
}

/// Await `fut` unless `cancel` fires or `deadline` passes first.
///
/// Cancellation wins over the deadline, and the deadline wins over a result
/// that becomes ready at the same instant. A dropped future is cancelled.
pub(crate) async fn guard<F: Future>(
    deadline: Instant,
    cancel: &CancellationToken,
    fut: F,
) -> Guarded<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Guarded::Cancelled,
        _ = tokio::time::sleep_until(deadline) => Guarded::DeadlineReached,
        out = fut => Guarded::Done(out),
    }
}

/// Limits for one fan-out of expert sessions
#[derive(Debug, Clone, Copy)]
pub(crate) struct FanOutLimits {
    pub max_concurrent: usize,
    pub expert_timeout: Duration,
    pub pipeline_deadline: Instant,
}

/// Run expert sessions concurrently, at most `max_concurrent` at a time.
///
/// Each session's deadline is `min(start + expert_timeout, pipeline
/// deadline)`, measured from the moment it gets a slot. Sessions still
/// queued at the pipeline deadline end as `TimedOut` without running.
/// Reports come back in the order of `runs`.
pub(crate) async fn run_experts<G, B>(
    expert_loop: &ExpertLoop<G, B>,
    runs: Vec<ExpertRun>,
    store: Arc<FindingsStore>,
    limits: FanOutLimits,
    progress: Arc<dyn ProgressNotifier>,
) -> Vec<ExpertReport>
where
    G: LlmGateway + 'static,
    B: LookupBackend + 'static,
{
    info!(
        "Starting {} expert session(s), at most {} concurrent",
        runs.len(),
        limits.max_concurrent
    );

    let semaphore = Arc::new(Semaphore::new(limits.max_concurrent.max(1)));
    let mut join_set = JoinSet::new();
    let mut spawned = HashMap::new();

    for (index, run) in runs.into_iter().enumerate() {
        let expert_loop = expert_loop.clone();
        let semaphore = Arc::clone(&semaphore);
        let store = Arc::clone(&store);
        let progress = Arc::clone(&progress);
        let session_id = run.session_id.clone();
        let kind = run.role.kind;

        let handle = join_set.spawn(async move {
            let cancel = expert_loop.cancellation().clone();
            let acquire = semaphore.acquire_owned();
            let permit = match guard(limits.pipeline_deadline, &cancel, acquire).await {
                Guarded::Done(Ok(permit)) => permit,
                Guarded::Done(Err(_)) => {
                    return ExpertReport::not_started(
                        &run.session_id,
                        kind,
                        SessionStatus::Failed,
                        "session limiter closed",
                    );
                }
                Guarded::DeadlineReached => {
                    warn!(
                        session = %run.session_id,
                        "Pipeline deadline reached while the session was queued"
                    );
                    return ExpertReport::not_started(
                        &run.session_id,
                        kind,
                        SessionStatus::TimedOut,
                        "pipeline deadline reached before the session started",
                    );
                }
                Guarded::Cancelled => {
                    return ExpertReport::not_started(
                        &run.session_id,
                        kind,
                        SessionStatus::Cancelled,
                        "consultation cancelled",
                    );
                }
            };

            progress.on_expert_start(kind, &run.session_id);
            let deadline = (Instant::now() + limits.expert_timeout).min(limits.pipeline_deadline);
            let report = expert_loop.run(run, deadline, &store).await;
            progress.on_expert_finish(kind, report.status);
            drop(permit);
            report
        });
        spawned.insert(handle.id(), (index, session_id, kind));
    }

    let mut reports = Vec::with_capacity(spawned.len());
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((id, report)) => {
                if let Some((index, _, _)) = spawned.get(&id) {
                    reports.push((*index, report));
                }
            }
            Err(e) => {
                if let Some((index, session_id, kind)) = spawned.get(&e.id()) {
                    warn!(session = %session_id, error = %e, "Expert session task failed");
                    progress.on_expert_finish(*kind, SessionStatus::Failed);
                    let reason = format!("session task failed: {}", e);
                    let report =
                        ExpertReport::not_started(session_id, *kind, SessionStatus::Failed, reason);
                    reports.push((*index, report));
                }
            }
        }
    }

    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}
