//! Test doubles for the ports.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, ModelReply, ModelRequest};
use crate::ports::lookup_backend::{BackendError, LookupBackend};
use crate::ports::progress::ProgressNotifier;
use crate::ports::usage_log::{UsageEvent, UsageLog};
use async_trait::async_trait;
use council_domain::tool::names;
use council_domain::{CouncilPhase, ExpertKind, SessionStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A scripted reply: how long the model "thinks" and what it says
pub struct Scripted {
    pub delay: Duration,
    pub reply: Result<ModelReply, GatewayError>,
}

impl From<ModelReply> for Scripted {
    fn from(reply: ModelReply) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Ok(reply),
        }
    }
}

impl From<(Duration, ModelReply)> for Scripted {
    fn from((delay, reply): (Duration, ModelReply)) -> Self {
        Self {
            delay,
            reply: Ok(reply),
        }
    }
}

impl From<GatewayError> for Scripted {
    fn from(error: GatewayError) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Err(error),
        }
    }
}

type Script = Box<dyn Fn(&ModelRequest) -> Scripted + Send + Sync>;

/// Gateway whose replies are computed from each request
pub struct ScriptedGateway {
    script: Script,
    calls: Mutex<Vec<ModelRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: impl Fn(&ModelRequest) -> Scripted + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.label).collect()
    }

    pub fn count_label(&self, label: &str) -> usize {
        self.calls().iter().filter(|c| c.label == label).count()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn call(&self, request: ModelRequest) -> Result<ModelReply, GatewayError> {
        let scripted = (self.script)(&request);
        self.calls.lock().unwrap().push(request);
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.reply
    }
}

/// Backend that echoes queries, with per-tool delays, failures and outputs
#[derive(Default)]
pub struct MockBackend {
    delays: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, String>,
    outputs: HashMap<&'static str, String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, tool: &'static str, delay: Duration) -> Self {
        self.delays.insert(tool, delay);
        self
    }

    pub fn with_failure(mut self, tool: &'static str, message: &str) -> Self {
        self.failures.insert(tool, message.to_string());
        self
    }

    pub fn with_output(mut self, tool: &'static str, output: &str) -> Self {
        self.outputs.insert(tool, output.to_string());
        self
    }

    async fn respond(&self, tool: &'static str, subject: &str) -> Result<String, BackendError> {
        if let Some(delay) = self.delays.get(tool) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(tool) {
            return Err(BackendError::Unavailable(message.clone()));
        }
        Ok(self
            .outputs
            .get(tool)
            .cloned()
            .unwrap_or_else(|| format!("{} result for {}", tool, subject)))
    }
}

#[async_trait]
impl LookupBackend for MockBackend {
    async fn search_code(
        &self,
        query: &str,
        _path: Option<&str>,
        _limit: usize,
    ) -> Result<String, BackendError> {
        self.respond(names::SEARCH_CODE, query).await
    }

    async fn symbols(&self, file_path: &str) -> Result<String, BackendError> {
        self.respond(names::GET_SYMBOLS, file_path).await
    }

    async fn read_file(
        &self,
        file_path: &str,
        _start: Option<usize>,
        _end: Option<usize>,
    ) -> Result<String, BackendError> {
        self.respond(names::READ_FILE, file_path).await
    }

    async fn callers(&self, function_name: &str, _limit: usize) -> Result<String, BackendError> {
        self.respond(names::FIND_CALLERS, function_name).await
    }

    async fn callees(&self, function_name: &str, _limit: usize) -> Result<String, BackendError> {
        self.respond(names::FIND_CALLEES, function_name).await
    }

    async fn recall(&self, query: &str, _limit: usize) -> Result<String, BackendError> {
        self.respond(names::RECALL, query).await
    }

    async fn web_query(&self, query: &str, _limit: usize) -> Result<String, BackendError> {
        self.respond(names::WEB_SEARCH, query).await
    }
}

/// Usage log that keeps every event in memory
#[derive(Default)]
pub struct RecordingUsageLog {
    events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingUsageLog {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn events(&self) -> Vec<Value> {
        self.events.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

impl UsageLog for RecordingUsageLog {
    fn record(&self, event: UsageEvent) {
        self.events.lock().unwrap().push((event.event_type, event.payload));
    }
}

/// Progress notifier that tracks how many experts run at once
#[derive(Default)]
pub struct CountingProgress {
    running: AtomicUsize,
    max_running: AtomicUsize,
    finished: Mutex<Vec<(ExpertKind, SessionStatus)>>,
    phases: Mutex<Vec<CouncilPhase>>,
}

impl CountingProgress {
    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> Vec<(ExpertKind, SessionStatus)> {
        self.finished.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<CouncilPhase> {
        self.phases.lock().unwrap().clone()
    }
}

impl ProgressNotifier for CountingProgress {
    fn on_phase_start(&self, phase: &CouncilPhase, _total_tasks: usize) {
        self.phases.lock().unwrap().push(*phase);
    }

    fn on_phase_complete(&self, _phase: &CouncilPhase) {}

    fn on_expert_start(&self, _expert: ExpertKind, _session_id: &str) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
    }

    fn on_expert_finish(&self, expert: ExpertKind, status: SessionStatus) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().push((expert, status));
    }
}
