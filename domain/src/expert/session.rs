//! Expert session state: transcript, iteration counter and terminal status

use crate::expert::role::ExpertKind;
use crate::tool::{entities::ToolCall, record::ToolInvocationRecord};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an expert session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    TimedOut,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::TimedOut => "timed_out",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }

    /// Whether the session degrades the consultation to `partial`
    pub fn is_degraded(&self) -> bool {
        matches!(self, SessionStatus::TimedOut | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    /// The task handed to the expert
    Task { content: String },
    /// A model turn, possibly requesting tools
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The outcome of one tool call
    ToolResult { record: ToolInvocationRecord },
    /// Orchestrator annotations (limits reached, retries, timeouts)
    Note { content: String },
}

/// Append-only, ordered conversation of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn tool_records(&self) -> impl Iterator<Item = &ToolInvocationRecord> {
        self.turns.iter().filter_map(|t| match t {
            Turn::ToolResult { record } => Some(record),
            _ => None,
        })
    }

    pub fn tool_call_count(&self) -> usize {
        self.tool_records().count()
    }

    /// Most recent non-empty assistant text
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::Assistant { text, .. } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Runtime state of one expert's loop.
///
/// Owned by exactly one loop; the deadline lives with the loop since it is a
/// runtime clock value.
#[derive(Debug, Clone)]
pub struct ExpertSession {
    id: String,
    expert: ExpertKind,
    transcript: Transcript,
    iterations: u32,
    max_iterations: u32,
    status: SessionStatus,
}

impl ExpertSession {
    pub fn new(id: impl Into<String>, expert: ExpertKind, max_iterations: u32) -> Self {
        Self {
            id: id.into(),
            expert,
            transcript: Transcript::new(),
            iterations: 0,
            max_iterations,
            status: SessionStatus::Running,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expert(&self) -> ExpertKind {
        self.expert
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn record_task(&mut self, content: impl Into<String>) {
        self.transcript.push(Turn::Task { content: content.into() });
    }

    pub fn record_assistant(&mut self, text: impl Into<String>, tool_calls: Vec<ToolCall>) {
        self.transcript.push(Turn::Assistant {
            text: text.into(),
            tool_calls,
        });
    }

    pub fn record_tool(&mut self, record: ToolInvocationRecord) {
        self.transcript.push(Turn::ToolResult { record });
    }

    pub fn note(&mut self, content: impl Into<String>) {
        self.transcript.push(Turn::Note { content: content.into() });
    }

    /// Claim one iteration for a tool invocation.
    ///
    /// Returns `false` once the cap is reached; the counter never exceeds
    /// `max_iterations`.
    pub fn try_begin_iteration(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    pub fn iterations_exhausted(&self) -> bool {
        self.iterations >= self.max_iterations
    }

    /// Enter a terminal status. The first terminal status sticks.
    pub fn finish(&mut self, status: SessionStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }

    pub fn partial_answer(&self) -> Option<&str> {
        self.transcript.last_assistant_text()
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}
