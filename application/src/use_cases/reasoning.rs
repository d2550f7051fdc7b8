//! Reasoning strategy executor
//!
//! Turns a [`ReasoningStrategy`] into model calls. It never touches the
//! session: every method takes the transcript by reference and returns a
//! decision that the expert loop applies.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, ModelPurpose, ModelReply, ModelRequest};
use crate::ports::usage_log::{UsageEvent, UsageLog};
use council_domain::{
    Model, PromptTemplate, ReasoningStrategy, ToolCall, ToolDefinition, Transcript, Turn,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

#[derive(Error, Debug, Clone)]
pub enum ReasoningError {
    #[error("Model call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Model call exceeded {}s", .0.as_secs())]
    CallTimeout(Duration),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// What the expert should do next
#[derive(Debug, Clone, PartialEq)]
pub enum NextAction {
    UseTools {
        calls: Vec<ToolCall>,
        commentary: String,
    },
    FinalAnswer(String),
}

/// Executes model calls for expert sessions and the council coordinator
pub struct Reasoner<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    usage: Arc<dyn UsageLog>,
    call_timeout: Duration,
}

impl<G: LlmGateway + 'static> Clone for Reasoner<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            usage: Arc::clone(&self.usage),
            call_timeout: self.call_timeout,
        }
    }
}

impl<G: LlmGateway + 'static> Reasoner<G> {
    pub fn new(gateway: Arc<G>, usage: Arc<dyn UsageLog>, call_timeout: Duration) -> Self {
        Self {
            gateway,
            usage,
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Ask the dialogue model what to do next.
    ///
    /// Under `Single` a text-only reply is the final answer. Under
    /// `Decoupled` it still ends the loop, but the caller hands the
    /// transcript to [`Reasoner::analyze`] for the substantive answer.
    pub async fn next_action(
        &self,
        strategy: &ReasoningStrategy,
        label: &str,
        system_prompt: &str,
        transcript: &Transcript,
        tools: &[ToolDefinition],
    ) -> Result<NextAction, ReasoningError> {
        let reply = self
            .call(ModelRequest {
                model: strategy.dialogue_model().clone(),
                purpose: ModelPurpose::Dialogue,
                label: label.to_string(),
                system_prompt: system_prompt.to_string(),
                transcript: transcript.clone(),
                instruction: None,
                tools: tools.to_vec(),
                timeout: self.call_timeout,
            })
            .await?;

        if !reply.tool_calls.is_empty() {
            return Ok(NextAction::UseTools {
                calls: reply.tool_calls,
                commentary: reply.text,
            });
        }
        if reply.text.trim().is_empty() && !strategy.is_decoupled() {
            return Err(ReasoningError::EmptyResponse);
        }
        Ok(NextAction::FinalAnswer(reply.text))
    }

    /// The single analysis-model call of a decoupled session
    pub async fn analyze(
        &self,
        strategy: &ReasoningStrategy,
        label: &str,
        system_prompt: &str,
        transcript: &Transcript,
    ) -> Result<String, ReasoningError> {
        self.final_text(
            strategy.analysis_model(),
            ModelPurpose::Analysis,
            &format!("{}:analysis", label),
            system_prompt,
            transcript,
            PromptTemplate::analysis_instruction().to_string(),
        )
        .await
    }

    /// Final answer when the loop is forced to stop calling tools.
    ///
    /// Single strategies make one tool-free call to their model; decoupled
    /// strategies make their one analysis call.
    pub async fn conclude(
        &self,
        strategy: &ReasoningStrategy,
        label: &str,
        system_prompt: &str,
        transcript: &Transcript,
        max_iterations: u32,
    ) -> Result<String, ReasoningError> {
        match strategy {
            ReasoningStrategy::Single { model } => {
                self.final_text(
                    model,
                    ModelPurpose::Dialogue,
                    label,
                    system_prompt,
                    transcript,
                    PromptTemplate::conclude_instruction(max_iterations),
                )
                .await
            }
            ReasoningStrategy::Decoupled { .. } => {
                self.analyze(strategy, label, system_prompt, transcript).await
            }
        }
    }

    /// One tool-free exchange, used by the council coordinator and reviewers
    pub async fn consult_once(
        &self,
        model: &Model,
        purpose: ModelPurpose,
        label: &str,
        system_prompt: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ReasoningError> {
        let mut transcript = Transcript::new();
        transcript.push(Turn::Task {
            content: prompt.to_string(),
        });
        let reply = self
            .call(ModelRequest {
                model: model.clone(),
                purpose,
                label: label.to_string(),
                system_prompt: system_prompt.to_string(),
                transcript,
                instruction: None,
                tools: Vec::new(),
                timeout,
            })
            .await?;
        non_empty(reply.text)
    }

    async fn final_text(
        &self,
        model: &Model,
        purpose: ModelPurpose,
        label: &str,
        system_prompt: &str,
        transcript: &Transcript,
        instruction: String,
    ) -> Result<String, ReasoningError> {
        let reply = self
            .call(ModelRequest {
                model: model.clone(),
                purpose,
                label: label.to_string(),
                system_prompt: system_prompt.to_string(),
                transcript: transcript.clone(),
                instruction: Some(instruction),
                tools: Vec::new(),
                timeout: self.call_timeout,
            })
            .await?;
        non_empty(reply.text)
    }

    /// Make one bounded gateway call and mirror it to the usage log
    async fn call(&self, request: ModelRequest) -> Result<ModelReply, ReasoningError> {
        let started = Instant::now();
        let label = request.label.clone();
        let model = request.model.to_string();
        let purpose = request.purpose;
        let limit = request.timeout;

        debug!(label = %label, model = %model, purpose = purpose.as_str(), "Model call");

        let result = match tokio::time::timeout(limit, self.gateway.call(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(ReasoningError::Gateway(e)),
            Err(_) => Err(ReasoningError::CallTimeout(limit)),
        };

        let error = result.as_ref().err().map(|e| e.to_string());
        self.usage.record(UsageEvent::model_call(
            &label,
            &model,
            purpose.as_str(),
            started.elapsed().as_millis() as u64,
            error.as_deref(),
        ));
        result
    }
}

fn non_empty(text: String) -> Result<String, ReasoningError> {
    if text.trim().is_empty() {
        Err(ReasoningError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::usage_log::NoUsageLog;
    use crate::testing::{RecordingUsageLog, ScriptedGateway};

    fn transcript() -> Transcript {
        let mut t = Transcript::new();
        t.push(Turn::Task {
            content: "Review auth".to_string(),
        });
        t
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_calls_become_use_tools() {
        let gateway = ScriptedGateway::new(|_| {
            let call = ToolCall::new("search_code").with_arg("query", "token");
            ModelReply::tools("checking", vec![call]).into()
        });
        let reasoner =
            Reasoner::new(Arc::new(gateway), Arc::new(NoUsageLog), Duration::from_secs(60));
        let strategy = ReasoningStrategy::Single { model: Model::default() };

        let action = reasoner
            .next_action(&strategy, "expert:security", "sys", &transcript(), &[])
            .await
            .unwrap();
        let NextAction::UseTools { calls, commentary } = action else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(commentary, "checking");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_single_reply_is_an_error() {
        let gateway = ScriptedGateway::new(|_| ModelReply::text("  ").into());
        let reasoner =
            Reasoner::new(Arc::new(gateway), Arc::new(NoUsageLog), Duration::from_secs(60));
        let strategy = ReasoningStrategy::Single { model: Model::default() };

        let err = reasoner
            .next_action(&strategy, "expert:security", "sys", &transcript(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::EmptyResponse));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_and_usage_logging() {
        let gateway =
            ScriptedGateway::new(|_| (Duration::from_secs(120), ModelReply::text("late")).into());
        let usage = Arc::new(RecordingUsageLog::default());
        let reasoner = Reasoner::new(Arc::new(gateway), usage.clone(), Duration::from_secs(30));

        let err = reasoner
            .consult_once(
                &Model::default(),
                ModelPurpose::Plan,
                "council:plan",
                "sys",
                "plan it",
                Duration::from_secs(30),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::CallTimeout(d) if d == Duration::from_secs(30)));

        let events = usage.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["label"], "council:plan");
        assert_eq!(events[0]["success"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conclude_uses_analysis_model_when_decoupled() {
        let gateway = Arc::new(ScriptedGateway::new(|req| {
            ModelReply::text(format!("answer from {}", req.model)).into()
        }));
        let reasoner =
            Reasoner::new(Arc::clone(&gateway), Arc::new(NoUsageLog), Duration::from_secs(60));
        let strategy = ReasoningStrategy::Decoupled {
            dialogue: Model::DeepSeekChat,
            analysis: Model::DeepSeekReasoner,
        };

        let answer = reasoner
            .conclude(&strategy, "expert:architect", "sys", &transcript(), 5)
            .await
            .unwrap();
        assert_eq!(answer, format!("answer from {}", Model::DeepSeekReasoner));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].label, "expert:architect:analysis");
        assert_eq!(calls[0].purpose, ModelPurpose::Analysis);
        assert!(calls[0].tools.is_empty());
    }
}
