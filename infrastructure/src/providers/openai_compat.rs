//! Gateway for OpenAI-compatible chat-completions endpoints
//! (DeepSeek, OpenAI, local servers that speak the same protocol).
//!
//! The transcript is replayed as chat messages on every call; tools are sent
//! as `function` tools and requested calls come back as [`ToolCall`]s.

use async_trait::async_trait;
use council_application::ports::llm_gateway::{GatewayError, LlmGateway, ModelReply, ModelRequest};
use council_domain::{ToolCall, Transcript, Turn};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Longest slice of an error body carried into a [`GatewayError`]
const MAX_ERROR_BODY: usize = 500;

pub struct OpenAiCompatGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
}

impl OpenAiCompatGateway {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("expert-council/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            max_tokens,
        })
    }

    /// Read the API key from the environment variable `api_key_env`
    pub fn from_env(
        base_url: &str,
        api_key_env: &str,
        max_tokens: u32,
    ) -> Result<Self, GatewayError> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::Other(format!("environment variable {} is not set", api_key_env))
            })?;
        Self::new(base_url, api_key, max_tokens)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatGateway {
    async fn call(&self, request: ModelRequest) -> Result<ModelReply, GatewayError> {
        let payload = build_payload(&request, self.max_tokens);
        debug!(
            "POST {} model={} label={} tools={}",
            self.endpoint,
            request.model,
            request.label,
            request.tools.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotAvailable(request.model.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "{}: {}",
                status,
                council_domain::util::truncate_str(&body, MAX_ERROR_BODY)
            )));
        }

        let body: Value =
            serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        parse_reply(&body)
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ConnectionError(err.to_string())
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

/// Chat-completions payload for one request
pub(crate) fn build_payload(request: &ModelRequest, max_tokens: u32) -> Value {
    let mut messages = vec![json!({"role": "system", "content": request.system_prompt})];
    messages.extend(transcript_messages(&request.transcript));
    if let Some(instruction) = &request.instruction {
        messages.push(json!({"role": "user", "content": instruction}));
    }

    let mut payload = json!({
        "model": request.model.as_str(),
        "messages": messages,
        "max_tokens": max_tokens,
        "stream": false,
    });
    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| json!({"type": "function", "function": tool.to_json_schema()}))
            .collect();
        payload["tools"] = json!(tools);
        payload["tool_choice"] = json!("auto");
    }
    payload
}

/// Replay a transcript as chat messages.
///
/// Tool results must directly follow the assistant message that requested
/// them, so notes are held back and sent as a user message before the next
/// non-tool turn.
fn transcript_messages(transcript: &Transcript) -> Vec<Value> {
    let mut messages = Vec::new();
    let mut notes: Vec<&str> = Vec::new();

    let flush = |messages: &mut Vec<Value>, notes: &mut Vec<&str>| {
        if !notes.is_empty() {
            let content = format!("[orchestrator] {}", notes.join("\n"));
            messages.push(json!({"role": "user", "content": content}));
            notes.clear();
        }
    };

    for turn in transcript.turns() {
        match turn {
            Turn::Task { content } => {
                flush(&mut messages, &mut notes);
                messages.push(json!({"role": "user", "content": content}));
            }
            Turn::Assistant { text, tool_calls } => {
                flush(&mut messages, &mut notes);
                let mut message = json!({"role": "assistant", "content": text});
                if !tool_calls.is_empty() {
                    let calls: Vec<Value> = tool_calls
                        .iter()
                        .map(|call| {
                            let arguments = serde_json::to_string(&call.arguments)
                                .unwrap_or_else(|_| "{}".to_string());
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.tool_name,
                                    "arguments": arguments,
                                }
                            })
                        })
                        .collect();
                    message["tool_calls"] = json!(calls);
                }
                messages.push(message);
            }
            Turn::ToolResult { record } => messages.push(json!({
                "role": "tool",
                "tool_call_id": record.call_id,
                "content": record.content_for_model(),
            })),
            Turn::Note { content } => notes.push(content),
        }
    }
    flush(&mut messages, &mut notes);
    messages
}

/// First choice of a chat-completions response
pub(crate) fn parse_reply(body: &Value) -> Result<ModelReply, GatewayError> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".to_string()))?;

    let text = message["content"].as_str().unwrap_or_default().to_string();
    let tool_calls = message["tool_calls"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(parse_tool_call)
        .collect();

    Ok(ModelReply { text, tool_calls })
}

fn parse_tool_call(item: &Value) -> Option<ToolCall> {
    let function = item.get("function")?;
    let name = function["name"].as_str().filter(|n| !n.trim().is_empty())?;

    // arguments arrive as a JSON-encoded string; some servers send an object
    let arguments: HashMap<String, Value> = match &function["arguments"] {
        Value::String(raw) if raw.trim().is_empty() => HashMap::new(),
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("Unparseable arguments for tool {}: {}", name, e);
            HashMap::new()
        }),
        Value::Object(map) => map.clone().into_iter().collect(),
        _ => HashMap::new(),
    };

    let mut call = ToolCall::new(name);
    if let Some(id) = item["id"].as_str() {
        call = call.with_id(id);
    }
    call.arguments = arguments;
    Some(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::ports::llm_gateway::ModelPurpose;
    use council_domain::{Model, ToolDefinition, ToolInvocationRecord, ToolParameter};
    use std::time::Duration;

    fn request(transcript: Transcript, tools: Vec<ToolDefinition>) -> ModelRequest {
        ModelRequest {
            model: Model::DeepSeekChat,
            purpose: ModelPurpose::Dialogue,
            label: "expert:security".to_string(),
            system_prompt: "You are a security analyst.".to_string(),
            transcript,
            instruction: None,
            tools,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_payload_replays_tool_exchange() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::Task { content: "Audit login".to_string() });
        transcript.push(Turn::Assistant {
            text: String::new(),
            tool_calls: vec![
                ToolCall::new("search_code")
                    .with_id("call_1")
                    .with_arg("query", "password"),
            ],
        });
        transcript.push(Turn::ToolResult {
            record: ToolInvocationRecord::success(
                "call_1",
                "search_code",
                json!({"query": "password"}),
                "src/login.rs:3",
                4,
            ),
        });
        transcript.push(Turn::Note { content: "retrying after timeout".to_string() });

        let tools = vec![
            ToolDefinition::new("search_code", "Search code")
                .with_parameter(ToolParameter::new("query", "Pattern", true)),
        ];
        let payload = build_payload(&request(transcript, tools), 4096);

        let messages = payload["messages"].as_array().unwrap();
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "tool", "user"]);
        let arguments = &messages[2]["tool_calls"][0]["function"]["arguments"];
        assert_eq!(arguments, "{\"query\":\"password\"}");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[4]["content"], "[orchestrator] retrying after timeout");

        assert_eq!(payload["model"], "deepseek-chat");
        assert_eq!(payload["max_tokens"], 4096);
        assert_eq!(payload["tools"][0]["type"], "function");
        assert_eq!(payload["tools"][0]["function"]["name"], "search_code");
        assert_eq!(payload["tools"][0]["function"]["parameters"]["required"][0], "query");
    }

    #[test]
    fn test_payload_without_tools_has_instruction_last() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::Task { content: "Summarize".to_string() });
        let mut request = request(transcript, Vec::new());
        request.instruction = Some("Give your final analysis.".to_string());

        let payload = build_payload(&request, 1024);
        assert!(payload.get("tools").is_none());
        let last = payload["messages"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last, json!({"role": "user", "content": "Give your final analysis."}));
    }

    #[test]
    fn test_parse_reply_with_tool_calls() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "abc",
                            "type": "function",
                            "function": {
                                "name": "read_file",
                                "arguments": "{\"file_path\": \"src/main.rs\"}"
                            }
                        },
                        {
                            "id": "def",
                            "type": "function",
                            "function": {"name": "recall", "arguments": "not json"}
                        },
                        {
                            "id": "ghi",
                            "type": "function",
                            "function": {"name": "", "arguments": "{}"}
                        }
                    ]
                }
            }]
        });
        let reply = parse_reply(&body).unwrap();
        assert_eq!(reply.text, "");
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "abc");
        assert_eq!(reply.tool_calls[0].get_string("file_path"), Some("src/main.rs"));
        assert!(reply.tool_calls[1].arguments.is_empty());
    }

    #[test]
    fn test_parse_reply_text_and_errors() {
        let content = "- [HIGH] auth @ a.rs:1: bad";
        let body = json!({"choices": [{"message": {"role": "assistant", "content": content}}]});
        assert_eq!(parse_reply(&body).unwrap(), ModelReply::text(content));

        let empty = parse_reply(&json!({"choices": []}));
        assert!(matches!(empty, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_endpoint_and_missing_key() {
        let gateway =
            OpenAiCompatGateway::new("https://api.deepseek.com/v1/", "key", 8192).unwrap();
        assert_eq!(gateway.endpoint(), "https://api.deepseek.com/v1/chat/completions");

        let unset = "COUNCIL_TEST_SURELY_UNSET_KEY";
        assert!(OpenAiCompatGateway::from_env("https://x", unset, 1).is_err());
    }
}
