//! Zhipu chat-completions client.
//!
//! Zhipu's `/chat/completions` endpoint is OpenAI-compatible, so this is a
//! plain JSON-over-HTTPS client: requests are converted to the wire format,
//! responses are converted back to the core [`ChatResponse`]. Network
//! failures are surfaced as-is; there is no retry here.

use async_trait::async_trait;
use goclaw_config::ZhipuConfig;
use goclaw_core::error::ProviderError;
use goclaw_core::message::{ChatMessage, Role, ToolCall};
use goclaw_core::provider::{ChatRequest, ChatResponse, Choice, Provider, Usage};
use goclaw_core::tool::ModelTool;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Zhipu (BigModel) chat-completions API.
pub struct ZhipuClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for ZhipuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZhipuClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ZhipuClient {
    /// Build a client from the `zhipu` configuration section.
    pub fn new(config: &ZhipuConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured("zhipu api_key is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fill unset request options from configuration and convert to wire format.
    fn to_api_request(&self, request: ChatRequest) -> ApiRequest {
        ApiRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            tools: request.tools,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

#[async_trait]
impl Provider for ZhipuClient {
    fn name(&self) -> &str {
        "zhipu"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.to_api_request(request);

        debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }

        let api_response: ApiResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(usage) = &api_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion received"
            );
        }

        Ok(api_response.into())
    }
}

// --- OpenAI-compatible wire types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ModelTool>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(m: &ChatMessage) -> Self {
        let tool_calls = (!m.tool_calls.is_empty()).then(|| {
            m.tool_calls
                .iter()
                .map(|tc| ApiToolCall {
                    id: tc.id.clone(),
                    kind: function_type(),
                    function: ApiFunction {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect()
        });

        Self {
            role: m.role,
            content: Some(m.content.clone()),
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
        }
    }
}

impl From<ApiMessage> for ChatMessage {
    fn from(m: ApiMessage) -> Self {
        Self {
            role: m.role,
            content: m.content.unwrap_or_default(),
            tool_calls: m
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
                .collect(),
            tool_call_id: m.tool_call_id,
        }
    }
}

impl From<ApiResponse> for ChatResponse {
    fn from(r: ApiResponse) -> Self {
        Self {
            choices: r
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: c.message.into(),
                    finish_reason: c.finish_reason,
                })
                .collect(),
            usage: r.usage,
            model: r.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct MockState {
        status: StatusCode,
        body: String,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn completions(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.seen.lock().unwrap().push((auth, body));
        (state.status, state.body.clone())
    }

    /// Start a mock endpoint and return its base URL plus the request log.
    async fn mock_server(status: StatusCode, body: &str) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body: body.to_string(),
            seen: seen.clone(),
        };
        let app = Router::new()
            .route("/v4/chat/completions", post(completions))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v4/"), seen)
    }

    fn config(base_url: &str) -> ZhipuConfig {
        ZhipuConfig {
            api_key: "test-key-123456".into(),
            base_url: base_url.into(),
            ..ZhipuConfig::default()
        }
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let cfg = ZhipuConfig::default();
        assert!(matches!(ZhipuClient::new(&cfg), Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn unset_options_come_from_config() {
        let client = ZhipuClient::new(&config("https://example.invalid/v4")).unwrap();
        let req = client.to_api_request(ChatRequest::new(vec![ChatMessage::user("hi")]));
        assert_eq!(req.model, "glm-4-flash");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 4096);

        let explicit = ChatRequest {
            model: Some("glm-4".into()),
            temperature: Some(0.1),
            max_tokens: Some(16),
            ..ChatRequest::default()
        };
        let req = client.to_api_request(explicit);
        assert_eq!(req.model, "glm-4");
        assert_eq!(req.max_tokens, 16);
    }

    #[test]
    fn assistant_tool_calls_use_wire_shape() {
        let msg = ChatMessage::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "read_file", r#"{"path":"/tmp/a.txt"}"#)],
        );
        let json = serde_json::to_value(ApiMessage::from(&msg)).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["id"], "call_1");
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "read_file");
        assert_eq!(json["tool_calls"][0]["function"]["arguments"], r#"{"path":"/tmp/a.txt"}"#);
        assert!(json.get("tool_call_id").is_none());

        let result = serde_json::to_value(ApiMessage::from(&ChatMessage::tool_result("call_1", "X"))).unwrap();
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_1");
        assert!(result.get("tool_calls").is_none());
    }

    #[test]
    fn null_content_decodes_as_empty() {
        let raw = json!({
            "model": "glm-4-flash",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{"id": "c1", "type": "function", "function": {"name": "list_dir", "arguments": "{}"}}]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let resp: ChatResponse = serde_json::from_value::<ApiResponse>(raw).unwrap().into();
        assert_eq!(resp.content(), "");
        assert!(resp.has_tool_calls());
        assert_eq!(resp.tool_calls()[0], ToolCall::new("c1", "list_dir", "{}"));
    }

    #[tokio::test]
    async fn posts_to_chat_completions_with_bearer_auth() {
        let reply = json!({
            "model": "glm-4-flash",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        });
        let (base_url, seen) = mock_server(StatusCode::OK, &reply.to_string()).await;
        let client = ZhipuClient::new(&config(&base_url)).unwrap();

        let tools = vec![ModelTool::from(goclaw_core::ToolDefinition {
            name: "list_dir".into(),
            description: "List".into(),
            parameters: json!({"type": "object", "properties": {}}),
        })];
        let request = ChatRequest::new(vec![ChatMessage::system("sys"), ChatMessage::user("hello")]).with_tools(tools);
        let resp = client.chat(request).await.unwrap();

        assert_eq!(resp.content(), "hi");
        assert!(!resp.has_tool_calls());
        assert_eq!(resp.usage.unwrap().total_tokens, 4);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key-123456"));
        assert_eq!(body["model"], "glm-4-flash");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "list_dir");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let (base_url, _) = mock_server(StatusCode::UNAUTHORIZED, r#"{"error":"bad key"}"#).await;
        let client = ZhipuClient::new(&config(&base_url)).unwrap();

        let err = client.chat(ChatRequest::new(vec![ChatMessage::user("x")])).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 401);
                assert!(message.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (base_url, _) = mock_server(StatusCode::OK, "<html>gateway</html>").await;
        let client = ZhipuClient::new(&config(&base_url)).unwrap();

        let err = client.chat(ChatRequest::new(vec![ChatMessage::user("x")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ZhipuClient::new(&config(&format!("http://{addr}"))).unwrap();
        let err = client.chat(ChatRequest::new(vec![ChatMessage::user("x")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
