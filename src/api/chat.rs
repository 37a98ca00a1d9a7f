//! Chat proxy: forwards the visitor's transcript to the configured
//! chat-completion upstream and returns the reply text.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use super::metrics::CHAT_REQUESTS_TOTAL;
use crate::config::ChatConfig;
use crate::AppState;

const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

/// One transcript entry: `{role, parts: [{text}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn new(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new("model", text)
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let config = &state.config.chat;
    let Some(upstream) = config.upstream_url.as_deref() else {
        metrics::counter!(CHAT_REQUESTS_TOTAL, "outcome" => "unconfigured").increment(1);
        return Err(ApiError::service_unavailable("Chat is not available"));
    };

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::validation_field("message", "Message is required"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::validation_field(
            "message",
            format!("Message is too long (max {} characters)", MAX_MESSAGE_CHARS),
        ));
    }

    let mut request = state
        .http
        .post(upstream)
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&upstream_body(config, &req.history, message));
    if let Some(key) = config.api_key.as_deref() {
        request = request.header("x-goog-api-key", key);
    }

    let upstream_failed = |reason: String| {
        tracing::error!(error = %reason, "Chat upstream request failed");
        metrics::counter!(CHAT_REQUESTS_TOTAL, "outcome" => "failed").increment(1);
        ApiError::upstream("The chat service could not answer right now")
    };

    let response = request.send().await.map_err(|e| upstream_failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(upstream_failed(format!("upstream answered {}", status)));
    }
    let value: Value = response
        .json()
        .await
        .map_err(|e| upstream_failed(e.to_string()))?;
    let reply = extract_reply(&value)
        .ok_or_else(|| upstream_failed("reply without text".to_string()))?;

    metrics::counter!(CHAT_REQUESTS_TOTAL, "outcome" => "ok").increment(1);
    Ok(Json(ChatResponse { response: reply }))
}

/// Request body for the upstream: the system prompt, the most recent
/// `max_history` turns and the new user message.
fn upstream_body(config: &ChatConfig, history: &[ChatTurn], message: &str) -> Value {
    let skip = history.len().saturating_sub(config.max_history);
    let mut contents: Vec<ChatTurn> = history[skip..]
        .iter()
        .filter_map(|turn| {
            let role = match turn.role.as_str() {
                "user" => "user",
                "model" | "assistant" => "model",
                _ => return None,
            };
            Some(ChatTurn::new(role, turn.text()))
        })
        .collect();
    contents.push(ChatTurn::user(message));

    json!({
        "systemInstruction": { "parts": [{ "text": config.system_prompt }] },
        "contents": contents,
    })
}

/// Reply text from either a `{response}` body or a candidates/content/parts body
fn extract_reply(value: &Value) -> Option<String> {
    if let Some(text) = value.get("response").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let text = value
        .pointer("/candidates/0/content/parts")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_state_with;
    use axum::routing::post;
    use axum::Router;

    #[test]
    fn test_upstream_body_keeps_recent_history() {
        let config = ChatConfig {
            max_history: 2,
            ..ChatConfig::default()
        };
        let history = vec![
            ChatTurn::user("first"),
            ChatTurn::new("assistant", "second"),
            ChatTurn::new("system", "dropped"),
        ];
        let body = upstream_body(&config, &history, "third");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "model");
        assert_eq!(contents[0]["parts"][0]["text"], "second");
        assert_eq!(contents[1]["parts"][0]["text"], "third");
    }

    #[test]
    fn test_extract_reply_shapes() {
        assert_eq!(extract_reply(&json!({ "response": "hi" })).as_deref(), Some("hi"));
        let candidates = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }] } }]
        });
        assert_eq!(extract_reply(&candidates).as_deref(), Some("Hello"));
        assert_eq!(extract_reply(&json!({ "candidates": [] })), None);
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/generate", addr)
    }

    #[tokio::test]
    async fn test_chat_forwards_transcript() {
        let upstream = spawn_upstream(Router::new().route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                let turns = body["contents"].as_array().map(|c| c.len()).unwrap_or(0);
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": format!("{} turns", turns) }] } }]
                }))
            }),
        ))
        .await;

        let mut config = Config::default();
        config.chat.upstream_url = Some(upstream);
        let state = test_state_with(config).await;

        let Json(reply) = chat(
            State(state),
            Json(ChatRequest {
                message: "What do you charge?".into(),
                history: vec![ChatTurn::user("Hi"), ChatTurn::model("Hello!")],
            }),
        )
        .await
        .unwrap();
        assert_eq!(reply.response, "3 turns");
    }

    #[tokio::test]
    async fn test_chat_upstream_error_is_bad_gateway() {
        let upstream = spawn_upstream(Router::new().route(
            "/generate",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let mut config = Config::default();
        config.chat.upstream_url = Some(upstream);
        let state = test_state_with(config).await;

        let err = chat(
            State(state),
            Json(ChatRequest {
                message: "Hello".into(),
                history: Vec::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_chat_without_upstream_is_unavailable() {
        let state = test_state_with(Config::default()).await;
        let err = chat(State(state), Json(ChatRequest::default())).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
