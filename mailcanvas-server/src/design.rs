//! Client for OpenAI-compatible chat-completions gateways.
//!
//! One call per design request: the system prompt describes the canvas, the
//! user message is the prompt, and the first choice's content is recovered
//! into normalized elements by [`mailcanvas_core::ai`].

use std::sync::Arc;

use mailcanvas_core::ai::{parse_design_response, system_prompt, TEMPERATURE};
use mailcanvas_core::{CanvasError, DesignRequest, DesignResponse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::LlmConfig;

/// Errors from the AI design client.
#[derive(Debug, Error)]
pub enum DesignError {
    /// The configured gateway URL is invalid.
    #[error("invalid AI gateway URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("AI gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The gateway answered with a non-success status.
    #[error("LLM API error: {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The gateway's own error message, or the raw body when it has none.
        message: String,
    },
    /// The gateway answered without any message content.
    #[error("AI gateway returned no content")]
    EmptyResponse,
    /// The request or the generated content was unusable.
    #[error(transparent)]
    Design(#[from] CanvasError),
}

/// Asynchronous AI design client.
#[derive(Clone)]
pub struct DesignClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    default_model: String,
}

impl std::fmt::Debug for DesignClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("default_model", &self.inner.default_model)
            .finish_non_exhaustive()
    }
}

impl DesignClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidUrl`] if the URL is malformed.
    /// Returns [`DesignError::Http`] if the HTTP client fails to build.
    pub fn new(config: &LlmConfig) -> Result<Self, DesignError> {
        let endpoint =
            Url::parse(&config.url).map_err(|e| DesignError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("mailcanvas/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint,
                api_key: config.api_key.clone(),
                default_model: config.model.clone(),
            }),
        })
    }

    /// Model used when a request names none.
    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.inner.default_model
    }

    /// Ask the model for a layout and return its raw message content.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Design`] for a blank prompt (no request is
    /// sent), and the HTTP/status/empty variants for gateway failures.
    pub async fn complete(&self, request: &DesignRequest) -> Result<String, DesignError> {
        request.validate()?;
        let model = request.model_or(&self.inner.default_model);
        let system = system_prompt(request.canvas_size);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        tracing::info!(model, "Calling LLM");
        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .bearer_auth(&self.inner.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "LLM API error: {body}");
            let message = remote_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "no details".to_string());
            return Err(DesignError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(DesignError::EmptyResponse)?;
        tracing::debug!("Generated design: {content}");
        Ok(content)
    }

    /// Generate and normalize a layout.
    ///
    /// # Errors
    ///
    /// Everything [`DesignClient::complete`] returns, plus
    /// [`CanvasError::InvalidDesign`] when the content has no usable elements.
    pub async fn design(&self, request: &DesignRequest) -> Result<DesignResponse, DesignError> {
        let content = self.complete(request).await?;
        let elements = parse_design_response(&content)?;
        if elements.is_empty() {
            return Err(CanvasError::InvalidDesign("no elements generated".into()).into());
        }
        Ok(DesignResponse {
            elements,
            canvas_size: request.canvas_size,
        })
    }
}

/// Pull a readable message out of a gateway error body.
///
/// OpenAI-style gateways answer `{"error": {"message": ...}}`; some send a
/// bare `{"error": "..."}` or `{"message": ...}`. Anything else that is not
/// blank is returned as-is.
fn remote_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("error"))
                .or_else(|| value.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty());
    Some(from_json.unwrap_or_else(|| body.to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailcanvas_core::{CanvasSize, ElementType};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DesignClient {
        let config = LlmConfig::new(format!("{}/v1/chat/completions", server.uri()), "test-key");
        DesignClient::new(&config).expect("client")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn design_sends_prompt_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "google/gemini-2.5-flash",
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "```json\n{\"elements\":[{\"type\":\"text\",\"content\":\"Hi\"},{\"type\":\"button\"}]}\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .design(&DesignRequest::new("A welcome email", CanvasSize::new(600, 800)))
            .await
            .expect("design");

        assert_eq!(response.elements.len(), 2);
        assert_eq!(response.elements[0].element_type(), ElementType::Text);
        assert_eq!(response.elements[1].element_type(), ElementType::Button);
        assert_eq!(response.canvas_size, CanvasSize::new(600, 800));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn request_model_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "openai/gpt-4o-mini" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion(r#"{"elements":[]}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request =
            DesignRequest::new("anything", CanvasSize::default()).with_model("openai/gpt-4o-mini");
        let content = client.complete(&request).await.expect("content");
        assert_eq!(content, r#"{"elements":[]}"#);

        // An empty element list is not a usable design.
        let server_err = client.design(&request).await.expect_err("empty design");
        assert!(matches!(
            server_err,
            DesignError::Design(CanvasError::InvalidDesign(_))
        ));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn gateway_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&DesignRequest::new("hello", CanvasSize::default()))
            .await
            .expect_err("status error");
        assert!(matches!(err, DesignError::Status { status: 429, ref message } if message == "rate limited"));
        assert_eq!(err.to_string(), "LLM API error: 429: rate limited");
    }

    #[test]
    fn remote_message_prefers_gateway_error_field() {
        assert_eq!(
            remote_message(r#"{"error":{"message":"Payment required","code":402}}"#).as_deref(),
            Some("Payment required")
        );
        assert_eq!(
            remote_message(r#"{"error":"quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(remote_message("  upstream down ").as_deref(), Some("upstream down"));
        assert_eq!(remote_message("   "), None);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn missing_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&DesignRequest::new("hello", CanvasSize::default()))
            .await
            .expect_err("empty");
        assert!(matches!(err, DesignError::EmptyResponse));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn blank_prompt_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&DesignRequest::new("   ", CanvasSize::default()))
            .await
            .expect_err("validation");
        assert!(matches!(err, DesignError::Design(CanvasError::Validation(_))));
    }

    #[test]
    fn invalid_url_rejected() {
        let config = LlmConfig::new("not a url", "key");
        assert!(matches!(
            DesignClient::new(&config),
            Err(DesignError::InvalidUrl(_))
        ));
    }
}
