//! Chat-completion client
//!
//! One synchronous-style request per call: a single user message, a token
//! budget and a fixed low temperature. Defines the client trait and two
//! implementations:
//! - `ChatCompletionClient`: posts to an OpenAI-style HTTP endpoint (production)
//! - `MockLlmClient`: scripted replies that records every prompt (testing)

use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Prefix marking AI text that is really a downgraded failure.
pub const AI_ERROR_PREFIX: &str = "AI Error: ";

/// Whether `text` is a tagged AI failure rather than model output.
pub fn is_ai_error(text: &str) -> bool {
    text.starts_with(AI_ERROR_PREFIX)
}

/// Render an error as the tagged placeholder text.
pub fn ai_error_text(error: &LlmError) -> String {
    format!("{AI_ERROR_PREFIX}{error}")
}

/// Errors from chat-completion calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Non-success HTTP status. Displays as the bare status code.
    #[error("{status}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("client configuration error: {0}")]
    Config(String),
}

/// Client trait for chat completions.
///
/// Abstracts over transport so the orchestrator does not depend on how the
/// model is reached.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as a single user message and return the text of the
    /// first choice.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a response body.
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Parse(format!("invalid JSON: {e}")))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))?;
    choice
        .message
        .content
        .ok_or_else(|| LlmError::Parse("no content in first choice".to_string()))
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl ChatCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.temperature,
        };

        debug!(url = %self.url, model = %self.model, max_tokens, "sending chat completion");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "chat completion rejected");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

/// Mock client for testing: replies from a script and records every prompt.
///
/// When the script runs out, the fallback reply is used.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Result<String, u16>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl MockLlmClient {
    /// Always replies with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with the given HTTP status.
    pub fn failing_with_status(status: u16) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue one reply ahead of the fallback.
    pub fn then(self, reply: Result<String, LlmError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Every `(prompt, max_tokens)` received, in order.
    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), max_tokens));
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(reply) => reply,
            None => match &self.fallback {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Status {
                    status: *status,
                    body: "mock failure".to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}},
                                  {"message":{"content":"ignored"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Hello");
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn status_error_is_tagged_with_code() {
        let err = LlmError::Status {
            status: 500,
            body: "boom".into(),
        };
        let text = ai_error_text(&err);
        assert_eq!(text, "AI Error: 500");
        assert!(is_ai_error(&text));
        assert!(!is_ai_error("A fine summary"));
    }

    #[test]
    fn request_body_has_expected_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 1000,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = ChatCompletionClient::new(&LlmConfig::default()).unwrap();
        assert_eq!(client.model(), crate::config::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn mock_replays_script_then_fallback() {
        let client = MockLlmClient::replying("fallback")
            .then(Ok("first".to_string()))
            .then(Err(LlmError::Transport("down".into())));

        assert_eq!(client.complete("a", 10).await.unwrap(), "first");
        assert!(client.complete("b", 20).await.is_err());
        assert_eq!(client.complete("c", 30).await.unwrap(), "fallback");
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.prompts()[1], ("b".to_string(), 20));
    }

    #[tokio::test]
    async fn failing_mock_returns_status() {
        let client = MockLlmClient::failing_with_status(503);
        let err = client.complete("x", 1).await.unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 503, .. }));
    }

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Read one HTTP request: headers, then `content-length` bytes of body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (key, value) = line.split_once(':')?;
                        key.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve a single canned response; the handle yields the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });
        (url, handle)
    }

    fn client_for(url: String, timeout_secs: u64) -> ChatCompletionClient {
        ChatCompletionClient::new(&LlmConfig {
            url,
            api_key: "k".into(),
            timeout_secs,
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn server_error_status_becomes_ai_error_text() {
        let (url, server) = serve_once("500 Internal Server Error", "boom").await;
        let err = client_for(url, 5).complete("hi", 10).await.unwrap_err();

        assert!(matches!(err, LlmError::Status { status: 500, .. }));
        assert_eq!(ai_error_text(&err), "AI Error: 500");

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /v1/chat/completions"));
        assert!(lowered.contains("authorization: bearer k"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.contains(r#""max_tokens":10"#));
        assert!(request.contains(r#""content":"hi""#));
        assert!(request.contains(r#""role":"user""#));
    }

    #[tokio::test]
    async fn success_returns_first_choice_text() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"A profile."}}]}"#,
        )
        .await;
        let text = client_for(url, 5).complete("who?", 1000).await.unwrap();

        assert_eq!(text, "A profile.");
        assert!(server.await.unwrap().contains(r#""max_tokens":1000"#));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parse_error() {
        let (url, server) = serve_once("200 OK", "{not json").await;
        let err = client_for(url, 5).complete("hi", 10).await.unwrap_err();

        assert!(matches!(err, LlmError::Parse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_server_times_out_as_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = client_for(url, 1).complete("hi", 10).await.unwrap_err();

        assert!(matches!(err, LlmError::Transport(_)));
        assert!(ai_error_text(&err).starts_with(AI_ERROR_PREFIX));
        server.abort();
    }
}
