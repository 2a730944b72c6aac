//! The external text-classification capability, specified at its boundary:
//! an ordered list of role-tagged messages in, a shape-variable JSON value
//! out. Stateless, no session awareness.

use crate::config::ModerationConfig;
use crate::error::ModerationError;
use crate::session::TranscriptEntry;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const MAX_API_ERROR_CHARS: usize = 200;

#[async_trait]
pub trait ModerationClient: Send + Sync {
    /// Run one classification round-trip.
    ///
    /// Returns the raw upstream value; shape normalization happens in
    /// [`super::reply`]. An `Err` here is a call fault — transport failure
    /// or a non-success status — never an unexpected-but-parsed body.
    async fn classify(&self, messages: &[TranscriptEntry]) -> Result<Value, ModerationError>;
}

/// HTTP client for a Workers-AI-style inference endpoint:
/// `POST {base_url}/run/{model}` with a `messages` body, optional bearer auth.
pub struct HttpModerationClient {
    base_url: String,
    model: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    messages: &'a [TranscriptEntry],
}

impl HttpModerationClient {
    pub fn new(base_url: &str, model: &str, token: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            token: token.map(ToOwned::to_owned),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(config: &ModerationConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.model,
            config.resolve_token().as_deref(),
            config.timeout_secs,
        )
    }

    fn run_url(&self) -> String {
        format!("{}/run/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl ModerationClient for HttpModerationClient {
    async fn classify(&self, messages: &[TranscriptEntry]) -> Result<Value, ModerationError> {
        let mut request = self
            .client
            .post(self.run_url())
            .json(&ClassifyRequest { messages });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| ModerationError::Http(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModerationError::Api {
                status: status.as_u16(),
                message: truncate_error(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|error| ModerationError::Http(error.to_string()))
    }
}

fn truncate_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_API_ERROR_CHARS {
        return trimmed.to_owned();
    }
    let cut: String = trimmed.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TranscriptEntry;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn messages() -> Vec<TranscriptEntry> {
        vec![
            TranscriptEntry::system("You are the auditor."),
            TranscriptEntry::user("Text to check: \"hello\""),
        ]
    }

    #[test]
    fn strips_trailing_slash() {
        let client = HttpModerationClient::new("http://host:8788/", "m", None, 60);
        assert_eq!(client.run_url(), "http://host:8788/run/m");
    }

    #[test]
    fn truncates_long_error_bodies() {
        let long = "x".repeat(500);
        let truncated = truncate_error(&long);
        assert!(truncated.chars().count() <= MAX_API_ERROR_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }

    #[tokio::test]
    async fn posts_messages_and_returns_raw_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run/llama-3-8b-instruct"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "system", "content": "You are the auditor."},
                    {"role": "user", "content": "Text to check: \"hello\""}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "PASS"})))
            .mount(&server)
            .await;

        let client = HttpModerationClient::new(&server.uri(), "llama-3-8b-instruct", None, 5);
        let raw = client.classify(&messages()).await.unwrap();
        assert_eq!(raw, json!({"response": "PASS"}));
    }

    #[tokio::test]
    async fn sends_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run/m"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
            .mount(&server)
            .await;

        let client = HttpModerationClient::new(&server.uri(), "m", Some("secret-token"), 5);
        assert!(client.classify(&messages()).await.is_ok());
    }

    #[tokio::test]
    async fn non_success_status_is_a_call_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run/m"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = HttpModerationClient::new(&server.uri(), "m", None, 5);
        let error = client.classify(&messages()).await.unwrap_err();
        match error {
            ModerationError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api fault, got {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_call_fault() {
        // Nothing listens on this port.
        let client = HttpModerationClient::new("http://127.0.0.1:1", "m", None, 1);
        assert!(matches!(
            client.classify(&messages()).await,
            Err(ModerationError::Http(_))
        ));
    }
}
