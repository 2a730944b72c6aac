//! Axum-based HTTP gateway: the two session entry points plus ambient
//! hardening layers.
//!
//! - `POST /chat` — one-shot request/response, runs the full moderation
//!   protocol synchronously.
//! - `GET /websocket` — upgrade handshake, binds the connection to the
//!   session's store instance.
//! - Permissive CORS router-wide; preflight requests on any path are
//!   answered without touching session state.

mod handlers;
mod websocket;

use handlers::{handle_chat, handle_health};
use websocket::ws_handler;

use crate::config::Config;
use crate::moderation::{HttpModerationClient, ModerationClient, TurnOrchestrator};
use crate::session::{self, SessionRegistry};
use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s) — prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Logical session name inbound traffic is routed to.
    pub session_name: Arc<str>,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let snapshots = session::create_snapshot_store(config).await?;
        let registry = Arc::new(SessionRegistry::new(config.session.max_history, snapshots));
        let client: Arc<dyn ModerationClient> =
            Arc::new(HttpModerationClient::from_config(&config.moderation));
        Ok(Self {
            registry,
            orchestrator: Arc::new(TurnOrchestrator::new(client)),
            session_name: Arc::from(config.session.default_session.as_str()),
        })
    }
}

/// Build the gateway router: routes, then body limit, timeout, and the
/// permissive CORS layer outermost so preflights short-circuit everything.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route("/websocket", get(ws_handler))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(cors)
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let state = AppState::from_config(&config).await?;

    tracing::info!("listening on {addr}");
    tracing::info!("  POST /chat → moderation turn");
    tracing::info!("  GET  /websocket → WebSocket");
    tracing::info!("  GET  /health → liveness");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModerationError;
    use crate::moderation::PASS_SENTINEL;
    use crate::session::{MemorySnapshots, TranscriptEntry};
    use async_trait::async_trait;
    use axum::extract::{Json, State};
    use axum::response::IntoResponse;
    use serde_json::{json, Value};

    struct CannedClient {
        reply: Option<Value>,
    }

    #[async_trait]
    impl crate::moderation::ModerationClient for CannedClient {
        async fn classify(
            &self,
            _messages: &[TranscriptEntry],
        ) -> Result<Value, ModerationError> {
            match &self.reply {
                Some(value) => Ok(value.clone()),
                None => Err(ModerationError::Http("connection refused".into())),
            }
        }
    }

    fn make_state(reply: Option<Value>) -> AppState {
        let registry = Arc::new(SessionRegistry::new(10, Arc::new(MemorySnapshots::new())));
        let client: Arc<dyn ModerationClient> = Arc::new(CannedClient { reply });
        AppState {
            registry,
            orchestrator: Arc::new(TurnOrchestrator::new(client)),
            session_name: Arc::from("test-session"),
        }
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn security_body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn security_timeout_is_30_seconds() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 30);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn chat_body_requires_both_fields() {
        let valid = r#"{"message": "hello", "rulebook": "rule A"}"#;
        let parsed: Result<handlers::ChatBody, _> = serde_json::from_str(valid);
        assert!(parsed.is_ok());

        let missing = r#"{"message": "hello"}"#;
        let parsed: Result<handlers::ChatBody, _> = serde_json::from_str(missing);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn handle_health_reports_ok() {
        let state = make_state(Some(json!("PASS")));
        let response = handle_health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn handle_chat_returns_verdict_and_appends_turn() {
        let state = make_state(Some(json!({"response": PASS_SENTINEL})));
        let response = handle_chat(
            State(state.clone()),
            Ok(Json(handlers::ChatBody {
                message: "hello".into(),
                rulebook: "rule A".into(),
            })),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["response"], PASS_SENTINEL);

        let store = state.registry.resolve("test-session").await;
        assert_eq!(store.snapshot().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn handle_chat_surfaces_call_fault_as_500() {
        let state = make_state(None);
        let response = handle_chat(
            State(state.clone()),
            Ok(Json(handlers::ChatBody {
                message: "hello".into(),
                rulebook: "rule A".into(),
            })),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("moderation"));

        // Call fault: no transcript mutation.
        let store = state.registry.resolve("test-session").await;
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
