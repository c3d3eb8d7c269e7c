//! HTTP API gateway for kbchat.
//!
//! Exposes the chat endpoints over a shared [`SessionManager`]. Built on
//! Axum; every route is wrapped in a request body limit and HTTP tracing.

pub mod api;
pub mod error;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use kbchat_agent::SessionManager;
use kbchat_config::{AppConfig, GatewayConfig};
use std::sync::Arc;
use tracing::info;

pub use error::ApiError;

/// Shared application state: the session manager serving every request.
pub type SharedState = Arc<SessionManager>;

/// Build the Axum router with all gateway routes.
pub fn build_router(sessions: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/chat", post(api::chat_handler))
        .route("/chat/{chat_id}", get(api::history_handler))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(sessions)
}

/// Start the gateway HTTP server.
///
/// Builds the session manager from `config` once and serves until the
/// listener fails. Startup fails when no provider credential is available.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let sessions = Arc::new(SessionManager::from_config(&config).await?);
    let app = build_router(sessions, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatResponse, HistoryResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use kbchat_agent::{KnowledgePolicy, REFUSAL};
    use kbchat_core::error::ProviderError;
    use kbchat_core::message::Role;
    use kbchat_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use kbchat_core::store::ChatStore;
    use kbchat_store::InMemoryStore;
    use tower::ServiceExt;

    /// Lightweight mock provider for gateway tests.
    struct MockProvider {
        response_text: Option<String>,
        temperatures: std::sync::Mutex<Vec<f32>>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.temperatures.lock().unwrap().push(request.temperature);
            match &self.response_text {
                Some(text) => Ok(ProviderResponse {
                    text: text.clone(),
                    usage: None,
                    model: request.model,
                }),
                None => Err(ProviderError::Network("connection refused".into())),
            }
        }
    }

    fn mock(answer: Option<&str>) -> Arc<MockProvider> {
        Arc::new(MockProvider {
            response_text: answer.map(str::to_string),
            temperatures: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn app_with(answer: Option<&str>) -> (Router, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(SessionManager::new(
            mock(answer),
            store.clone(),
            KnowledgePolicy::new("The capital is Eldoria."),
        ));
        (build_router(sessions, &GatewayConfig::default()), store)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_message() {
        let (app, _) = app_with(Some("x"));
        let response = app.oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "KB Chat API is running"})
        );
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (app, _) = app_with(Some("x"));
        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn chat_new_then_history() {
        let (app, store) = app_with(Some(" The capital is Eldoria. "));

        let response = app
            .clone()
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"question": "What is the capital?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let chat: ChatResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(chat.answer, "The capital is Eldoria.");
        assert!(!chat.source_restricted);
        assert_ne!(chat.chat_id, "New");
        assert_eq!(store.load_all().await.unwrap().len(), 1);

        let response = app
            .oneshot(get_req(&format!("/chat/{}", chat.chat_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let history: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(history.chat_id, chat.chat_id);
        let roles: Vec<Role> = history.history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model]);
    }

    #[tokio::test]
    async fn history_entries_have_role_content_timestamp() {
        let (app, _) = app_with(Some("answer"));
        let response = app
            .clone()
            .oneshot(post_json("/chat", serde_json::json!({"question": "Hello there"})))
            .await
            .unwrap();
        let chat_id = body_json(response).await["chat_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app.oneshot(get_req(&format!("/chat/{chat_id}"))).await.unwrap();
        let json = body_json(response).await;
        let first = &json["history"][0];
        assert_eq!(first["role"], "user");
        assert_eq!(first["content"], "Hello there");
        assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["history"][1]["role"], "model");
    }

    #[tokio::test]
    async fn refusal_sets_source_restricted() {
        let (app, _) = app_with(Some(REFUSAL));
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"question": "Who won the World Cup?", "temperature": 0.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], REFUSAL);
        assert_eq!(json["source_restricted"], true);
    }

    #[tokio::test]
    async fn configured_default_temperature_applies() {
        let provider = mock(Some("Eldoria."));
        let sessions = SessionManager::new(
            provider.clone(),
            Arc::new(InMemoryStore::new()),
            KnowledgePolicy::new("The capital is Eldoria."),
        )
        .with_default_temperature(0.7);
        let app = build_router(Arc::new(sessions), &GatewayConfig::default());

        for body in [
            serde_json::json!({"question": "What is the capital?"}),
            serde_json::json!({"question": "What is the capital?", "temperature": null}),
            serde_json::json!({"question": "What is the capital?", "temperature": 0.1}),
        ] {
            let response = app.clone().oneshot(post_json("/chat", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(*provider.temperatures.lock().unwrap(), vec![0.7, 0.7, 0.1]);
    }

    #[tokio::test]
    async fn unknown_chat_id_is_404() {
        let (app, store) = app_with(Some("x"));

        let response = app
            .clone()
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"question": "Anyone there?", "chat_id": "missing-id"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["detail"].is_string());
        assert!(store.load_all().await.unwrap().is_empty());

        let response = app.oneshot(get_req("/chat/missing-id")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn provider_failure_is_502() {
        let (app, store) = app_with(None);
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"question": "What now?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["detail"], "AI provider error");
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_bodies_are_422() {
        let bodies = [
            serde_json::json!({"question": "hi"}),
            serde_json::json!({"question": "   a   "}),
            serde_json::json!({"question": "x".repeat(1001)}),
            serde_json::json!({"question": "valid question", "temperature": 1.5}),
            serde_json::json!({"temperature": 0.5}),
            serde_json::json!({"question": 42}),
        ];

        for body in bodies {
            let (app, _) = app_with(Some("x"));
            let response = app.oneshot(post_json("/chat", body.clone())).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "body: {body}"
            );
            assert!(body_json(response).await["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn malformed_json_is_422() {
        let (app, _) = app_with(Some("x"));
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
