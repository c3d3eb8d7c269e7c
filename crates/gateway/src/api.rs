//! Chat API handlers.
//!
//! Endpoints:
//! - `POST /chat`: ask a question in a new or existing conversation
//! - `GET /chat/{chat_id}`: full transcript of a conversation
//! - `GET /`: liveness message
//! - `GET /health`: status and version

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use kbchat_core::message::{ChatTarget, ConversationId, Message, NEW_CONVERSATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::SharedState;
use crate::error::ApiError;

pub const QUESTION_MIN_CHARS: usize = 3;
pub const QUESTION_MAX_CHARS: usize = 1000;

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_chat_id() -> String {
    NEW_CONVERSATION.to_string()
}

/// A request that passed validation.
#[derive(Debug, PartialEq)]
pub struct ValidChat {
    pub question: String,
    pub target: ChatTarget,
    pub temperature: f32,
}

impl ChatRequest {
    /// Trim the question and check field bounds. A missing or null
    /// temperature becomes `default_temperature`.
    pub fn validate(self, default_temperature: f32) -> Result<ValidChat, ApiError> {
        let question = self.question.trim().to_string();
        let len = question.chars().count();
        if len < QUESTION_MIN_CHARS {
            return Err(ApiError::unprocessable(format!(
                "question must be at least {QUESTION_MIN_CHARS} characters"
            )));
        }
        if len > QUESTION_MAX_CHARS {
            return Err(ApiError::unprocessable(format!(
                "question must be at most {QUESTION_MAX_CHARS} characters"
            )));
        }

        let temperature = self.temperature.unwrap_or(default_temperature);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ApiError::unprocessable(
                "temperature must be between 0.0 and 1.0",
            ));
        }

        Ok(ValidChat {
            question,
            target: ChatTarget::parse(&self.chat_id),
            temperature,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub chat_id: String,
    pub answer: String,
    /// True when the answer is a knowledge-base refusal.
    pub source_restricted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub chat_id: String,
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Whether an answer reads as a refusal to go beyond the knowledge base.
pub fn is_source_restricted(answer: &str) -> bool {
    answer.to_lowercase().contains("cannot answer")
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "KB Chat API is running",
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /chat`
pub async fn chat_handler(
    State(sessions): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, rejection.body_text())
    })?;
    let chat = request.validate(sessions.default_temperature())?;

    info!(
        question_len = chat.question.len(),
        target = ?chat.target,
        temperature = chat.temperature,
        "Chat request received"
    );
    debug!(question = %chat.question, "Question text");

    let reply = sessions
        .chat(&chat.question, chat.target, chat.temperature)
        .await?;

    let source_restricted = is_source_restricted(&reply.answer);
    Ok(Json(ChatResponse {
        chat_id: reply.conversation_id.to_string(),
        answer: reply.answer,
        source_restricted,
    }))
}

/// `GET /chat/{chat_id}`
pub async fn history_handler(
    State(sessions): State<SharedState>,
    Path(chat_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = sessions.history(&ConversationId::from(&chat_id)).await?;
    Ok(Json(HistoryResponse { chat_id, history }))
}
