//! Chat session manager.
//!
//! One exchange is read → generate → append → write:
//!
//! 1. Resolve the target: `New` gets a fresh id and empty history, an
//!    existing id is loaded from the store (`NotFound` if absent)
//! 2. Send the knowledge-restricted instruction, prior turns and the new
//!    prompt to the provider (single attempt)
//! 3. Append the user prompt and the trimmed answer, each with its own
//!    timestamp, and save the conversation
//!
//! The whole sequence for one id runs under that id's lock, so concurrent
//! exchanges on the same conversation are applied one after another.

use crate::history::{to_message, to_provider_format};
use crate::knowledge::load_knowledge_base;
use crate::policy::KnowledgePolicy;
use chrono::Utc;
use kbchat_config::{AppConfig, ConfigError};
use kbchat_core::error::{Error, Result};
use kbchat_core::message::{ChatTarget, ConversationId, Message};
use kbchat_core::provider::{ConversationTurn, Provider, ProviderRequest};
use kbchat_core::store::ChatStore;
use kbchat_store::KeyedLocks;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
/// Sampling temperature for requests that do not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Result of one successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub conversation_id: ConversationId,
    pub answer: String,
}

pub struct SessionManager {
    provider: Arc<dyn Provider>,
    store: Arc<dyn ChatStore>,
    policy: KnowledgePolicy,
    model: String,
    max_tokens: u32,
    default_temperature: f32,
    locks: KeyedLocks,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ChatStore>,
        policy: KnowledgePolicy,
    ) -> Self {
        Self {
            provider,
            store,
            policy,
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            default_temperature: DEFAULT_TEMPERATURE,
            locks: KeyedLocks::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Build a manager from configuration.
    ///
    /// Loads the knowledge base (an unreadable file yields an empty one),
    /// picks the default provider and opens the configured store. Fails when
    /// no credential is available for the default provider.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let knowledge_base = load_knowledge_base(&config.knowledge_base.path).await;
        let policy = KnowledgePolicy::new(&knowledge_base);

        let router = kbchat_providers::router::build_from_config(config);
        let provider = router
            .default()
            .ok_or_else(|| ConfigError::MissingCredential(config.default_provider.clone()))?;

        let store = kbchat_store::open_from_config(&config.store).await?;

        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        info!(
            provider = provider.name(),
            model = %model,
            store = store.name(),
            "Session manager ready"
        );

        Ok(Self::new(provider, store, policy)
            .with_model(model)
            .with_max_tokens(config.default_max_tokens)
            .with_default_temperature(config.default_temperature))
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    pub fn policy(&self) -> &KnowledgePolicy {
        &self.policy
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn default_temperature(&self) -> f32 {
        self.default_temperature
    }

    /// Answer `prompt` within the addressed conversation and record the turn.
    pub async fn chat(
        &self,
        prompt: &str,
        target: ChatTarget,
        temperature: f32,
    ) -> Result<ChatReply> {
        let (id, is_new) = match target {
            ChatTarget::New => (ConversationId::new(), true),
            ChatTarget::Existing(id) => (id, false),
        };

        let _guard = self.locks.lock(id.as_str()).await;

        let history = if is_new {
            debug!(conversation_id = %id, "Starting new conversation");
            Vec::new()
        } else {
            self.store
                .get(id.as_str())
                .await
                .map_err(|e| log_failure(&id, "load_history", e.into()))?
        };

        let mut turns = to_provider_format(&history);
        turns.push(ConversationTurn::user(prompt));

        let request = ProviderRequest {
            model: self.model.clone(),
            system: Some(self.policy.instruction().to_string()),
            turns,
            temperature,
            max_tokens: Some(self.max_tokens),
        };

        let asked_at = Utc::now();
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| log_failure(&id, "generate", e.into()))?;
        let answered_at = Utc::now();

        let answer = response.text.trim().to_string();

        let mut updated = history;
        updated.push(to_message(ConversationTurn::user(prompt), asked_at));
        updated.push(to_message(ConversationTurn::model(answer.clone()), answered_at));

        self.store
            .save(id.as_str(), &updated)
            .await
            .map_err(|e| log_failure(&id, "save_history", e.into()))?;

        info!(
            conversation_id = %id,
            messages = updated.len(),
            model = %response.model,
            "Chat turn recorded"
        );

        Ok(ChatReply {
            conversation_id: id,
            answer,
        })
    }

    /// The stored transcript of a conversation.
    pub async fn history(&self, id: &ConversationId) -> Result<Vec<Message>> {
        self.store
            .get(id.as_str())
            .await
            .map_err(|e| log_failure(id, "history", e.into()))
    }
}

fn log_failure(id: &ConversationId, operation: &'static str, err: Error) -> Error {
    match &err {
        Error::NotFound(_) => {
            warn!(conversation_id = %id, operation, "Conversation not found");
        }
        other => {
            error!(
                conversation_id = %id,
                operation,
                kind = other.kind(),
                error = %other,
                "Chat operation failed"
            );
        }
    }
    err
}
