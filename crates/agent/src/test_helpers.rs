//! Scripted providers shared by the session tests.

use async_trait::async_trait;
use kbchat_core::error::ProviderError;
use kbchat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use std::time::Duration;

/// Returns queued answers in order and records every request it receives.
///
/// Once the queue is exhausted the last answer is repeated.
pub struct ScriptedProvider {
    answers: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = self
            .answers
            .get(n - 1)
            .or(self.answers.last())
            .cloned()
            .unwrap_or_default();
        Ok(text_response(&text, &request.model))
    }
}

/// Always fails, as a provider outage would.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError {
            status_code: 503,
            message: "upstream unavailable".into(),
        })
    }
}

/// Answers from the system instruction: quotes the knowledge base line that
/// shares a word with the question, or refuses.
pub struct KnowledgeEchoProvider;

#[async_trait]
impl Provider for KnowledgeEchoProvider {
    fn name(&self) -> &str {
        "knowledge_echo"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let system = request.system.unwrap_or_default();
        let kb = system.split("Knowledge Base:\n").nth(1).unwrap_or("");
        let question = request
            .turns
            .last()
            .map(|t| t.content.to_lowercase())
            .unwrap_or_default();

        let hit = kb.lines().find(|line| {
            line.split(|c: char| !c.is_alphanumeric())
                .filter(|w| w.len() > 3)
                .any(|w| question.contains(&w.to_lowercase()))
        });

        let text = match hit {
            Some(line) => format!(" {line} \n"),
            None => crate::policy::REFUSAL.to_string(),
        };
        Ok(text_response(&text, &request.model))
    }
}

pub fn text_response(text: &str, model: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: model.to_string(),
    }
}
