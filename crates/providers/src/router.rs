//! Provider router: selects the correct LLM provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use kbchat_core::provider::Provider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }
}

/// Build providers from configuration.
///
/// A provider is only registered when a credential is available for it
/// (local endpoints such as `ollama` need none), so `router.default()`
/// returning `None` means the service cannot start.
pub fn build_from_config(config: &kbchat_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    let mut names: Vec<&String> = config.providers.keys().collect();
    if !config.providers.contains_key(&config.default_provider) {
        names.push(&config.default_provider);
    }

    for name in names {
        let api_url = config
            .providers
            .get(name)
            .and_then(|p| p.api_url.clone());
        let api_key = config.api_key_for(name);

        let provider: Arc<dyn Provider> = match (name.as_str(), api_key) {
            ("gemini", Some(key)) => {
                let mut p = GeminiProvider::new(key);
                if let Some(url) = api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ("gemini", None) => {
                tracing::debug!(provider = %name, "Skipping provider without API key");
                continue;
            }
            (other, Some(key)) => Arc::new(OpenAiCompatProvider::new(
                other,
                api_url.unwrap_or_else(|| default_base_url(other)),
                key,
            )),
            (other, None) if is_local(other) => Arc::new(OpenAiCompatProvider::new(
                other,
                api_url.unwrap_or_else(|| default_base_url(other)),
                "",
            )),
            (other, None) => {
                tracing::debug!(provider = %other, "Skipping provider without API key");
                continue;
            }
        };

        router.register(name.clone(), provider);
    }

    router
}

/// Providers that run on the local machine and need no credential.
pub fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
