//! Knowledge base loading.

use std::path::Path;
use tracing::{error, info};

/// Read the knowledge base text from `path`.
///
/// A missing or unreadable file is logged and treated as an empty knowledge
/// base: the service still starts, and every answer is then a refusal.
pub async fn load_knowledge_base(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            info!(path = %path.display(), bytes = text.len(), "Knowledge base loaded");
            text
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load knowledge base");
            String::new()
        }
    }
}
