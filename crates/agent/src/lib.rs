//! Knowledge-restricted chat sessions: the core of kbchat.
//!
//! Every exchange follows the same path:
//!
//! 1. **Resolve** the conversation (`New` or a stored id)
//! 2. **Project** its history into provider turns
//! 3. **Generate** an answer under the knowledge-restriction instruction
//! 4. **Record** the question and answer and persist the conversation

pub mod history;
pub mod knowledge;
pub mod policy;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use history::{to_message, to_provider_format};
pub use knowledge::load_knowledge_base;
pub use policy::{build_instruction, KnowledgePolicy, REFUSAL};
pub use session::{
    ChatReply, SessionManager, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
