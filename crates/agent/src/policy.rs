//! Knowledge restriction policy.
//!
//! The model is only ever shown one system instruction: the knowledge base
//! wrapped in rules that forbid answering from anywhere else.

/// The exact reply expected when the knowledge base has no answer.
pub const REFUSAL: &str = "I cannot answer that based on the available knowledge base.";

/// Build the system instruction embedding `knowledge_base` verbatim.
pub fn build_instruction(knowledge_base: &str) -> String {
    format!(
        "You are a domain-restricted AI agent.\n\
         You MUST only answer using the knowledge base below.\n\
         If the answer is not found in the knowledge base, respond with exactly:\n\
         \"{REFUSAL}\"\n\
         \n\
         Knowledge Base:\n\
         {knowledge_base}"
    )
}

/// The instruction for this process, built once from the loaded knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgePolicy {
    instruction: String,
    kb_len: usize,
}

impl KnowledgePolicy {
    pub fn new(knowledge_base: &str) -> Self {
        Self {
            instruction: build_instruction(knowledge_base),
            kb_len: knowledge_base.len(),
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Whether the knowledge base was empty (e.g. the file failed to load).
    pub fn is_empty(&self) -> bool {
        self.kb_len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_knowledge_base_verbatim() {
        let kb = "The capital is Eldoria.\n\n  Indented line\twith tab";
        let instruction = build_instruction(kb);
        assert!(instruction.contains(kb));
        assert!(instruction.ends_with(kb));
    }

    #[test]
    fn mandates_refusal_string() {
        let instruction = build_instruction("anything");
        assert!(instruction.contains(REFUSAL));
        assert!(instruction.contains("domain-restricted"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(build_instruction("kb"), build_instruction("kb"));
        assert_eq!(
            KnowledgePolicy::new("kb").instruction(),
            build_instruction("kb")
        );
    }

    #[test]
    fn empty_knowledge_base_still_restricts() {
        let policy = KnowledgePolicy::new("");
        assert!(policy.is_empty());
        assert!(policy.instruction().contains(REFUSAL));
    }
}
