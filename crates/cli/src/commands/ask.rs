//! `kbchat ask`: Ask one question without running the server.

use kbchat_agent::SessionManager;
use kbchat_core::ChatTarget;
use kbchat_gateway::api::{QUESTION_MAX_CHARS, QUESTION_MIN_CHARS, is_source_restricted};

pub async fn run(
    question: String,
    chat_id: String,
    temperature: Option<f32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let question = question.trim();
    let len = question.chars().count();
    if !(QUESTION_MIN_CHARS..=QUESTION_MAX_CHARS).contains(&len) {
        return Err(format!(
            "question must be {QUESTION_MIN_CHARS}–{QUESTION_MAX_CHARS} characters after trimming"
        )
        .into());
    }

    let config = super::load_config()?;
    super::require_api_key(&config)?;

    let sessions = SessionManager::from_config(&config).await?;
    let temperature = temperature.unwrap_or(sessions.default_temperature());
    let reply = sessions
        .chat(question, ChatTarget::parse(&chat_id), temperature)
        .await?;

    if json {
        let out = serde_json::json!({
            "chat_id": reply.conversation_id,
            "answer": reply.answer,
            "source_restricted": is_source_restricted(&reply.answer),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", reply.answer);
        println!();
        println!("   chat_id: {}", reply.conversation_id);
    }

    Ok(())
}
