//! `kbchat history`: Print a stored conversation.

use kbchat_core::{ChatStore, ConversationId};

pub async fn run(chat_id: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = kbchat_store::open_from_config(&config.store).await?;

    let messages = store.get(&chat_id).await?;

    if json {
        let out = serde_json::json!({
            "chat_id": ConversationId::from(&chat_id),
            "history": messages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("💬 Conversation {chat_id} ({} messages)", messages.len());
    println!();
    for message in &messages {
        println!(
            "[{}] {:>5}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            message.role.as_str(),
            message.content
        );
    }

    Ok(())
}
