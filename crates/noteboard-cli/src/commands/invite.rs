//! Invite command handler
//!
//! The chat service is read from and written back to a JSON file
//! (`chats.json` in the data directory unless given), so invitations can be
//! handed to whatever delivers them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use noteboard_core::chat::{Chat, ChatMember, ChatType};
use noteboard_core::{invite_to_session, BoardStore, ChatDirectory, InviteOutcome};

use crate::output::Output;

/// A message queued for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMessage {
    pub chat_id: String,
    pub content: String,
}

/// Chat service snapshot stored as JSON
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFile {
    pub my_user_id: String,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub members: HashMap<String, Vec<ChatMember>>,
    #[serde(default)]
    pub outbox: Vec<PostedMessage>,
}

impl ChatFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read chat file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse chat file: {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize chats")?;
        fs::write(path, content).with_context(|| format!("Failed to write chat file: {:?}", path))
    }
}

impl ChatDirectory for ChatFile {
    fn my_user_id(&self) -> Result<String> {
        Ok(self.my_user_id.clone())
    }

    fn chats(&self) -> Result<Vec<Chat>> {
        Ok(self.chats.clone())
    }

    fn chat_members(&self, chat_id: &str) -> Result<Vec<ChatMember>> {
        Ok(self.members.get(chat_id).cloned().unwrap_or_default())
    }

    fn post_message(&mut self, chat_id: &str, content: &str) -> Result<()> {
        self.outbox.push(PostedMessage {
            chat_id: chat_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    fn create_one_on_one_chat(&mut self, first: &str, second: &str) -> Result<Chat> {
        let chat = Chat {
            id: format!("{}:{}", first, second),
            chat_type: ChatType::OneOnOne,
        };
        let members = [first, second]
            .iter()
            .map(|id| ChatMember {
                user_id: id.to_string(),
                display_name: None,
            })
            .collect();
        self.chats.push(chat.clone());
        self.members.insert(chat.id.clone(), members);
        Ok(chat)
    }
}

/// Invite a user into the session through the chat file
pub fn invite(
    store: &BoardStore,
    user_id: String,
    chats: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let session_url = store.config().session_url.as_deref().context(
        "No session URL configured. Set one with `noteboard config set session_url <url>`.",
    )?;
    let path = chats.unwrap_or_else(|| store.config().data_dir.join("chats.json"));

    let mut directory = ChatFile::load(&path)?;
    let outcome = invite_to_session(&mut directory, &user_id, session_url)?;
    directory.save(&path)?;

    match outcome {
        InviteOutcome::Posted { chat_ids } => output.success(&format!(
            "Invited {} in {} chat(s)",
            user_id,
            chat_ids.len()
        )),
        InviteOutcome::Created { chat_id } => {
            output.success(&format!("Invited {} in new chat {}", user_id, chat_id))
        }
    }
    Ok(())
}
