//! Chat invitations
//!
//! Inviting someone into a session means posting the session link into a
//! one-on-one chat with them. The chat service itself is reached through
//! [`ChatDirectory`]; this module only decides which chats to post to.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Kind of chat, as reported by the chat service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatType {
    OneOnOne,
    Group,
    Meeting,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub chat_type: ChatType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMember {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Access to the chat service on behalf of the signed-in user
pub trait ChatDirectory {
    /// Directory id of the signed-in user
    fn my_user_id(&self) -> Result<String>;

    /// Chats the signed-in user belongs to
    fn chats(&self) -> Result<Vec<Chat>>;

    fn chat_members(&self, chat_id: &str) -> Result<Vec<ChatMember>>;

    fn post_message(&mut self, chat_id: &str, content: &str) -> Result<()>;

    /// Create a one-on-one chat between two users
    fn create_one_on_one_chat(&mut self, first: &str, second: &str) -> Result<Chat>;
}

/// Where an invitation was delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    /// Posted into existing one-on-one chats
    Posted { chat_ids: Vec<String> },
    /// No chat existed; one was created and the invitation posted there
    Created { chat_id: String },
}

/// Body of an invitation message
pub fn invite_message(session_url: &str) -> String {
    format!("Come collaborate with us! {}", session_url)
}

/// Invite a user into the session at `session_url`
pub fn invite_to_session<D: ChatDirectory>(
    directory: &mut D,
    user_id: &str,
    session_url: &str,
) -> Result<InviteOutcome> {
    let message = invite_message(session_url);
    let chats = directory.chats().context("Failed to list chats")?;

    let mut posted = Vec::new();
    for chat in chats.iter().filter(|c| c.chat_type == ChatType::OneOnOne) {
        let members = directory
            .chat_members(&chat.id)
            .with_context(|| format!("Failed to list members of chat {}", chat.id))?;

        if members.iter().any(|m| m.user_id == user_id) {
            directory
                .post_message(&chat.id, &message)
                .with_context(|| format!("Failed to post invitation to chat {}", chat.id))?;
            posted.push(chat.id.clone());
        }
    }

    if !posted.is_empty() {
        info!(user_id, chats = posted.len(), "Posted invitation");
        return Ok(InviteOutcome::Posted { chat_ids: posted });
    }

    debug!(user_id, "No one-on-one chat found, creating one");
    let me = directory.my_user_id().context("Failed to get signed-in user")?;
    let chat = directory
        .create_one_on_one_chat(&me, user_id)
        .context("Failed to create chat")?;
    directory
        .post_message(&chat.id, &message)
        .with_context(|| format!("Failed to post invitation to chat {}", chat.id))?;

    info!(user_id, chat_id = %chat.id, "Created chat and posted invitation");
    Ok(InviteOutcome::Created { chat_id: chat.id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeDirectory {
        chats: Vec<Chat>,
        members: HashMap<String, Vec<ChatMember>>,
        posted: Vec<(String, String)>,
        fail_posts: bool,
    }

    impl FakeDirectory {
        fn with_chat(mut self, id: &str, chat_type: ChatType, members: &[&str]) -> Self {
            self.chats.push(Chat {
                id: id.to_string(),
                chat_type,
            });
            self.members.insert(
                id.to_string(),
                members
                    .iter()
                    .map(|m| ChatMember {
                        user_id: m.to_string(),
                        display_name: None,
                    })
                    .collect(),
            );
            self
        }
    }

    impl ChatDirectory for FakeDirectory {
        fn my_user_id(&self) -> Result<String> {
            Ok("me".to_string())
        }

        fn chats(&self) -> Result<Vec<Chat>> {
            Ok(self.chats.clone())
        }

        fn chat_members(&self, chat_id: &str) -> Result<Vec<ChatMember>> {
            Ok(self.members.get(chat_id).cloned().unwrap_or_default())
        }

        fn post_message(&mut self, chat_id: &str, content: &str) -> Result<()> {
            if self.fail_posts {
                anyhow::bail!("service unavailable");
            }
            self.posted.push((chat_id.to_string(), content.to_string()));
            Ok(())
        }

        fn create_one_on_one_chat(&mut self, first: &str, second: &str) -> Result<Chat> {
            let id = format!("chat-{}-{}", first, second);
            let chat = Chat {
                id: id.clone(),
                chat_type: ChatType::OneOnOne,
            };
            self.chats.push(chat.clone());
            self.members.insert(
                id,
                vec![
                    ChatMember {
                        user_id: first.to_string(),
                        display_name: None,
                    },
                    ChatMember {
                        user_id: second.to_string(),
                        display_name: None,
                    },
                ],
            );
            Ok(chat)
        }
    }

    #[test]
    fn test_invite_message() {
        assert_eq!(
            invite_message("https://board.example/1"),
            "Come collaborate with us! https://board.example/1"
        );
    }

    #[test]
    fn test_posts_into_existing_one_on_one_chat() {
        let mut directory = FakeDirectory::default()
            .with_chat("c1", ChatType::OneOnOne, &["me", "u2"])
            .with_chat("c2", ChatType::OneOnOne, &["me", "u3"])
            .with_chat("c3", ChatType::Group, &["me", "u2", "u3"]);

        let outcome = invite_to_session(&mut directory, "u2", "https://b").unwrap();

        assert_eq!(
            outcome,
            InviteOutcome::Posted {
                chat_ids: vec!["c1".to_string()]
            }
        );
        assert_eq!(
            directory.posted,
            vec![("c1".to_string(), invite_message("https://b"))]
        );
    }

    #[test]
    fn test_creates_chat_when_none_exists() {
        let mut directory =
            FakeDirectory::default().with_chat("c3", ChatType::Group, &["me", "u2"]);

        let outcome = invite_to_session(&mut directory, "u2", "https://b").unwrap();

        assert_eq!(
            outcome,
            InviteOutcome::Created {
                chat_id: "chat-me-u2".to_string()
            }
        );
        assert_eq!(directory.posted.len(), 1);
        let members = directory.chat_members("chat-me-u2").unwrap();
        assert_eq!(members[0].user_id, "me");
        assert_eq!(members[1].user_id, "u2");
    }

    #[test]
    fn test_errors_propagate_with_context() {
        let mut directory = FakeDirectory {
            fail_posts: true,
            ..FakeDirectory::default()
        }
        .with_chat("c1", ChatType::OneOnOne, &["me", "u2"]);

        let err = invite_to_session(&mut directory, "u2", "https://b").unwrap_err();
        assert!(err.to_string().contains("c1"));
    }

    #[test]
    fn test_unknown_chat_type_deserializes() {
        let chat: Chat = serde_json::from_str(r#"{"id":"c9","chatType":"unknownFutureValue"}"#).unwrap();
        assert_eq!(chat.chat_type, ChatType::Unknown);
    }
}
