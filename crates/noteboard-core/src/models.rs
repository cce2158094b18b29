//! Data models for Noteboard
//!
//! Defines the records stored on a board and the read views derived from it.
//! Field names serialize in camelCase so that records written by other peers
//! decode unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An identity supplied by the directory service
///
/// Only `user_id` is interpreted. Any other attribute is carried verbatim,
/// so a record read back from the board equals the record that was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Directory user id
    pub user_id: String,
    /// Display attributes (`displayName`, `mail`, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    /// Create a user with no display attributes
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.attributes
            .insert("displayName".to_string(), Value::String(name.into()));
        self
    }

    /// Display name, if the directory supplied one
    pub fn display_name(&self) -> Option<&str> {
        self.attributes.get("displayName").and_then(Value::as_str)
    }

    /// Display name, falling back to the user id
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(&self.user_id)
    }
}

/// A point on the board
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A complete note, as written by `NoteBoard::set_note`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    pub id: String,
    /// `None` clears any stored text
    pub text: Option<String>,
    pub position: Position,
    pub author: User,
    pub color: String,
}

impl NoteData {
    /// Create a note with a fresh random id
    pub fn new(author: User, position: Position, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: None,
            position,
            author,
            color: color.into(),
        }
    }

    /// Builder-style text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A note as read back from the board for one viewer
///
/// Every stored attribute is optional: a note may be only partially written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: String,
    pub text: Option<String>,
    pub position: Option<Position>,
    pub author: Option<User>,
    pub color: Option<String>,
    /// Number of active likes
    #[serde(rename = "numLikesCalculated")]
    pub num_likes: usize,
    /// Whether the viewer is among the likers
    #[serde(rename = "didILikeThisCalculated")]
    pub did_i_like: bool,
}

/// An entry of the liked-notes ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikedNote {
    pub text: String,
    pub color: Option<String>,
    pub author: Option<User>,
    #[serde(rename = "numLikesCalculated")]
    pub num_likes: usize,
}
