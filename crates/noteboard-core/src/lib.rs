//! Noteboard Core Library
//!
//! This crate provides the model of Noteboard, a shared brainstorming board:
//! sticky notes with text, color, position and author, likes, and the list
//! of users signed in to the board.
//!
//! # Architecture
//!
//! - **Shared map**: all board state lives in one flat key-value map
//!   (see [`keys`] for the layout), behind the [`SharedMap`] trait
//! - **Automerge**: [`BoardDocument`] is the replicated implementation,
//!   [`MemoryMap`] an in-process one
//!
//! Views (note lists, like counts, the liked ranking) are recomputed from
//! the map on every call.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = BoardStore::open()?;
//! let me = store.user()?;
//!
//! // Add a note
//! let note = NoteData::new(me.clone(), Position::new(10.0, 20.0), "yellow")
//!     .with_text("Ship it");
//! store.update(|board| board.set_note(&note.id, &note))?;
//!
//! // Like it
//! store.update(|board| board.like_note(&note.id, &me))?;
//!
//! // Query notes
//! let views = store.board().note_views(&me)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Persisted board (main entry point)
//! - `board`: Note, like and roster operations over a shared map
//! - `shared_map`: The shared map trait, change events, in-memory map
//! - `document`: Automerge-backed board document
//! - `keys`: Flat key layout
//! - `models`: Users, notes and derived views
//! - `presence`: Presence notifications
//! - `chat`: Session invitations over a chat service
//! - `board_id`: Board ID compatible with automerge-repo
//! - `storage`: File persistence
//! - `config`: Application configuration

pub mod board;
pub mod board_id;
pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod keys;
pub mod models;
pub mod presence;
pub mod shared_map;
pub mod storage;
pub mod store;

pub use board::NoteBoard;
pub use board_id::{BoardId, BoardIdError};
pub use chat::{invite_to_session, ChatDirectory, InviteOutcome};
pub use config::Config;
pub use document::BoardDocument;
pub use error::{BoardError, BoardResult};
pub use models::{LikedNote, NoteData, NoteView, Position, User};
pub use presence::{PresenceAction, PresenceEvent, PresenceNotifier};
pub use shared_map::{Listener, MemoryMap, SharedMap, Subscription, ValueChanged};
pub use storage::{BoardPersistence, StorageError};
pub use store::BoardStore;
