//! Persisted board
//!
//! `BoardStore` owns the board document of this replica and writes it back
//! to disk after every change made through it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = BoardStore::open()?;  // Creates or loads existing
//! let me = store.user()?;
//!
//! store.update(|board| board.set_note(&note.id, &note))?;
//! let views = store.board().note_views(&me)?;
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::board::NoteBoard;
use crate::board_id::BoardId;
use crate::config::Config;
use crate::document::BoardDocument;
use crate::error::BoardResult;
use crate::models::User;
use crate::storage::{load_file, BoardPersistence};

/// The board of this replica, backed by a file
pub struct BoardStore {
    board: NoteBoard<BoardDocument>,
    persistence: BoardPersistence,
    config: Config,
}

impl BoardStore {
    /// Open the store, creating a new board if none exists
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = BoardPersistence::new(config.clone());
        let doc = persistence
            .load_or_create()
            .context("Failed to load or create board")?;

        Ok(Self {
            board: NoteBoard::new(doc),
            persistence,
            config,
        })
    }

    /// Create a new board; fails if one already exists
    pub fn init(config: Config) -> Result<Self> {
        let persistence = BoardPersistence::new(config.clone());
        if persistence.exists() {
            anyhow::bail!(
                "Board already exists at {:?}. Use `noteboard status` to see its ID.",
                config.board_path()
            );
        }
        Self::open_with_config(config)
    }

    pub fn board(&self) -> &NoteBoard<BoardDocument> {
        &self.board
    }

    /// Mutable access to the board
    ///
    /// Changes made here are only written to disk by [`BoardStore::save`].
    pub fn board_mut(&mut self) -> &mut NoteBoard<BoardDocument> {
        &mut self.board
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board_id(&self) -> &BoardId {
        self.board.map().id()
    }

    /// Get the Automerge URL of the board
    pub fn board_url(&self) -> String {
        self.board.map().url()
    }

    /// The configured local user
    pub fn user(&self) -> Result<User> {
        self.config.user().context(
            "No user configured. Set one with `noteboard config set user_id <id>` or NOTEBOARD_USER_ID.",
        )
    }

    /// Apply a change to the board and save it
    pub fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut NoteBoard<BoardDocument>) -> BoardResult<T>,
    {
        let result = f(&mut self.board).context("Failed to update board")?;
        self.save()?;
        Ok(result)
    }

    /// Write the board to disk
    pub fn save(&mut self) -> Result<()> {
        self.persistence
            .save(self.board.map_mut())
            .context("Failed to save board")
    }

    /// Merge another replica's board file into this board and save
    ///
    /// Listeners subscribed on the board receive every changed key as a
    /// remote change. Returns the number of changed keys.
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        let mut other =
            load_file(path).with_context(|| format!("Failed to load replica from {:?}", path))?;
        let changed = self
            .board
            .map_mut()
            .merge(&mut other)
            .with_context(|| format!("Failed to merge replica from {:?}", path))?;
        self.save()?;

        info!(path = ?path, changed, "Merged replica file");
        Ok(changed)
    }
}
