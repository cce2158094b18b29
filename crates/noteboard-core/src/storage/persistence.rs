//! Board document persistence
//!
//! Saves and loads the board's Automerge document to and from the
//! filesystem. Writes are atomic (write to a temp file, then rename), so a
//! crash never leaves a half-written board behind.
//!
//! Files, under `Config::data_dir`:
//! - `board.automerge` - the Automerge binary document
//! - `board_id` - the board ID (bs58check encoded)

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use super::error::{StorageError, StorageResult};
use crate::board_id::BoardId;
use crate::config::Config;
use crate::document::BoardDocument;

/// Persistence layer for the board document
pub struct BoardPersistence {
    config: Config,
}

impl BoardPersistence {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a board exists on disk
    pub fn exists(&self) -> bool {
        self.config.board_path().exists()
    }

    /// Save a board to disk, along with its ID
    pub fn save(&self, doc: &mut BoardDocument) -> StorageResult<()> {
        let bytes = doc.save();
        let target_path = self.config.board_path();

        atomic_write(&target_path, &bytes)?;
        self.save_board_id(doc.id())?;

        debug!(path = ?target_path, bytes = bytes.len(), "Saved board");
        Ok(())
    }

    /// Load the board from disk
    ///
    /// Returns `None` if the board file doesn't exist.
    pub fn load(&self) -> StorageResult<Option<BoardDocument>> {
        let path = self.config.board_path();
        if !path.exists() {
            return Ok(None);
        }
        load_file(&path).map(Some)
    }

    /// Load the board, or create and save a new one
    pub fn load_or_create(&self) -> StorageResult<BoardDocument> {
        if let Some(doc) = self.load()? {
            return Ok(doc);
        }

        let mut doc = BoardDocument::new();
        self.save(&mut doc)?;
        info!(board_id = %doc.id(), "Created new board");
        Ok(doc)
    }

    fn save_board_id(&self, id: &BoardId) -> StorageResult<()> {
        atomic_write(&self.config.board_id_path(), id.to_bs58check().as_bytes())
    }

    /// Load the board ID without loading the document
    ///
    /// Returns `None` if the ID file doesn't exist.
    pub fn load_board_id(&self) -> StorageResult<Option<BoardId>> {
        let path = self.config.board_id_path();
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;
        let id = BoardId::from_bs58check(content.trim()).map_err(|e| {
            StorageError::InvalidFormat {
                path: path.clone(),
                details: e.to_string(),
            }
        })?;
        Ok(Some(id))
    }

    /// Automerge URL of the stored board, if one has been saved
    pub fn board_url(&self) -> StorageResult<Option<String>> {
        Ok(self.load_board_id()?.map(|id| id.to_url()))
    }

    /// Delete the board file and its ID file
    pub fn delete_all(&self) -> StorageResult<()> {
        for path in [self.config.board_path(), self.config.board_id_path()] {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| StorageError::from_io(e, path.clone()))?;
            }
        }
        Ok(())
    }
}

/// Load a board document from any file, e.g. another replica's save
pub fn load_file(path: &Path) -> StorageResult<BoardDocument> {
    let bytes = fs::read(path).map_err(|e| StorageError::from_read(e, path.to_path_buf()))?;
    BoardDocument::load(&bytes).map_err(|e| StorageError::InvalidFormat {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })
}
