//! Storage layer
//!
//! The Automerge document is the only source of truth; it is stored as a
//! binary file next to a small file holding the board ID. Views are always
//! computed from the loaded document.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{load_file, BoardPersistence};
