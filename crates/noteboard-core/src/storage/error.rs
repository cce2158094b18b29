//! Errors reading and writing board files
//!
//! I/O failures are classified by what the user can do about them, so the
//! CLI can print a hint next to the error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No permission to access board file '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Out of space saving board file '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read board file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write board file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are not an Automerge document or the board id is malformed
    #[error("Invalid board format in '{path}': {details}")]
    InvalidFormat { path: PathBuf, details: String },

    #[error("Board file '{path}' does not exist")]
    NotFound { path: PathBuf },

    /// The saved temp file could not replace the board file
    #[error("Could not move saved board '{from}' into place at '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which side of a board file an I/O error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

impl StorageError {
    /// Classify an error raised while writing (or creating) a board file
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        Self::classify(error, path, Access::Write)
    }

    /// Classify an error raised while reading a board file
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        Self::classify(error, path, Access::Read)
    }

    fn classify(source: io::Error, path: PathBuf, access: Access) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied { path, source },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if out_of_space(&source) => StorageError::DiskFull { path, source },
            _ => match access {
                Access::Read => StorageError::ReadError { path, source },
                Access::Write => StorageError::WriteError { path, source },
            },
        }
    }

    /// Whether retrying can succeed once the user fixes their environment
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. } | StorageError::PermissionDenied { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => {
                Some("Free some space in the data directory, then repeat the command.")
            }
            StorageError::PermissionDenied { .. } => {
                Some("Make the data directory writable, or point data_dir somewhere else.")
            }
            StorageError::InvalidFormat { .. } => {
                Some("Move the board file aside to start a new board, or restore it from another replica.")
            }
            _ => None,
        }
    }
}

// ENOSPC and EDQUOT, or ERROR_DISK_FULL and ERROR_HANDLE_DISK_FULL on Windows
#[cfg(target_os = "linux")]
const OUT_OF_SPACE_CODES: &[i32] = &[28, 122];
#[cfg(all(unix, not(target_os = "linux")))]
const OUT_OF_SPACE_CODES: &[i32] = &[28, 69];
#[cfg(windows)]
const OUT_OF_SPACE_CODES: &[i32] = &[112, 39];
#[cfg(not(any(unix, windows)))]
const OUT_OF_SPACE_CODES: &[i32] = &[];

fn out_of_space(error: &io::Error) -> bool {
    if let Some(code) = error.raw_os_error() {
        return OUT_OF_SPACE_CODES.contains(&code);
    }
    let msg = error.to_string().to_lowercase();
    ["no space left", "disk full", "quota exceeded"]
        .iter()
        .any(|needle| msg.contains(needle))
}

pub type StorageResult<T> = Result<T, StorageError>;
