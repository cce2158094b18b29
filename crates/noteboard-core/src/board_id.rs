//! Board identifiers
//!
//! A board is identified by 16 random bytes, rendered as bs58check the way
//! automerge-repo renders document ids, so a board can be shared as an
//! `automerge:` URL.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

const URL_SCHEME: &str = "automerge:";

/// Errors parsing a board id
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardIdError {
    #[error("Invalid bs58check encoding: {0}")]
    Encoding(String),

    #[error("Expected 16 bytes, got {0}")]
    Length(usize),

    #[error("Not an automerge URL: {0}")]
    NotAUrl(String),
}

/// Identifier of a board document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardId(Uuid);

impl BoardId {
    /// Generate a random board id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn to_bs58check(&self) -> String {
        bs58::encode(self.as_bytes()).with_check().into_string()
    }

    pub fn from_bs58check(s: &str) -> Result<Self, BoardIdError> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| BoardIdError::Encoding(e.to_string()))?;
        let bytes: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| BoardIdError::Length(bytes.len()))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Shareable `automerge:<id>` URL
    pub fn to_url(&self) -> String {
        format!("{}{}", URL_SCHEME, self.to_bs58check())
    }

    pub fn from_url(url: &str) -> Result<Self, BoardIdError> {
        let encoded = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| BoardIdError::NotAUrl(url.to_string()))?;
        Self::from_bs58check(encoded)
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bs58check())
    }
}

impl FromStr for BoardId {
    type Err = BoardIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(URL_SCHEME) {
            Self::from_url(s)
        } else {
            Self::from_bs58check(s)
        }
    }
}
