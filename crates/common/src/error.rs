use thiserror::Error;

use crate::offset::FileObjectOffset;

/// Unified error type for Pulse crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid seek to {offset}: {reason}")]
    InvalidSeek {
        offset: FileObjectOffset,
        reason: String,
    },
    #[error("No more records to read")]
    NoSuchRecord,
    #[error("Iterator is closed")]
    IteratorClosed,
    #[error("Failed to decode block {block}: {reason}")]
    Decode { block: u64, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    pub fn invalid_seek(offset: FileObjectOffset, reason: impl Into<String>) -> Self {
        Error::InvalidSeek {
            offset,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
