use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Describes a file to read: where it lives and how large it is.
///
/// Readers only use the URI to open the file; the other fields are carried
/// along for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObjectMeta {
    pub uri: String,
    pub name: String,
    pub content_length: u64,
    pub last_modified: i64,
}

impl FileObjectMeta {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, content_length: u64) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            content_length,
            last_modified: 0,
        }
    }

    /// Reads metadata for a file on the local filesystem.
    pub fn from_local_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stat = std::fs::metadata(path)?;
        let last_modified = stat
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let absolute = std::fs::canonicalize(path)?;
        Ok(Self {
            uri: format!("file://{}", absolute.display()),
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            content_length: stat.len(),
            last_modified,
        })
    }

    /// Local path for the URI, with any `file://` scheme removed.
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }
}
