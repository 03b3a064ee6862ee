//! Persists iterator cursors so a restarted reader can resume a file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pulse_common::{FileObjectMeta, FileObjectOffset, Result};

#[derive(Debug, Serialize, Deserialize)]
struct StoredOffset {
    uri: String,
    offset: FileObjectOffset,
}

/// Keeps one JSON document per source URI in a directory.
#[derive(Debug, Clone)]
pub struct FileOffsetStore {
    dir: PathBuf,
}

impl FileOffsetStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the last committed cursor for `metadata`, if any.
    pub fn load(&self, metadata: &FileObjectMeta) -> Result<Option<FileObjectOffset>> {
        let path = self.path_for(metadata);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredOffset = serde_json::from_slice(&bytes)?;
        if stored.uri != metadata.uri {
            warn!(
                uri = %metadata.uri,
                stored = %stored.uri,
                "Ignoring offset stored for another file"
            );
            return Ok(None);
        }
        Ok(Some(stored.offset))
    }

    /// Writes `offset` for `metadata`. The previous value stays readable
    /// until the new one is complete.
    pub fn save(&self, metadata: &FileObjectMeta, offset: FileObjectOffset) -> Result<()> {
        let path = self.path_for(metadata);
        let tmp = path.with_extension("json.tmp");
        let stored = StoredOffset {
            uri: metadata.uri.clone(),
            offset,
        };
        fs::write(&tmp, serde_json::to_vec(&stored)?)?;
        fs::rename(&tmp, &path)?;
        debug!(uri = %metadata.uri, %offset, "Committed offset");
        Ok(())
    }

    pub fn remove(&self, metadata: &FileObjectMeta) -> Result<()> {
        match fs::remove_file(self.path_for(metadata)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// File name for a URI. Bytes outside `[A-Za-z0-9.-]` become `_XX`, so
    /// distinct URIs never share a file.
    fn path_for(&self, metadata: &FileObjectMeta) -> PathBuf {
        let mut key = String::with_capacity(metadata.uri.len());
        for byte in metadata.uri.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
                key.push(byte as char);
            } else {
                key.push_str(&format!("_{:02x}", byte));
            }
        }
        self.dir.join(format!("{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOffsetStore::new(dir.path()).unwrap();
        let meta = FileObjectMeta::new("file:///data/a.parquet", "a.parquet", 0);
        assert!(store.load(&meta).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOffsetStore::new(dir.path().join("offsets")).unwrap();
        let meta = FileObjectMeta::new("file:///data/a.parquet", "a.parquet", 0);

        store.save(&meta, FileObjectOffset::new(1, 2, 100)).unwrap();
        store.save(&meta, FileObjectOffset::new(3, 0, 200)).unwrap();

        let offset = store.load(&meta).unwrap().unwrap();
        assert_eq!(offset, FileObjectOffset::new(3, 0, 0));
        assert_eq!(offset.timestamp(), 200);
    }

    #[test]
    fn test_similar_uris_keep_separate_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOffsetStore::new(dir.path()).unwrap();
        let a = FileObjectMeta::new("file:///data/a_b", "a_b", 0);
        let b = FileObjectMeta::new("file:///data/a/b", "b", 0);
        let c = FileObjectMeta::new("file:///data/a_2fb", "a_2fb", 0);

        store.save(&a, FileObjectOffset::new(3, 1, 0)).unwrap();
        store.save(&b, FileObjectOffset::new(0, 1, 0)).unwrap();
        store.save(&c, FileObjectOffset::new(7, 0, 0)).unwrap();

        assert_eq!(store.load(&a).unwrap(), Some(FileObjectOffset::new(3, 1, 0)));
        assert_eq!(store.load(&b).unwrap(), Some(FileObjectOffset::new(0, 1, 0)));
        assert_eq!(store.load(&c).unwrap(), Some(FileObjectOffset::new(7, 0, 0)));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOffsetStore::new(dir.path()).unwrap();
        let meta = FileObjectMeta::new("file:///data/a.parquet", "a.parquet", 0);

        store.save(&meta, FileObjectOffset::new(1, 0, 0)).unwrap();
        store.remove(&meta).unwrap();
        store.remove(&meta).unwrap();
        assert!(store.load(&meta).unwrap().is_none());
    }
}
