//! Resumable cursor into a block-structured file.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How far a file has been consumed.
///
/// `position` counts fully consumed blocks (row-groups), it is not a byte
/// offset. `rows` counts the records already emitted from the block at
/// `position` and is reset to 0 whenever `position` moves on. Once every
/// block is drained the cursor is `(block_count, 0)`.
///
/// A cursor is only meaningful for the file it was taken from. Two cursors
/// compare by `(position, rows)`; `timestamp` is informational.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FileObjectOffset {
    position: u64,
    rows: u64,
    timestamp: i64,
}

impl FileObjectOffset {
    /// Creates a cursor without checking it against any file. Validation
    /// happens when an iterator seeks to it.
    pub fn new(position: u64, rows: u64, timestamp: i64) -> Self {
        Self {
            position,
            rows,
            timestamp,
        }
    }

    /// The cursor of a file nothing has been read from.
    pub fn initial() -> Self {
        Self::new(0, 0, now_millis())
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// One more record emitted from the current block.
    pub fn advance_row(&self) -> Self {
        Self::new(self.position, self.rows + 1, now_millis())
    }

    /// The current block is done; move to the start of the next one.
    pub fn advance_block(&self) -> Self {
        Self::new(self.position + 1, 0, now_millis())
    }
}

impl Default for FileObjectOffset {
    fn default() -> Self {
        Self::initial()
    }
}

impl PartialEq for FileObjectOffset {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.rows == other.rows
    }
}

impl Eq for FileObjectOffset {}

impl PartialOrd for FileObjectOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileObjectOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.position, self.rows).cmp(&(other.position, other.rows))
    }
}

impl fmt::Display for FileObjectOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(position={}, rows={})", self.position, self.rows)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_is_origin() {
        let offset = FileObjectOffset::initial();
        assert_eq!(offset.position(), 0);
        assert_eq!(offset.rows(), 0);
    }

    #[test]
    fn test_advance_row_keeps_position() {
        let offset = FileObjectOffset::new(3, 1, 0).advance_row();
        assert_eq!((offset.position(), offset.rows()), (3, 2));
    }

    #[test]
    fn test_advance_block_resets_rows() {
        let offset = FileObjectOffset::new(3, 5, 0).advance_block();
        assert_eq!((offset.position(), offset.rows()), (4, 0));
    }

    #[test]
    fn test_advancing_does_not_mutate_original() {
        let original = FileObjectOffset::new(1, 1, 42);
        let _ = original.advance_row();
        let _ = original.advance_block();
        assert_eq!(original, FileObjectOffset::new(1, 1, 42));
        assert_eq!(original.timestamp(), 42);
    }

    #[test]
    fn test_equality_ignores_timestamp() {
        assert_eq!(FileObjectOffset::new(2, 1, 10), FileObjectOffset::new(2, 1, 99));
        assert_ne!(FileObjectOffset::new(2, 1, 10), FileObjectOffset::new(2, 0, 10));
    }

    #[test]
    fn test_ordering_is_block_then_row() {
        let a = FileObjectOffset::new(0, 9, 0);
        let b = FileObjectOffset::new(1, 0, 0);
        let c = FileObjectOffset::new(1, 3, 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(c.max(a), c);
    }

    #[test]
    fn test_accepts_arbitrary_values() {
        let offset = FileObjectOffset::new(u64::MAX, u64::MAX, -1);
        assert_eq!(offset.position(), u64::MAX);
    }

    #[test]
    fn test_serde_layout() {
        let offset = FileObjectOffset::new(4, 0, 1_700_000_000_000);
        let json = serde_json::to_string(&offset).unwrap();
        assert_eq!(json, r#"{"position":4,"rows":0,"timestamp":1700000000000}"#);
        let back: FileObjectOffset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp(), 1_700_000_000_000);
    }
}
