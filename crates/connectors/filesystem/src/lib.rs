//! Filesystem connector
//!
//! Resumable record iterators over block-structured files. A reader walks a
//! file one block at a time, hands out [`FileRecord`]s and keeps a
//! [`FileObjectOffset`] that a new process can seek back to after a restart.
//!
//! ```no_run
//! use pulse_common::FileObjectMeta;
//! use pulse_connector_filesystem::{FileInputIterator, IteratorManager, ParquetFileInputIterator};
//!
//! # fn main() -> pulse_common::Result<()> {
//! let manager = IteratorManager::new();
//! let meta = FileObjectMeta::from_local_path("data.parquet")?;
//! let mut iterator = ParquetFileInputIterator::open_path(meta, &manager)?;
//! while iterator.has_next()? {
//!     let record = iterator.next()?;
//!     println!("{:?} at {}", record.value, record.offset);
//! }
//! # Ok(())
//! # }
//! ```

use pulse_common::{FileObjectMeta, FileObjectOffset, FileRecord, Result};

pub mod format;
pub mod iterator;
pub mod manager;
pub mod offset_store;
pub mod parquet;

pub use format::{BlockFormat, BlockReader};
pub use iterator::BlockFileInputIterator;
pub use manager::{IteratorId, IteratorManager, ManagedIterator};
pub use offset_store::FileOffsetStore;
pub use self::parquet::{ParquetBlockReader, ParquetFileInputIterator, ParquetFormat};

/// Read-only snapshot of where an iterator stands.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInputContext {
    pub offset: FileObjectOffset,
    pub metadata: FileObjectMeta,
}

/// A closable, seekable cursor over the records of one file.
///
/// Calls must come from one owner at a time. `close` may be called from any
/// path and any number of times; once closed every other call fails with
/// [`pulse_common::Error::IteratorClosed`].
pub trait FileInputIterator: Send {
    fn context(&self) -> FileInputContext;

    /// Repositions the iterator so the next record is the first one not
    /// covered by `offset`.
    fn seek_to(&mut self, offset: FileObjectOffset) -> Result<()>;

    fn has_next(&mut self) -> Result<bool>;

    /// Returns the next record. Fails with
    /// [`pulse_common::Error::NoSuchRecord`] once the file is drained.
    fn next(&mut self) -> Result<FileRecord>;

    fn close(&mut self);

    fn is_closed(&self) -> bool;
}
