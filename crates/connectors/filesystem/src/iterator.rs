//! Block-by-block record iterator with a resumable cursor.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use pulse_common::{Error, FileObjectMeta, FileObjectOffset, FileRecord, Result, TypedStruct};

use crate::format::{BlockFormat, BlockReader};
use crate::manager::{IteratorHandle, IteratorManager, ManagedIterator};
use crate::{FileInputContext, FileInputIterator};

/// Reads a block-structured file one block at a time.
///
/// Only the block being consumed is held in memory. The cursor follows the
/// emitted records: after the last row of block `p` it reads `(p + 1, 0)`,
/// so a fully drained file ends at `(block_count, 0)`.
///
/// The iterator is registered with an [`IteratorManager`] for its whole
/// life and is closed when dropped.
pub struct BlockFileInputIterator<F: BlockFormat> {
    format: F,
    metadata: FileObjectMeta,
    handle: Arc<IteratorHandle<F::Reader>>,
    num_blocks: usize,
    offset: FileObjectOffset,
    buffer: VecDeque<TypedStruct>,
    exhausted: bool,
}

impl<F: BlockFormat> BlockFileInputIterator<F> {
    /// Opens `metadata` with `format`. Fails right away if the file cannot
    /// be opened.
    pub fn open(format: F, metadata: FileObjectMeta, manager: &IteratorManager) -> Result<Self> {
        let reader = format.open(&metadata)?;
        Ok(Self::with_reader(format, metadata, manager, reader))
    }

    /// Wraps a reader the caller already opened. Seeks reopen the file
    /// through `format`.
    pub fn with_reader(
        format: F,
        metadata: FileObjectMeta,
        manager: &IteratorManager,
        reader: F::Reader,
    ) -> Self {
        let num_blocks = reader.num_blocks();
        let handle = IteratorHandle::register(metadata.uri.clone(), reader, manager);
        info!(uri = %metadata.uri, blocks = num_blocks, "Opened file iterator");
        Self {
            format,
            metadata,
            handle,
            num_blocks,
            offset: FileObjectOffset::initial(),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn metadata(&self) -> &FileObjectMeta {
        &self.metadata
    }

    fn ensure_open(&self) -> Result<()> {
        if self.handle.is_released() {
            return Err(Error::IteratorClosed);
        }
        Ok(())
    }

    /// Loads the next non-empty block into the buffer. Returns `false` once
    /// every block has been consumed.
    fn fill_buffer(&mut self) -> Result<bool> {
        while (self.offset.position() as usize) < self.num_blocks {
            let index = self.offset.position() as usize;
            let skip = self.offset.rows() as usize;
            let rows = match self.handle.with_reader(|reader| reader.read_block(index, skip)) {
                Ok(rows) => rows,
                Err(Error::IteratorClosed) => return Err(Error::IteratorClosed),
                Err(e) => {
                    warn!(
                        uri = %self.metadata.uri,
                        block = index,
                        error = %e,
                        "Failed to read block, closing iterator"
                    );
                    self.close();
                    return Err(e);
                }
            };
            debug!(
                uri = %self.metadata.uri,
                block = index,
                skipped = skip,
                rows = rows.len(),
                "Loaded block"
            );
            if !rows.is_empty() {
                self.buffer = rows.into();
                return Ok(true);
            }
            self.offset = self.offset.advance_block();
        }
        Ok(false)
    }

    /// Checks `target` against the block layout of `reader` and returns the
    /// cursor to resume from.
    fn validate_seek(reader: &F::Reader, target: FileObjectOffset) -> Result<FileObjectOffset> {
        let num_blocks = reader.num_blocks() as u64;
        if target.position() > num_blocks {
            return Err(Error::invalid_seek(
                target,
                format!("file has only {} blocks", num_blocks),
            ));
        }
        if target.position() == num_blocks {
            if target.rows() > 0 {
                return Err(Error::invalid_seek(target, "rows given past the last block"));
            }
            return Ok(target);
        }
        let block_len = reader.block_len(target.position() as usize)? as u64;
        if target.rows() > block_len {
            return Err(Error::invalid_seek(
                target,
                format!("block {} has only {} rows", target.position(), block_len),
            ));
        }
        if target.rows() == block_len {
            return Ok(target.advance_block());
        }
        Ok(target)
    }
}

impl<F: BlockFormat> FileInputIterator for BlockFileInputIterator<F> {
    fn context(&self) -> FileInputContext {
        FileInputContext {
            offset: self.offset,
            metadata: self.metadata.clone(),
        }
    }

    fn seek_to(&mut self, offset: FileObjectOffset) -> Result<()> {
        self.ensure_open()?;
        let reader = self.format.open(&self.metadata)?;
        let target = match Self::validate_seek(&reader, offset) {
            Ok(target) => target,
            Err(e) => {
                warn!(uri = %self.metadata.uri, error = %e, "Rejected seek, closing iterator");
                self.close();
                return Err(e);
            }
        };
        self.num_blocks = reader.num_blocks();
        self.handle.replace_reader(reader)?;
        self.buffer.clear();
        self.exhausted = false;
        self.offset = target;
        info!(uri = %self.metadata.uri, offset = %target, "Seeked file iterator");
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if !self.buffer.is_empty() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }
        let more = self.fill_buffer()?;
        if !more {
            self.exhausted = true;
            debug!(uri = %self.metadata.uri, offset = %self.offset, "Reached end of file");
        }
        Ok(more)
    }

    fn next(&mut self) -> Result<FileRecord> {
        if !self.has_next()? {
            return Err(Error::NoSuchRecord);
        }
        let value = self.buffer.pop_front().ok_or(Error::NoSuchRecord)?;
        self.offset = self.offset.advance_row();
        if self.buffer.is_empty() {
            self.offset = self.offset.advance_block();
        }
        Ok(FileRecord::new(value, self.offset))
    }

    fn close(&mut self) {
        self.buffer.clear();
        if self.handle.release() {
            info!(uri = %self.metadata.uri, offset = %self.offset, "Closed file iterator");
        }
    }

    fn is_closed(&self) -> bool {
        self.handle.is_released()
    }
}

impl<F: BlockFormat> Drop for BlockFileInputIterator<F> {
    fn drop(&mut self) {
        self.close();
    }
}
