//! Seam between the record iterator and a block-structured file format.

use pulse_common::{FileObjectMeta, Result, TypedStruct};

/// An open file exposing its contents as ordered blocks of rows.
///
/// Owns the underlying file handle; dropping the reader releases it.
pub trait BlockReader: Send + 'static {
    /// Total number of blocks in the file.
    fn num_blocks(&self) -> usize;

    /// Number of rows in block `index`, taken from file metadata without
    /// decoding the block.
    fn block_len(&self, index: usize) -> Result<usize>;

    /// Decodes block `index`, dropping its first `skip` rows without
    /// converting them. Either the whole remainder decodes or an error is
    /// returned; partially decoded blocks are never handed out.
    fn read_block(&mut self, index: usize, skip: usize) -> Result<Vec<TypedStruct>>;
}

/// Opens [`BlockReader`]s for files of one format.
pub trait BlockFormat: Send + Sync + 'static {
    type Reader: BlockReader;

    /// Opens `metadata` from the beginning of the file.
    fn open(&self, metadata: &FileObjectMeta) -> Result<Self::Reader>;
}
