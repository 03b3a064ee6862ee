use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use pulse_common::{Error, FileObjectMeta, FileObjectOffset, TypedStruct};
use pulse_connector_filesystem::{
    FileInputIterator, FileOffsetStore, IteratorManager, ParquetFileInputIterator,
};

use crate::error::PulseError;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Forget the committed offset and start from the beginning.
    pub reset: bool,
    pub limit: Option<u64>,
    pub commit_interval: u64,
}

#[derive(Debug, Clone)]
pub struct ReadSummary {
    pub emitted: u64,
    pub offset: FileObjectOffset,
    /// The iterator was closed from outside before the file was drained.
    pub interrupted: bool,
}

#[derive(Serialize)]
struct OutputLine<'a> {
    offset: &'a FileObjectOffset,
    value: &'a TypedStruct,
}

/// Writes the records of `metadata` to `out`, one JSON document per line,
/// starting after the offset committed in `store`.
///
/// The offset is committed every `commit_interval` records and once more
/// when reading stops, including when another thread closes the iterator
/// through `manager`.
pub fn read_file<W: Write>(
    metadata: &FileObjectMeta,
    store: &FileOffsetStore,
    manager: &IteratorManager,
    options: &ReadOptions,
    out: &mut W,
) -> Result<ReadSummary, PulseError> {
    if options.reset {
        store.remove(metadata)?;
    }

    let mut iterator = ParquetFileInputIterator::open_path(metadata.clone(), manager)?;
    if let Some(saved) = store.load(metadata)? {
        info!(uri = %metadata.uri, offset = %saved, "Resuming from committed offset");
        iterator.seek_to(saved)?;
    }

    let commit_interval = options.commit_interval.max(1);
    let mut offset = iterator.context().offset;
    let mut emitted = 0u64;
    let mut uncommitted = 0u64;

    let interrupted = loop {
        if options.limit.is_some_and(|limit| emitted >= limit) {
            break false;
        }
        let next = iterator
            .has_next()
            .and_then(|more| if more { iterator.next().map(Some) } else { Ok(None) });
        let record = match next {
            Ok(Some(record)) => record,
            Ok(None) => break false,
            Err(Error::IteratorClosed) => break true,
            Err(e) => {
                if let Err(commit_err) = store.save(metadata, offset) {
                    warn!(uri = %metadata.uri, error = %commit_err, "Failed to commit offset");
                }
                return Err(e.into());
            }
        };

        let line = OutputLine {
            offset: &record.offset,
            value: &record.value,
        };
        let json = serde_json::to_string(&line).map_err(Error::from)?;
        writeln!(out, "{}", json)?;

        offset = record.offset;
        emitted += 1;
        uncommitted += 1;
        if uncommitted >= commit_interval {
            store.save(metadata, offset)?;
            uncommitted = 0;
        }
    };

    // Includes empty blocks skipped after the last record.
    let offset = iterator.context().offset;
    store.save(metadata, offset)?;
    iterator.close();
    Ok(ReadSummary {
        emitted,
        offset,
        interrupted,
    })
}
