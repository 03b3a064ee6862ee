//! Parquet adapter: one block per row-group.

use std::fs::File;

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field as ParquetSdkField, Row as ParquetRow};

use pulse_common::{Error, FileObjectMeta, Result, TypedStruct, TypedValue};

use crate::format::{BlockFormat, BlockReader};
use crate::iterator::BlockFileInputIterator;
use crate::manager::IteratorManager;

/// Opens Parquet files for block-wise reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetFormat;

impl ParquetFormat {
    /// Reads the footer of an already open file.
    pub fn open_file(&self, metadata: &FileObjectMeta, file: File) -> Result<ParquetBlockReader> {
        let reader = SerializedFileReader::new(file).map_err(|e| {
            Error::io(format!("Failed to create Parquet reader for {}: {}", metadata.uri, e))
        })?;
        Ok(ParquetBlockReader {
            uri: metadata.uri.clone(),
            reader,
        })
    }
}

impl BlockFormat for ParquetFormat {
    type Reader = ParquetBlockReader;

    fn open(&self, metadata: &FileObjectMeta) -> Result<ParquetBlockReader> {
        let file = File::open(metadata.local_path()).map_err(|e| {
            Error::io(format!("Failed to open Parquet file {}: {}", metadata.uri, e))
        })?;
        self.open_file(metadata, file)
    }
}

/// An open Parquet file. Row-groups are the blocks.
pub struct ParquetBlockReader {
    uri: String,
    reader: SerializedFileReader<File>,
}

impl BlockReader for ParquetBlockReader {
    fn num_blocks(&self) -> usize {
        self.reader.metadata().num_row_groups()
    }

    fn block_len(&self, index: usize) -> Result<usize> {
        let metadata = self.reader.metadata();
        if index >= metadata.num_row_groups() {
            return Err(Error::io(format!("{} has no row group {}", self.uri, index)));
        }
        Ok(metadata.row_group(index).num_rows() as usize)
    }

    fn read_block(&mut self, index: usize, skip: usize) -> Result<Vec<TypedStruct>> {
        let row_group = self.reader.get_row_group(index).map_err(|e| {
            Error::io(format!("Failed to get row group {} of {}: {}", index, self.uri, e))
        })?;
        let rows = row_group.get_row_iter(None).map_err(|e| Error::Decode {
            block: index as u64,
            reason: e.to_string(),
        })?;
        rows.skip(skip)
            .map(|row| {
                row.map(|row| convert_row(&row)).map_err(|e| Error::Decode {
                    block: index as u64,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// Record iterator over a Parquet file.
pub type ParquetFileInputIterator = BlockFileInputIterator<ParquetFormat>;

impl BlockFileInputIterator<ParquetFormat> {
    /// Wraps a file the caller opened. The footer is read here, so a file
    /// that is not Parquet fails immediately.
    pub fn new(metadata: FileObjectMeta, manager: &IteratorManager, file: File) -> Result<Self> {
        let reader = ParquetFormat.open_file(&metadata, file)?;
        Ok(Self::with_reader(ParquetFormat, metadata, manager, reader))
    }

    /// Opens the file at the metadata URI.
    pub fn open_path(metadata: FileObjectMeta, manager: &IteratorManager) -> Result<Self> {
        Self::open(ParquetFormat, metadata, manager)
    }
}

fn convert_row(row: &ParquetRow) -> TypedStruct {
    row.get_column_iter()
        .fold(TypedStruct::new(), |record, (name, field)| {
            record.put(name.clone(), convert_field(field))
        })
}

fn convert_field(field: &ParquetSdkField) -> TypedValue {
    match field {
        ParquetSdkField::Null => TypedValue::Null,
        ParquetSdkField::Bool(b) => TypedValue::Boolean(*b),
        ParquetSdkField::Byte(b) => TypedValue::Int(*b as i32),
        ParquetSdkField::Short(s) => TypedValue::Int(*s as i32),
        ParquetSdkField::Int(i) => TypedValue::Int(*i),
        ParquetSdkField::Long(l) => TypedValue::Long(*l),
        ParquetSdkField::UByte(b) => TypedValue::Int(*b as i32),
        ParquetSdkField::UShort(s) => TypedValue::Int(*s as i32),
        ParquetSdkField::UInt(i) => TypedValue::Long(*i as i64),
        ParquetSdkField::ULong(l) => match i64::try_from(*l) {
            Ok(l) => TypedValue::Long(l),
            Err(_) => TypedValue::String(l.to_string()),
        },
        ParquetSdkField::Float(f) => TypedValue::Float(*f),
        ParquetSdkField::Double(d) => TypedValue::Double(*d),
        ParquetSdkField::Str(s) => TypedValue::String(s.clone()),
        ParquetSdkField::Bytes(b) => TypedValue::Bytes(b.data().to_vec()),
        // Days since the Unix epoch.
        ParquetSdkField::Date(d) => TypedValue::Int(*d),
        ParquetSdkField::TimestampMillis(ts) => TypedValue::Long(*ts),
        ParquetSdkField::TimestampMicros(ts) => TypedValue::Long(*ts),
        ParquetSdkField::Group(group) => TypedValue::Struct(convert_row(group)),
        ParquetSdkField::ListInternal(list) => {
            TypedValue::Array(list.elements().iter().map(convert_field).collect())
        }
        ParquetSdkField::MapInternal(map) => TypedValue::Map(
            map.entries().iter().map(|(k, v)| (convert_field(k), convert_field(v))).collect(),
        ),
        other => TypedValue::String(other.to_string()),
    }
}
