//! Common crate
//!
//! Shared types and error handling for Pulse file readers: the resumable
//! cursor, file metadata and the structured records iterators emit.
//!
//! # Example
//! ```rust
//! use pulse_common::FileObjectOffset;
//! let offset = FileObjectOffset::initial().advance_row();
//! assert_eq!(offset.rows(), 1);
//! ```

pub mod error;
pub mod meta;
pub mod offset;
pub mod record;

pub use error::{Error, Result};
pub use meta::FileObjectMeta;
pub use offset::FileObjectOffset;
pub use record::{FileRecord, TypedStruct, TypedValue};
