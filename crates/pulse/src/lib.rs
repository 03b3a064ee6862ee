//! Pulse command-line reader.
//!
//! Streams the records of a Parquet file as JSON lines and commits the
//! cursor as it goes, so an interrupted run picks up where it stopped.

pub mod config;
pub mod error;
pub mod reader;

pub use config::Settings;
pub use error::PulseError;
pub use reader::{read_file, ReadOptions, ReadSummary};
