//! Storage layer for tips and results.
//!
//! `RecordStore` owns the writable state directory. Everything else in this
//! module is the plumbing it is built from: the directory lock, atomic file
//! replacement and the snapshot codecs.

pub mod atomic;
pub mod csv;
pub mod lock;
pub mod snapshot;
pub mod store;

// Re-export key types
pub use self::csv::{CSV_HEADERS, CsvCodec, RESULTS_HEADERS};
pub use snapshot::{Snapshot, SnapshotFormat};
pub use store::{RecordStore, StoreOptions};
