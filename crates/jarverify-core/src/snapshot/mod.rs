//! Structural snapshots of classes and archives.
//!
//! A snapshot is built once from a decoded class tree and only read
//! afterwards.

pub mod archive;
pub mod build;
pub mod model;

pub use archive::{build_archive_snapshot, snapshot_archive_bytes};
pub use build::build_class_snapshot;
pub use model::{ArchiveSnapshot, ClassSnapshot, FieldSnapshot, MethodSnapshot};
