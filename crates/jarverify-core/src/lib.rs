pub mod classfile;
pub mod diff;
pub mod error;
pub mod report;
pub mod snapshot;
pub mod verify;

pub use error::VerifyError;
pub use verify::{compare_archives, verify_tree};

pub const TOOL_NAME: &str = "jarverify";

/// JSON schema version of verification reports.
/// Bump only when the report shape changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";
