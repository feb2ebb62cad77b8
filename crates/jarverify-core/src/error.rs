use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classfile::ClassFormatError;
use crate::verify::coords::CoordinateDerivationError;
use crate::verify::resolver::ResolutionError;

/// Failure while verifying one archive.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed class {entry}: {source}")]
    MalformedClass {
        /// `archive!/entry` of the class that failed to decode.
        entry: String,
        #[source]
        source: ClassFormatError,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    CoordinateDerivation(#[from] CoordinateDerivationError),
}

impl VerifyError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Stable identifier carried into reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io_error",
            Self::MalformedClass { .. } => "malformed_class",
            Self::Resolution(_) => "resolution_error",
            Self::CoordinateDerivation(_) => "coordinate_derivation_error",
        }
    }
}
