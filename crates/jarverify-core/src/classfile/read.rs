use sha2::{Digest, Sha256};
use std::{fs, path::Path};

use crate::VerifyError;
use crate::report::model::{ArtifactHash, ArtifactInfo};

/// Raw archive bytes plus their fingerprint.
///
/// Holds exactly the bytes that get decoded, so the reported hash always
/// identifies what was compared.
#[derive(Debug, Clone)]
pub struct ArtifactContext {
    /// Source path (informational only).
    pub path: String,

    /// Exact bytes read from disk.
    pub bytes: Vec<u8>,

    pub size_bytes: u64,

    pub hash_alg: String,

    /// Hex-encoded hash of the artifact bytes.
    pub hash_hex: String,
}

impl ArtifactContext {
    /// Fingerprint bytes that did not come from disk.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = Sha256::digest(&bytes);

        Self {
            path: path.into(),
            size_bytes: bytes.len() as u64,
            bytes,
            hash_alg: "sha256".to_string(),
            hash_hex: hex::encode(digest),
        }
    }

    /// Report-facing metadata; the raw bytes are not carried over.
    pub fn artifact_info(&self) -> ArtifactInfo {
        ArtifactInfo {
            path: Some(self.path.clone()),
            size_bytes: self.size_bytes,
            hash: ArtifactHash {
                algorithm: self.hash_alg.clone(),
                value: self.hash_hex.clone(),
            },
        }
    }
}

/// Read an archive and compute its sha256 identity.
///
/// The identity depends only on the file bytes; timestamps and permissions
/// are ignored.
pub fn read_artifact(path: &Path) -> Result<ArtifactContext, VerifyError> {
    let bytes = fs::read(path).map_err(|source| VerifyError::io(path, source))?;
    Ok(ArtifactContext::from_bytes(path.display().to_string(), bytes))
}
