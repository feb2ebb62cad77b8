use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::verify::coords::Coordinates;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{coordinates} not found in any repository (searched {searched:?})")]
    NotFound {
        coordinates: String,
        searched: Vec<PathBuf>,
    },

    #[error("failed to fetch {coordinates} from {path}: {source}")]
    Fetch {
        coordinates: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The reference would come from the tree being verified.
    #[error("reference {path} is not isolated from the verified tree {root}")]
    NotIsolated { path: PathBuf, root: PathBuf },
}

/// Obtains the trusted reference copy of an artifact.
///
/// Implementations must place anything they fetch under `scratch_dir` and
/// return the path of the fetched file. Retry policy belongs to the
/// implementation.
pub trait ArtifactResolver {
    fn resolve(&self, coords: &Coordinates, scratch_dir: &Path) -> Result<PathBuf, ResolutionError>;
}

/// Resolves artifacts from local directories in standard repository layout.
///
/// Roots are searched in order; the first hit is copied into the scratch
/// directory under its repository path.
#[derive(Debug, Clone)]
pub struct RepositoryResolver {
    roots: Vec<PathBuf>,
}

impl RepositoryResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Like [`new`](Self::new), but rejects any root that overlaps
    /// `verified_root` in either direction.
    pub fn isolated_from(roots: Vec<PathBuf>, verified_root: &Path) -> Result<Self, ResolutionError> {
        let verified = normalize(verified_root);
        for root in &roots {
            let candidate = normalize(root);
            if candidate.starts_with(&verified) || verified.starts_with(&candidate) {
                return Err(ResolutionError::NotIsolated {
                    path: root.clone(),
                    root: verified_root.to_path_buf(),
                });
            }
        }
        Ok(Self::new(roots))
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ArtifactResolver for RepositoryResolver {
    fn resolve(&self, coords: &Coordinates, scratch_dir: &Path) -> Result<PathBuf, ResolutionError> {
        let relative = coords.repository_path();
        let fetch_error = |path: &Path, source| ResolutionError::Fetch {
            coordinates: coords.to_string(),
            path: path.to_path_buf(),
            source,
        };

        let mut searched = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let candidate = root.join(&relative);
            if !candidate.is_file() {
                searched.push(candidate);
                continue;
            }

            let target = scratch_dir.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| fetch_error(parent, e))?;
            }
            fs::copy(&candidate, &target).map_err(|e| fetch_error(candidate.as_path(), e))?;

            debug!(%coords, from = %candidate.display(), to = %target.display(), "resolved reference artifact");
            return Ok(target);
        }

        Err(ResolutionError::NotFound {
            coordinates: coords.to_string(),
            searched,
        })
    }
}

/// Canonical form when the path exists, the path as given otherwise.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
