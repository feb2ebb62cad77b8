//! Verification orchestrator and its collaborators.

pub mod config;
pub mod coords;
pub mod orchestrator;
pub mod resolver;

pub use config::VerifyConfig;
pub use coords::{Coordinates, path_to_coordinates};
pub use orchestrator::{compare_archives, compare_snapshots, verify_tree};
pub use resolver::{ArtifactResolver, RepositoryResolver, ResolutionError};
