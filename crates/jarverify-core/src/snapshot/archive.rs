use std::io::{self, Cursor, Read};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::VerifyError;
use crate::classfile::{DecodeOptions, parse_class};
use crate::snapshot::build::build_class_snapshot;
use crate::snapshot::model::ArchiveSnapshot;

const CLASS_SUFFIX: &str = ".class";

/// Marker the JVM uses when spinning lambda-form classes.
const LAMBDA_MARKER: &str = "$$Lambda";

/// Read an archive from disk and snapshot every class entry.
pub fn build_archive_snapshot(
    path: &Path,
    options: &DecodeOptions,
) -> Result<ArchiveSnapshot, VerifyError> {
    let bytes = std::fs::read(path).map_err(|source| VerifyError::io(path, source))?;
    snapshot_archive_bytes(path, &bytes, options)
}

/// Snapshot an in-memory archive. `source` names it in errors and in the
/// resulting snapshot.
///
/// Entries are visited in archive order. Directories and entries without a
/// `.class` suffix are skipped. A class whose name carries the lambda-form
/// marker is kept and flagged. When two entries decode to the same class
/// name, the later one replaces the earlier in place and a warning is
/// recorded.
pub fn snapshot_archive_bytes(
    source: &Path,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<ArchiveSnapshot, VerifyError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| zip_error(source, e))?;

    let mut classes = IndexMap::new();
    let mut warnings = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| zip_error(source, e))?;
        if entry.is_dir() || !entry.name().ends_with(CLASS_SUFFIX) {
            continue;
        }

        let entry_name = entry.name().to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| VerifyError::io(source.join(&entry_name), e))?;

        let node = parse_class(&data, options).map_err(|e| VerifyError::MalformedClass {
            entry: format!("{}!/{}", source.display(), entry_name),
            source: e,
        })?;

        if node.name.contains(LAMBDA_MARKER) {
            warn!(archive = %source.display(), class = %node.name, "lambda-form class retained in comparison");
            warnings.push(format!("lambda-form class {} retained in comparison", node.name));
        }

        let snapshot = build_class_snapshot(&node);
        if classes.insert(node.name.clone(), snapshot).is_some() {
            warn!(archive = %source.display(), class = %node.name, entry = %entry_name, "duplicate class entry replaces earlier one");
            warnings.push(format!(
                "duplicate class {} (entry {}) replaces an earlier entry",
                node.name, entry_name
            ));
        }
    }

    debug!(archive = %source.display(), classes = classes.len(), "archive snapshot built");

    Ok(ArchiveSnapshot {
        source: source.display().to_string(),
        classes,
        warnings,
    })
}

fn zip_error(path: &Path, err: zip::result::ZipError) -> VerifyError {
    VerifyError::io(path, io::Error::new(io::ErrorKind::InvalidData, err))
}
