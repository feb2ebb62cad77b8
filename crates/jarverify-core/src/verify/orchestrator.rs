use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::VerifyError;
use crate::classfile::read::{ArtifactContext, read_artifact};
use crate::diff::{DiffOptions, DiffResult, diff};
use crate::report::model::{
    ArchiveDiffReport, ArchiveVerdict, ClassChange, ErrorInfo, MemberDiffReport, VerdictStatus,
    ToolInfo, VerificationReport,
};
use crate::snapshot::model::ArchiveSnapshot;
use crate::snapshot::snapshot_archive_bytes;
use crate::verify::config::VerifyConfig;
use crate::verify::coords::path_to_coordinates;
use crate::verify::resolver::{ArtifactResolver, ResolutionError, normalize};

const SCRATCH_PREFIX: &str = "jarverify-reference-";

/// Per-archive pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    BuildReference,
    BuildProduced,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::BuildReference => "build_reference",
            Stage::BuildProduced => "build_produced",
        }
    }
}

/// Verify every archive under `root` against its resolved reference.
///
/// The walk never stops on a failing archive. Per-archive errors become
/// `ERROR` verdicts; only an unwalkable root or an unusable scratch
/// directory fail the whole run.
pub fn verify_tree(
    root: &Path,
    resolver: &dyn ArtifactResolver,
    config: &VerifyConfig,
    tool: ToolInfo,
) -> Result<VerificationReport, VerifyError> {
    info!(root = %root.display(), "verifying archive tree");

    // Collected up front so nothing fetched during the run is ever walked.
    let archives = find_archives(root, config)?;

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| VerifyError::io(std::env::temp_dir(), e))?;
    debug!(scratch = %scratch.path().display(), "created reference scratch directory");

    let verified_root = normalize(root);
    let mut verdicts = Vec::with_capacity(archives.len());
    for path in &archives {
        verdicts.push(verify_archive(root, &verified_root, path, scratch.path(), resolver, config));
    }

    let report = VerificationReport::new(tool, root.display().to_string(), verdicts);
    info!(
        total = report.summary.total,
        passed = report.summary.passed,
        failed = report.summary.failed,
        errored = report.summary.errored,
        "verification finished"
    );
    Ok(report)
}

/// Compare two archives directly, without coordinates or resolution.
///
/// `left` is treated as the reference. The report holds one verdict for
/// `right`.
pub fn compare_archives(
    left: &Path,
    right: &Path,
    config: &VerifyConfig,
    tool: ToolInfo,
) -> VerificationReport {
    let mut verdict = ArchiveVerdict::new(right.display().to_string());

    let outcome = (|| -> Result<(), (Stage, VerifyError)> {
        let reference = read_artifact(left).map_err(|e| (Stage::BuildReference, e))?;
        verdict.reference = Some(reference.artifact_info());
        let produced = read_artifact(right).map_err(|e| (Stage::BuildProduced, e))?;
        verdict.produced = Some(produced.artifact_info());
        compare_contexts(&reference, &produced, config, &mut verdict)
    })();

    finish(&mut verdict, outcome);
    VerificationReport::new(tool, right.display().to_string(), vec![verdict])
}

/// All regular files under `root` with an archive extension, in a stable
/// order.
pub fn find_archives(root: &Path, config: &VerifyConfig) -> Result<Vec<PathBuf>, VerifyError> {
    let mut archives = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            VerifyError::io(path, std::io::Error::from(e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if config.is_archive(&entry.file_name().to_string_lossy()) {
            archives.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), count = archives.len(), "found archives");
    Ok(archives)
}

fn verify_archive(
    root: &Path,
    verified_root: &Path,
    path: &Path,
    scratch_dir: &Path,
    resolver: &dyn ArtifactResolver,
    config: &VerifyConfig,
) -> ArchiveVerdict {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut verdict = ArchiveVerdict::new(relative.display().to_string());

    let outcome = (|| -> Result<(), (Stage, VerifyError)> {
        let coords = path_to_coordinates(relative).map_err(|e| (Stage::Resolve, VerifyError::from(e)))?;
        verdict.coordinates = Some(coords.to_string());

        let reference_path = resolver
            .resolve(&coords, scratch_dir)
            .map_err(|e| (Stage::Resolve, VerifyError::from(e)))?;
        if normalize(&reference_path).starts_with(verified_root) {
            let err = ResolutionError::NotIsolated {
                path: reference_path,
                root: verified_root.to_path_buf(),
            };
            return Err((Stage::Resolve, VerifyError::from(err)));
        }
        debug!(archive = %relative.display(), %coords, reference = %reference_path.display(), "reference resolved");

        let reference = read_artifact(&reference_path).map_err(|e| (Stage::BuildReference, e))?;
        verdict.reference = Some(reference.artifact_info());
        let produced = read_artifact(path).map_err(|e| (Stage::BuildProduced, e))?;
        verdict.produced = Some(produced.artifact_info());

        compare_contexts(&reference, &produced, config, &mut verdict)
    })();

    finish(&mut verdict, outcome);
    verdict
}

/// Snapshot both sides and diff them into `verdict`.
fn compare_contexts(
    reference: &ArtifactContext,
    produced: &ArtifactContext,
    config: &VerifyConfig,
    verdict: &mut ArchiveVerdict,
) -> Result<(), (Stage, VerifyError)> {
    let left = snapshot_archive_bytes(Path::new(&reference.path), &reference.bytes, &config.decode)
        .map_err(|e| (Stage::BuildReference, e))?;
    let right = snapshot_archive_bytes(Path::new(&produced.path), &produced.bytes, &config.decode)
        .map_err(|e| (Stage::BuildProduced, e))?;

    verdict
        .warnings
        .extend(left.warnings.iter().map(|w| format!("reference: {w}")));
    verdict
        .warnings
        .extend(right.warnings.iter().map(|w| format!("produced: {w}")));

    let report = compare_snapshots(&left, &right, &config.diff);
    verdict.status = if report.has_divergence() {
        VerdictStatus::Fail
    } else {
        VerdictStatus::Pass
    };
    verdict.diff = Some(report);
    Ok(())
}

fn finish(verdict: &mut ArchiveVerdict, outcome: Result<(), (Stage, VerifyError)>) {
    match outcome {
        Ok(()) => info!(archive = %verdict.path, status = %verdict.status, "archive verified"),
        Err((stage, err)) => {
            warn!(archive = %verdict.path, stage = stage.as_str(), error = %err, "archive could not be verified");
            verdict.status = VerdictStatus::Error;
            verdict.error = Some(ErrorInfo {
                kind: err.kind().to_string(),
                stage: stage.as_str().to_string(),
                message: err.to_string(),
            });
        }
    }
}

/// Diff two archive snapshots top-down: classes, then for every shared
/// class its fields and methods.
pub fn compare_snapshots(
    left: &ArchiveSnapshot,
    right: &ArchiveSnapshot,
    options: &DiffOptions,
) -> ArchiveDiffReport {
    let classes = diff(&left.classes, &right.classes, options);
    log_key_changes("class", &left.source, &classes.added, &classes.deleted);

    let mut changed = Vec::new();
    for (name, differences) in &classes.reports {
        let (Some(l), Some(r)) = (left.classes.get(name), right.classes.get(name)) else {
            continue;
        };

        let fields = member_report(diff(&l.fields, &r.fields, options));
        let methods = member_report(diff(&l.methods, &r.methods, options));
        log_key_changes("field", name, &fields.added, &fields.deleted);
        log_key_changes("method", name, &methods.added, &methods.deleted);
        debug!(
            class = %name,
            attributes = differences.len(),
            fields = fields.changed.len(),
            methods = methods.changed.len(),
            "class compared"
        );

        if !differences.is_empty() || fields.has_divergence() || methods.has_divergence() {
            changed.push(ClassChange {
                class: name.clone(),
                differences: differences.clone(),
                fields,
                methods,
            });
        }
    }

    ArchiveDiffReport {
        shared: classes.shared,
        added: classes.added,
        deleted: classes.deleted,
        changed,
    }
}

fn member_report(result: DiffResult<String>) -> MemberDiffReport {
    MemberDiffReport {
        changed: result
            .reports
            .into_iter()
            .filter(|(_, diffs)| !diffs.is_empty())
            .collect(),
        added: result.added,
        deleted: result.deleted,
    }
}

fn log_key_changes(what: &str, scope: &str, added: &[String], deleted: &[String]) {
    if !added.is_empty() {
        warn!(scope, count = added.len(), "added {what}s: {added:?}");
    }
    if !deleted.is_empty() {
        warn!(scope, count = deleted.len(), "deleted {what}s: {deleted:?}");
    }
}
