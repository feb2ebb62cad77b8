use std::cell::RefCell;
use std::path::{Path, PathBuf};

use jarverify_core::diff::{AddedDetection, DiffOptions};
use jarverify_core::report::model::{ToolInfo, VerdictStatus, VerificationReport};
use jarverify_core::verify::coords::Coordinates;
use jarverify_core::verify::{ArtifactResolver, RepositoryResolver, ResolutionError, VerifyConfig};
use jarverify_core::{compare_archives, verify_tree};
use jarverify_testkit::{ClassBuilder, class_jar, jar_bytes};
use tempfile::TempDir;

const LIB: &str = "org/example/lib/1.0/lib-1.0.jar";

fn tool() -> ToolInfo {
    ToolInfo {
        name: "jarverify".into(),
        version: "0.1.0-test".into(),
        commit: None,
    }
}

fn publish(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Verifies `produced` against `reference`, both published under `LIB`.
fn verify_pair(reference: &[ClassBuilder], produced: &[ClassBuilder], config: &VerifyConfig) -> VerificationReport {
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(repo.path(), LIB, &class_jar(reference));
    publish(deploy.path(), LIB, &class_jar(produced));

    let resolver = RepositoryResolver::isolated_from(vec![repo.path().into()], deploy.path()).unwrap();
    verify_tree(deploy.path(), &resolver, config, tool()).expect("tree should be walkable")
}

fn classes(names: &[&str]) -> Vec<ClassBuilder> {
    names.iter().map(|n| ClassBuilder::new(n)).collect()
}

#[test]
fn identical_archives_pass() {
    let lib = vec![
        ClassBuilder::new("a/A").field(0x0002, "x", "I").method(0x0001, "run", "()V"),
        ClassBuilder::new("a/B").interface("java/io/Serializable"),
    ];
    let report = verify_pair(&lib, &lib, &VerifyConfig::default());

    assert_eq!(report.exit_code, 0);
    let verdict = &report.archives[0];
    assert_eq!(verdict.status, VerdictStatus::Pass);
    assert_eq!(verdict.coordinates.as_deref(), Some("org.example:lib:jar:1.0"));
    assert_eq!(
        verdict.reference.as_ref().unwrap().hash,
        verdict.produced.as_ref().unwrap().hash
    );
    assert!(verdict.error.is_none());
}

#[test]
fn class_set_changes_are_reported_both_ways() {
    let report = verify_pair(&classes(&["A", "B"]), &classes(&["A", "C"]), &VerifyConfig::default());

    let verdict = &report.archives[0];
    assert_eq!(verdict.status, VerdictStatus::Fail);
    let diff = verdict.diff.as_ref().unwrap();
    assert_eq!(diff.shared, vec!["A"]);
    assert_eq!(diff.deleted, vec!["B"]);
    assert_eq!(diff.added, vec!["C"]);
    assert_eq!(report.exit_code, 1);
}

#[test]
fn legacy_parity_never_reports_additions() {
    let config = VerifyConfig {
        diff: DiffOptions {
            added_detection: AddedDetection::LegacyParity,
        },
        ..Default::default()
    };
    let report = verify_pair(&classes(&["A", "B"]), &classes(&["A", "C"]), &config);

    let diff = report.archives[0].diff.as_ref().unwrap();
    assert_eq!(diff.deleted, vec!["B"]);
    assert!(diff.added.is_empty());
}

#[test]
fn added_field_is_a_member_level_addition() {
    let reference = vec![ClassBuilder::new("a/A")];
    let produced = vec![ClassBuilder::new("a/A").field(0x0001, "extra", "J")];
    let report = verify_pair(&reference, &produced, &VerifyConfig::default());

    let diff = report.archives[0].diff.as_ref().unwrap();
    assert_eq!(diff.shared, vec!["a/A"]);
    assert!(diff.added.is_empty());
    let change = &diff.changed[0];
    assert!(change.differences.is_empty());
    assert_eq!(change.fields.added, vec!["extra"]);
    assert_eq!(report.archives[0].status, VerdictStatus::Fail);
}

#[test]
fn method_access_change_is_exactly_one_difference() {
    let reference = vec![ClassBuilder::new("a/A").method(0x0001, "run", "()V")];
    let produced = vec![ClassBuilder::new("a/A").method(0x0011, "run", "()V")];
    let report = verify_pair(&reference, &produced, &VerifyConfig::default());

    let change = &report.archives[0].diff.as_ref().unwrap().changed[0];
    assert!(change.differences.is_empty());
    assert!(change.fields.changed.is_empty());
    let diffs = &change.methods.changed["run()V"];
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].field, "access");
    assert_eq!(report.archives[0].status, VerdictStatus::Fail);
}

#[test]
fn missing_reference_is_an_error_verdict() {
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(deploy.path(), LIB, &class_jar(&classes(&["A"])));
    publish(deploy.path(), "org/example/other/2.0/other-2.0.jar", &class_jar(&classes(&["B"])));
    publish(repo.path(), "org/example/other/2.0/other-2.0.jar", &class_jar(&classes(&["B"])));

    let resolver = RepositoryResolver::new(vec![repo.path().into()]);
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.errored, 1);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.exit_code, 2);

    let broken = report.archives.iter().find(|v| v.path == LIB).unwrap();
    let error = broken.error.as_ref().unwrap();
    assert_eq!(error.kind, "resolution_error");
    assert_eq!(error.stage, "resolve");
    assert!(broken.diff.is_none());
}

#[test]
fn malformed_produced_class_is_an_error_verdict() {
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(repo.path(), LIB, &class_jar(&classes(&["A"])));
    publish(deploy.path(), LIB, &jar_bytes(&[("A.class", vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0])]));

    let resolver = RepositoryResolver::new(vec![repo.path().into()]);
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    let verdict = &report.archives[0];
    assert_eq!(verdict.status, VerdictStatus::Error);
    let error = verdict.error.as_ref().unwrap();
    assert_eq!(error.kind, "malformed_class");
    assert_eq!(error.stage, "build_produced");
    assert!(error.message.contains("A.class"));
}

#[test]
fn underivable_path_is_an_error_verdict() {
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(deploy.path(), "stray.jar", &class_jar(&classes(&["A"])));

    let resolver = RepositoryResolver::new(vec![repo.path().into()]);
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    let error = report.archives[0].error.as_ref().unwrap();
    assert_eq!(error.kind, "coordinate_derivation_error");
    assert_eq!(report.archives[0].coordinates, None);
}

/// Hands back a file inside the tree being verified.
struct LeakyResolver {
    target: PathBuf,
    calls: RefCell<usize>,
}

impl ArtifactResolver for LeakyResolver {
    fn resolve(&self, _coords: &Coordinates, _scratch_dir: &Path) -> Result<PathBuf, ResolutionError> {
        *self.calls.borrow_mut() += 1;
        Ok(self.target.clone())
    }
}

#[test]
fn reference_inside_verified_tree_is_rejected() {
    let deploy = TempDir::new().unwrap();
    publish(deploy.path(), LIB, &class_jar(&classes(&["A"])));

    let resolver = LeakyResolver {
        target: deploy.path().join(LIB),
        calls: RefCell::new(0),
    };
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    assert_eq!(*resolver.calls.borrow(), 1);
    let verdict = &report.archives[0];
    assert_eq!(verdict.status, VerdictStatus::Error);
    assert!(verdict.error.as_ref().unwrap().message.contains("not isolated"));
}

#[test]
fn walk_only_visits_archives_in_name_order() {
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    for relative in ["org/z/z/1/z-1.jar", "org/a/a/1/a-1.jar"] {
        publish(deploy.path(), relative, &class_jar(&classes(&["A"])));
        publish(repo.path(), relative, &class_jar(&classes(&["A"])));
    }
    publish(deploy.path(), "org/a/a/1/a-1.pom", b"<project/>");
    publish(deploy.path(), "org/a/a/1/a-1.jar.sha1", b"deadbeef");

    let resolver = RepositoryResolver::new(vec![repo.path().into()]);
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    let paths: Vec<_> = report.archives.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["org/a/a/1/a-1.jar", "org/z/z/1/z-1.jar"]);
    assert_eq!(report.exit_code, 0);
}

#[test]
fn timestamped_snapshot_resolves_by_unique_version() {
    let relative = "org/example/lib/1.0-SNAPSHOT/lib-1.0-20240101.101010-3.jar";
    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(deploy.path(), relative, &class_jar(&classes(&["A"])));
    publish(repo.path(), relative, &class_jar(&classes(&["A"])));

    let resolver = RepositoryResolver::new(vec![repo.path().into()]);
    let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();

    let verdict = &report.archives[0];
    assert_eq!(
        verdict.coordinates.as_deref(),
        Some("org.example:lib:jar:1.0-20240101.101010-3")
    );
    assert_eq!(verdict.status, VerdictStatus::Pass);
}

#[test]
fn lambda_form_classes_raise_warnings() {
    let lib = classes(&["a/A", "a/A$$Lambda$1"]);
    let report = verify_pair(&lib, &lib, &VerifyConfig::default());

    let warnings = &report.archives[0].warnings;
    assert!(warnings.iter().any(|w| w.starts_with("reference: ")));
    assert!(warnings.iter().any(|w| w.starts_with("produced: ")));
    assert_eq!(report.archives[0].status, VerdictStatus::Pass);
}

#[test]
fn reports_are_deterministic() {
    let reference = vec![
        ClassBuilder::new("a/A").method(0x0001, "run", "()V").field(0x0001, "f", "I"),
        ClassBuilder::new("a/B"),
    ];
    let produced = vec![
        ClassBuilder::new("a/A").method(0x0002, "run", "()V"),
        ClassBuilder::new("a/C"),
    ];

    let deploy = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    publish(repo.path(), LIB, &class_jar(&reference));
    publish(deploy.path(), LIB, &class_jar(&produced));
    let resolver = RepositoryResolver::new(vec![repo.path().into()]);

    let run = || {
        let report = verify_tree(deploy.path(), &resolver, &VerifyConfig::default(), tool()).unwrap();
        let mut json = serde_json::to_value(&report).unwrap();
        // The reference is fetched into a fresh scratch directory per run.
        json["archives"][0]["reference"]["path"] = serde_json::Value::Null;
        json
    };

    assert_eq!(run(), run());
}

#[test]
fn compare_archives_reports_one_verdict() {
    let dir = TempDir::new().unwrap();
    let left = dir.path().join("left.jar");
    let right = dir.path().join("right.jar");
    std::fs::write(&left, class_jar(&classes(&["A", "B"]))).unwrap();
    std::fs::write(&right, class_jar(&classes(&["A", "B"]))).unwrap();

    let report = compare_archives(&left, &right, &VerifyConfig::default(), tool());

    assert_eq!(report.archives.len(), 1);
    assert_eq!(report.archives[0].status, VerdictStatus::Pass);
    assert_eq!(report.archives[0].coordinates, None);
    assert_eq!(report.exit_code, 0);
}
