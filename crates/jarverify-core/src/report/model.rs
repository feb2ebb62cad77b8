use indexmap::IndexMap;
use serde::Serialize;

use crate::SCHEMA_VERSION;
use crate::diff::FieldDifference;

/// Top-level verification report.
///
/// This is the stable JSON contract; identical inputs produce identical
/// reports apart from the artifact paths of resolved references.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    /// The verified tree, or the produced archive for a direct comparison.
    pub root: String,
    pub summary: Summary,
    pub archives: Vec<ArchiveVerdict>,
    pub exit_code: i32,
}

impl VerificationReport {
    /// Assemble a report; the summary and exit code are derived from the
    /// verdicts.
    pub fn new(tool: ToolInfo, root: impl Into<String>, archives: Vec<ArchiveVerdict>) -> Self {
        let summary = Summary::from_verdicts(&archives);
        let exit_code = summary.exit_code();

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            root: root.into(),
            summary,
            archives,
            exit_code,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub commit: Option<String>,
}

/// Artifact metadata bound to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub path: Option<String>,
    pub size_bytes: u64,
    pub hash: ArtifactHash,
}

/// Cryptographic artifact fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[ArchiveVerdict]) -> Self {
        let count = |status| verdicts.iter().filter(|v| v.status == status).count();

        Self {
            total: verdicts.len(),
            passed: count(VerdictStatus::Pass),
            failed: count(VerdictStatus::Fail),
            errored: count(VerdictStatus::Error),
        }
    }

    /// `2` if any archive errored, else `1` if any diverged, else `0`.
    pub fn exit_code(&self) -> i32 {
        if self.errored > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Error,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VerdictStatus::Pass => "PASS",
            VerdictStatus::Fail => "FAIL",
            VerdictStatus::Error => "ERROR",
        })
    }
}

/// Outcome for one produced archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveVerdict {
    /// Path relative to the verified tree.
    pub path: String,
    pub coordinates: Option<String>,
    pub status: VerdictStatus,
    pub reference: Option<ArtifactInfo>,
    pub produced: Option<ArtifactInfo>,
    pub warnings: Vec<String>,
    pub error: Option<ErrorInfo>,
    pub diff: Option<ArchiveDiffReport>,
}

impl ArchiveVerdict {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            coordinates: None,
            status: VerdictStatus::Error,
            reference: None,
            produced: None,
            warnings: vec![],
            error: None,
            diff: None,
        }
    }
}

/// Why an archive could not be verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Stable error kind, e.g. `resolution_error`.
    pub kind: String,
    /// Stage that failed.
    pub stage: String,
    pub message: String,
}

/// Class-level comparison of reference (left) and produced (right).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveDiffReport {
    pub shared: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    /// Shared classes with at least one difference, in reference order.
    pub changed: Vec<ClassChange>,
}

impl ArchiveDiffReport {
    pub fn has_divergence(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || !self.changed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassChange {
    pub class: String,
    /// Class-level attribute differences.
    pub differences: Vec<FieldDifference>,
    pub fields: MemberDiffReport,
    pub methods: MemberDiffReport,
}

/// Member-level comparison within one shared class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberDiffReport {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    /// Changed members only, keyed by member key.
    pub changed: IndexMap<String, Vec<FieldDifference>>,
}

impl MemberDiffReport {
    pub fn has_divergence(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || !self.changed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(status: VerdictStatus) -> ArchiveVerdict {
        ArchiveVerdict {
            status,
            ..ArchiveVerdict::new("g/a/1/a-1.jar")
        }
    }

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "jarverify".into(),
            version: "0.1.0".into(),
            commit: None,
        }
    }

    #[test]
    fn errors_dominate_failures_in_exit_code() {
        let report = VerificationReport::new(
            tool(),
            "/deploy",
            vec![
                verdict(VerdictStatus::Pass),
                verdict(VerdictStatus::Fail),
                verdict(VerdictStatus::Error),
            ],
        );

        assert_eq!(
            report.summary,
            Summary {
                total: 3,
                passed: 1,
                failed: 1,
                errored: 1
            }
        );
        assert_eq!(report.exit_code, 2);
    }

    #[test]
    fn exit_codes_by_outcome() {
        let code = |statuses: &[VerdictStatus]| {
            VerificationReport::new(tool(), "/d", statuses.iter().copied().map(verdict).collect())
                .exit_code
        };

        assert_eq!(code(&[]), 0);
        assert_eq!(code(&[VerdictStatus::Pass, VerdictStatus::Pass]), 0);
        assert_eq!(code(&[VerdictStatus::Pass, VerdictStatus::Fail]), 1);
    }

    #[test]
    fn status_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&VerdictStatus::Fail).unwrap(),
            "\"FAIL\""
        );
        assert_eq!(VerdictStatus::Error.to_string(), "ERROR");
    }

    #[test]
    fn empty_diff_report_has_no_divergence() {
        let mut report = ArchiveDiffReport::default();
        assert!(!report.has_divergence());

        report.deleted.push("a/B".into());
        assert!(report.has_divergence());
    }
}
