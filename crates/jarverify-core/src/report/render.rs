use crate::TOOL_NAME;
use crate::diff::FieldDifference;
use crate::report::model::{ArchiveVerdict, MemberDiffReport, VerificationReport};

pub fn render_text(report: &VerificationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    out.push_str(&format!("Root: {}\n", report.root));
    out.push_str(&format!(
        "Archives: {} total, {} passed, {} failed, {} errored\n",
        report.summary.total, report.summary.passed, report.summary.failed, report.summary.errored
    ));

    for verdict in &report.archives {
        render_verdict(&mut out, verdict);
    }
    out
}

fn render_verdict(out: &mut String, verdict: &ArchiveVerdict) {
    out.push_str(&format!("\n[{}] {}\n", verdict.status, verdict.path));
    if let Some(coords) = &verdict.coordinates {
        out.push_str(&format!("  coordinates: {coords}\n"));
    }
    if let Some(reference) = &verdict.reference {
        out.push_str(&format!("  reference sha256: {}\n", reference.hash.value));
    }
    if let Some(produced) = &verdict.produced {
        out.push_str(&format!("  produced sha256:  {}\n", produced.hash.value));
    }
    for w in &verdict.warnings {
        out.push_str(&format!("  warning: {w}\n"));
    }
    if let Some(err) = &verdict.error {
        out.push_str(&format!("  error ({}, during {}): {}\n", err.kind, err.stage, err.message));
    }

    let Some(diff) = &verdict.diff else {
        return;
    };
    out.push_str(&format!("  classes: {} shared\n", diff.shared.len()));
    for name in &diff.deleted {
        out.push_str(&format!("  - {name}\n"));
    }
    for name in &diff.added {
        out.push_str(&format!("  + {name}\n"));
    }
    for change in &diff.changed {
        out.push_str(&format!("  ~ {}\n", change.class));
        render_differences(out, "      ", &change.differences);
        render_members(out, "field", &change.fields);
        render_members(out, "method", &change.methods);
    }
}

fn render_members(out: &mut String, label: &str, members: &MemberDiffReport) {
    for name in &members.deleted {
        out.push_str(&format!("    - {label} {name}\n"));
    }
    for name in &members.added {
        out.push_str(&format!("    + {label} {name}\n"));
    }
    for (name, diffs) in &members.changed {
        out.push_str(&format!("    ~ {label} {name}\n"));
        render_differences(out, "        ", diffs);
    }
}

fn render_differences(out: &mut String, indent: &str, diffs: &[FieldDifference]) {
    for d in diffs {
        out.push_str(&format!("{indent}{}: {} -> {}\n", d.field, d.left, d.right));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::*;
    use serde_json::json;

    #[test]
    fn renders_changes_and_errors() {
        let mut failing = ArchiveVerdict::new("g/a/1.0/a-1.0.jar");
        failing.status = VerdictStatus::Fail;
        failing.diff = Some(ArchiveDiffReport {
            shared: vec!["a/A".into()],
            added: vec!["a/C".into()],
            deleted: vec!["a/B".into()],
            changed: vec![ClassChange {
                class: "a/A".into(),
                differences: vec![],
                fields: MemberDiffReport {
                    added: vec!["extra".into()],
                    ..Default::default()
                },
                methods: MemberDiffReport {
                    changed: [(
                        "run()V".to_string(),
                        vec![FieldDifference {
                            field: "access".into(),
                            left: json!(1),
                            right: json!(2),
                        }],
                    )]
                    .into_iter()
                    .collect(),
                    ..Default::default()
                },
            }],
        });

        let mut broken = ArchiveVerdict::new("g/b/1.0/b-1.0.jar");
        broken.error = Some(ErrorInfo {
            kind: "resolution_error".into(),
            stage: "resolve".into(),
            message: "not found".into(),
        });

        let report = VerificationReport::new(
            ToolInfo {
                name: "jarverify".into(),
                version: "0.1.0".into(),
                commit: None,
            },
            "/deploy",
            vec![failing, broken],
        );
        let text = render_text(&report);

        assert!(text.starts_with("jarverify 0.1.0\n"));
        assert!(text.contains("2 total, 0 passed, 1 failed, 1 errored"));
        assert!(text.contains("[FAIL] g/a/1.0/a-1.0.jar"));
        assert!(text.contains("  - a/B\n"));
        assert!(text.contains("  + a/C\n"));
        assert!(text.contains("    + field extra\n"));
        assert!(text.contains("        access: 1 -> 2\n"));
        assert!(text.contains("error (resolution_error, during resolve): not found"));
    }
}
