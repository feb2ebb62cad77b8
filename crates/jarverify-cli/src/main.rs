use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jarverify_core::classfile::DecodeOptions;
use jarverify_core::diff::{AddedDetection, DiffOptions};
use jarverify_core::report::model::{ToolInfo, VerificationReport};
use jarverify_core::report::render;
use jarverify_core::verify::{RepositoryResolver, VerifyConfig};
use jarverify_core::{compare_archives, verify_tree};

mod args;

use args::{Command, CompareArgs, OutputArgs, OutputFormat};

const DEFAULT_FILTER: &str = "warn,jarverify_core=info,jarverify_cli=info";
const VERBOSE_FILTER: &str = "warn,jarverify_core=debug,jarverify_cli=debug";

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_logging(args.verbose);

    let (report, output) = match args.command {
        Command::Verify(cmd) => {
            anyhow::ensure!(
                cmd.deploy_path.is_dir(),
                "deploy path {} is not a directory",
                cmd.deploy_path.display()
            );
            let config = VerifyConfig {
                archive_extensions: cmd.extensions,
                ..config(&cmd.compare)
            };
            let resolver = RepositoryResolver::isolated_from(cmd.repositories, &cmd.deploy_path)
                .context("invalid repository configuration")?;

            let report = verify_tree(&cmd.deploy_path, &resolver, &config, tool(&cmd.output))
                .with_context(|| format!("failed to verify {}", cmd.deploy_path.display()))?;
            (report, cmd.output)
        }
        Command::Diff(cmd) => {
            let report = compare_archives(&cmd.left, &cmd.right, &config(&cmd.compare), tool(&cmd.output));
            (report, cmd.output)
        }
    };

    emit(&report, &output)?;
    std::process::exit(report.exit_code);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config(args: &CompareArgs) -> VerifyConfig {
    VerifyConfig {
        decode: DecodeOptions {
            skip_code: !args.include_code,
            skip_debug: !args.include_debug,
        },
        diff: DiffOptions {
            added_detection: if args.legacy_added_detection {
                AddedDetection::LegacyParity
            } else {
                AddedDetection::Enabled
            },
        },
        ..VerifyConfig::default()
    }
}

fn tool(args: &OutputArgs) -> ToolInfo {
    ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: args.commit.clone(),
    }
}

fn emit(report: &VerificationReport, args: &OutputArgs) -> Result<()> {
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => render::render_text(report),
    };

    match &args.out {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => print!("{output}"),
    }
    Ok(())
}
