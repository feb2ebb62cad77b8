use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "jarverify",
    version,
    about = "Structural verification of rebuilt JVM archives against published references"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity to debug (logs go to stderr)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify every archive in a deployment tree against its reference
    Verify(VerifyArgs),

    /// Compare two archives directly; LEFT is the reference
    Diff(DiffArgs),
}

#[derive(Debug, ClapArgs)]
pub struct VerifyArgs {
    /// Root of the deployment tree, in repository layout
    #[arg(long)]
    pub deploy_path: PathBuf,

    /// Repository root to resolve references from (repeatable, searched in order)
    #[arg(long = "repository", required = true)]
    pub repositories: Vec<PathBuf>,

    /// Archive file extensions to verify (repeatable)
    #[arg(long = "extension", default_value = "jar")]
    pub extensions: Vec<String>,

    #[command(flatten)]
    pub compare: CompareArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, ClapArgs)]
pub struct DiffArgs {
    /// Reference archive
    pub left: PathBuf,

    /// Produced archive
    pub right: PathBuf,

    #[command(flatten)]
    pub compare: CompareArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, ClapArgs)]
pub struct CompareArgs {
    /// Retain instruction shapes of method bodies
    #[arg(long)]
    pub include_code: bool,

    /// Retain debug attributes (source file, local variables)
    #[arg(long)]
    pub include_debug: bool,

    /// Never report added classes or members
    #[arg(long)]
    pub legacy_added_detection: bool,
}

#[derive(Debug, ClapArgs)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Optional git commit hash for tool metadata
    #[arg(long)]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
