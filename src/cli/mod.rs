use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hunkscope",
    about = "Inspect unified diffs: highlights, hunk patches, staging overlap, gutter markers and risk flags"
)]
pub struct Cli {
    /// Config file (defaults to ./hunkscope.toml when present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print per-file hunk and line counts.
    Summary(SummaryArgs),
    /// Print every hunk line with inline highlights bracketed.
    Show(DiffInput),
    /// Print a standalone patch for a single hunk.
    Patch(PatchArgs),
    /// List worktree hunks already covered by the staged diff.
    Staged(StagedArgs),
    /// Print gutter markers for one file.
    Gutter(FileArgs),
    /// Show the change region around a new-file line.
    Region(RegionArgs),
    /// Scan hunks for risky changes.
    Risk(RiskArgs),
    /// Print the diff an untracked file would produce.
    NewFile(NewFileArgs),
}

#[derive(Args, Debug)]
pub struct DiffInput {
    /// Diff file to read, or "-" for stdin.
    #[arg(default_value = "-")]
    pub diff: PathBuf,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: DiffInput,

    /// Output of `git diff --numstat` for the same range.
    #[arg(long)]
    pub numstat: Option<PathBuf>,

    /// Output of `git diff --name-status` for the same range.
    #[arg(long)]
    pub name_status: Option<PathBuf>,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    #[command(flatten)]
    pub input: DiffInput,

    /// File to inspect (its new path).
    #[arg(short, long)]
    pub file: String,
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    #[command(flatten)]
    pub target: FileArgs,

    /// Hunk id, or its zero-based index within the file.
    #[arg(long)]
    pub hunk: String,
}

#[derive(Args, Debug)]
pub struct StagedArgs {
    /// Full working-tree diff (`git diff HEAD`).
    pub worktree: PathBuf,
    /// Staged diff against the same base (`git diff --cached`).
    pub index: PathBuf,
}

#[derive(Args, Debug)]
pub struct RegionArgs {
    #[command(flatten)]
    pub target: FileArgs,

    /// New-file line number.
    #[arg(short, long)]
    pub line: u32,
}

#[derive(Args, Debug)]
pub struct RiskArgs {
    #[command(flatten)]
    pub input: DiffInput,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NewFileArgs {
    /// Untracked file to render as an addition-only diff.
    pub path: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
