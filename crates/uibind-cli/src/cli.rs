use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "uibind",
    about = "Incremental UI binding script generator",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Generator configuration (TOML). Defaults to ./uibind.toml if present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate or update a panel file and commit after review
    Generate(GenerateArgs),
    /// Show which fields a run would add and remove
    Diff(DiffArgs),
    /// List the fields recorded in an existing panel file
    History(HistoryArgs),
    /// List backups of a panel file
    Backups(BackupsArgs),
    /// Take the pending descriptor hand-off entry
    Consume(ConsumeArgs),
}

/// Where the current descriptors come from.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Node names, one `[Tag]FieldName` per line
    #[arg(long)]
    pub nodes: Option<PathBuf>,
    /// JSON array of `{"name", "type", "source_id"}` descriptors
    #[arg(long)]
    pub descriptors: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    pub target: PathBuf,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Commit without asking
    #[arg(short, long)]
    pub yes: bool,
    /// Show the review and discard
    #[arg(long)]
    pub dry_run: bool,
    /// Also print a unified diff of the file
    #[arg(long)]
    pub diff: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub target: PathBuf,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct BackupsArgs {
    pub target: PathBuf,
}

#[derive(Args)]
pub struct ConsumeArgs {}
