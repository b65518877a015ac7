use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use similar::TextDiff;
use tracing::warn;
use uibind_diff::extract_history_entries;
use uibind_sdk::{CommitOutcome, Generator, PendingGeneration};
use uibind_store::{BackupRotator, FileHandoffStore, HandoffStore};
use uibind_types::{
    DescriptorSupplier, Document, FieldDescriptor, GeneratorConfig, Marker, MarkerStyle,
    NodeNameSupplier, TagTable,
};

use crate::cli::*;

const DEFAULT_CONFIG: &str = "uibind.toml";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Generate(args) => cmd_generate(args, config, json),
        Command::Diff(args) => cmd_diff(args, config, json),
        Command::History(args) => cmd_history(args, &config, json),
        Command::Backups(args) => cmd_backups(args, config, json),
        Command::Consume(_) => cmd_consume(&config, json),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GeneratorConfig> {
    let config = match path {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => GeneratorConfig::load(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("loading config {DEFAULT_CONFIG}"))?,
        None => GeneratorConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn load_descriptors(source: &SourceArgs) -> anyhow::Result<Vec<FieldDescriptor>> {
    if let Some(path) = &source.nodes {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading nodes {}", path.display()))?;
        let report = NodeNameSupplier::from_lines(&text, TagTable::default()).supply();
        for error in &report.errors {
            eprintln!("  {} {}", "skipped:".yellow(), error);
        }
        return Ok(report.descriptors);
    }
    if let Some(path) = &source.descriptors {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading descriptors {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("parsing descriptors {}", path.display()));
    }
    anyhow::bail!("one of --nodes or --descriptors is required")
}

fn cmd_generate(args: GenerateArgs, config: GeneratorConfig, json: bool) -> anyhow::Result<()> {
    let descriptors = load_descriptors(&args.source)?;
    let generator = Generator::with_file_handoff(config, Path::new("."))?;
    let pending = generator.begin(&args.target, &descriptors)?;

    // In JSON mode stdout carries exactly one document; the prompt and
    // status lines go to stderr.
    let mut report = json.then(|| summary(&pending));
    let diff = args
        .diff
        .then(|| unified_diff(pending.original().unwrap_or(""), &pending.preview(), &args.target));
    match &mut report {
        Some(report) => {
            if let Some(diff) = diff {
                report["unified_diff"] = diff.into();
            }
        }
        None => {
            print_review(&pending, &generator.config().markers);
            if let Some(diff) = diff {
                print!("{diff}");
            }
        }
    }
    let status = Status { json };

    if args.dry_run {
        pending.discard();
        status.line(format!("{} Dry run, nothing written.", "•".cyan()));
        return finish(report, "dry_run", None);
    }
    if !pending.has_changes() {
        pending.discard();
        status.line(format!("{} {} is up to date.", "✓".green(), args.target.display()));
        return finish(report, "up_to_date", None);
    }
    let question = format!("Commit changes to {}?", args.target.display());
    if !args.yes && !confirm(&question, &mut status.writer(), &mut io::stdin().lock())? {
        pending.discard();
        status.line(format!("{} Discarded.", "✗".yellow()));
        return finish(report, "discarded", None);
    }

    let outcome = pending.commit()?;
    status.line(format!(
        "{} Wrote {} ({} fields handed off)",
        "✓".green().bold(),
        outcome.target.display().to_string().bold(),
        outcome.published
    ));
    if let Some(backup) = &outcome.backup {
        status.line(format!("  Backup: {}", backup.path.display().to_string().dimmed()));
    }
    if let Some(e) = &outcome.handoff_error {
        eprintln!("{} hand-off not published: {e}", "warning:".yellow().bold());
    }
    finish(report, "committed", Some(&outcome))
}

/// Human-readable progress lines: stdout normally, stderr under `--format json`.
struct Status {
    json: bool,
}

impl Status {
    fn writer(&self) -> Box<dyn Write> {
        if self.json {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }

    fn line(&self, text: String) {
        // A closed pipe is not worth failing a finished run over.
        let _ = writeln!(self.writer(), "{text}");
    }
}

/// Print the JSON report, if any, with the run's outcome filled in.
fn finish(
    report: Option<serde_json::Value>,
    result: &str,
    outcome: Option<&CommitOutcome>,
) -> anyhow::Result<()> {
    if let Some(report) = report {
        println!("{}", serde_json::to_string_pretty(&with_result(report, result, outcome))?);
    }
    Ok(())
}

fn with_result(
    mut report: serde_json::Value,
    result: &str,
    outcome: Option<&CommitOutcome>,
) -> serde_json::Value {
    report["result"] = result.into();
    if let Some(outcome) = outcome {
        report["published"] = outcome.published.into();
        report["handoff_error"] = outcome
            .handoff_error
            .as_ref()
            .map(|e| e.to_string())
            .into();
    }
    report
}

fn summary(pending: &PendingGeneration<'_>) -> serde_json::Value {
    serde_json::json!({
        "target": pending.target(),
        "incremental": pending.is_incremental(),
        "diff": pending.diff(),
        "report": pending.report(),
        "type_drift": pending.drift(),
        "backup": pending.backup(),
    })
}

fn print_review(pending: &PendingGeneration<'_>, style: &MarkerStyle) {
    let mode = if pending.is_incremental() { "update" } else { "new file" };
    println!("{} {} ({mode})", "Reviewing".bold(), pending.target().display());
    for drift in pending.drift() {
        println!(
            "  {} {} is {} here but {} in the file; bindings kept",
            "!".yellow().bold(),
            drift.name.bold(),
            drift.current,
            drift.declared
        );
    }
    println!();
    for line in pending.annotated().lines() {
        let rendered = line.render(style);
        match line.marker() {
            Some(Marker::Added) => println!("{}", rendered.green()),
            Some(Marker::Removed) => println!("{}", rendered.yellow()),
            None => println!("{rendered}"),
        }
    }
    println!();
    let report = pending.report();
    println!(
        "  {} added lines, {} removed lines",
        report.added_lines.to_string().green(),
        report.removed_lines.to_string().yellow()
    );
    for kind in &report.missing_anchors {
        warn!(?kind, "anchor missing; those additions were dropped");
    }
}

fn unified_diff(old: &str, new: &str, target: &Path) -> String {
    let name = target.display().to_string();
    let diff = TextDiff::from_lines(old, new);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

fn confirm(prompt: &str, out: &mut dyn Write, input: &mut dyn BufRead) -> anyhow::Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn cmd_diff(args: DiffArgs, config: GeneratorConfig, json: bool) -> anyhow::Result<()> {
    let descriptors = load_descriptors(&args.source)?;
    let generator = Generator::with_file_handoff(config, Path::new("."))?;
    let diff = generator.preview_diff(&args.target, &descriptors)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }
    if diff.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for field in &diff.added {
        println!("  {} {} ({})", "+".green().bold(), field.name.green(), field.field_type);
    }
    for name in &diff.removed {
        println!("  {} {}", "-".yellow().bold(), name.yellow());
    }
    Ok(())
}

fn cmd_history(args: HistoryArgs, config: &GeneratorConfig, json: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let entries = extract_history_entries(&Document::parse(&text, &config.markers));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No recorded fields.");
    }
    for entry in &entries {
        println!("  {:>5}  {} {}", entry.line + 1, entry.field_type.cyan(), entry.name.bold());
    }
    Ok(())
}

fn cmd_backups(args: BackupsArgs, config: GeneratorConfig, json: bool) -> anyhow::Result<()> {
    let rotator = BackupRotator::new(config.backup);
    let records = rotator.list(&args.target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No backups in {}.", rotator.backup_dir(&args.target).display());
    }
    for record in &records {
        println!("  {}  {}", record.timestamp.yellow(), record.path.display());
    }
    Ok(())
}

fn cmd_consume(config: &GeneratorConfig, json: bool) -> anyhow::Result<()> {
    let store = FileHandoffStore::from_config(&config.handoff, Path::new("."));
    let entry = store.consume_entry()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }
    match entry {
        Some(entry) => {
            let class_name = entry.class_name.as_deref().unwrap_or("unknown class");
            println!(
                "{} Consumed {} descriptors for {}",
                "✓".green().bold(),
                entry.descriptors.len(),
                class_name.bold()
            );
            for d in &entry.descriptors {
                println!("  {} {} (source {})", d.field_type.cyan(), d.name.bold(), d.source_id);
            }
        }
        None => println!("No pending hand-off under {:?}.", store.key()),
    }
    Ok(())
}
