//! tidyfile - scan, deduplicate and reorganize directory trees.
//!
//! Usage:
//!   tidyfile scan [PATH]                      Quick scan summary
//!   tidyfile duplicates [PATH]                Find duplicate files
//!   tidyfile organize [PATH] -o DIR           Sort files into folders
//!   tidyfile report [PATH]                    Full analysis report
//!   tidyfile export [PATH]                    Export scan to JSON
//!   tidyfile --help                           Show help

mod config;
mod logging;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::debug;

use tidyfile_analyze::{
    AnalysisReport, DuplicateFinder, DuplicateReport, HashAlgorithm, format_age, summarize,
};
use tidyfile_ops::{
    ActionStatus, DuplicatePolicy, ExecutionReport, OrganizationPlan, PlanExecutor, Planner,
    RuleKind, TransferMode,
};
use tidyfile_scan::{ScanIndex, Scanner};

use crate::config::{ScanOverrides, Settings};

#[derive(Parser)]
#[command(
    name = "tidyfile",
    version,
    about = "Scan, deduplicate and reorganize directory trees",
    long_about = "tidyfile indexes a directory tree, classifies files by type, \
                  finds byte-identical duplicates and sorts files into a \
                  tidy folder layout.\n\n\
                  Nothing is moved unless you run `tidyfile organize` without \
                  `--dry-run`."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML config file with [scan], [duplicates] and [organize] tables
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory name or glob pattern to skip (repeatable)
    #[arg(long = "exclude-dir", global = true, value_name = "PATTERN")]
    exclude_dirs: Vec<String>,

    /// Only index files with this extension (repeatable)
    #[arg(long = "ext", global = true, value_name = "EXT")]
    extensions: Vec<String>,

    /// Follow symbolic links
    #[arg(long, global = true)]
    follow_symlinks: bool,

    /// Maximum traversal depth (1 = files directly under PATH)
    #[arg(long, global = true)]
    max_depth: Option<u32>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Quick scan and show summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Find duplicate files
    Duplicates {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long)]
        min_size: Option<String>,

        /// Maximum number of duplicate groups to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Digest used to compare contents (sha256, blake3)
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Sort files into a folder layout
    Organize {
        /// Path to organize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Destination root for the organized tree
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,

        /// Leave redundant duplicates where they are
        #[arg(long)]
        keepers_only: bool,

        /// Folder layout (type, extension, month)
        #[arg(short, long)]
        rule: Option<RuleKind>,

        /// Print the plan without touching any file
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Full analysis report with categories and ages
    Report {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include a duplicate summary (reads file contents)
        #[arg(short = 'd', long)]
        find_duplicates: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the scan index to JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fill in content hashes of duplicate files
        #[arg(long)]
        with_hashes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logger(cli.global.verbose);

    let mut settings = Settings::load(cli.global.config.as_deref())?;
    settings.scan.apply(&ScanOverrides {
        exclude_dirs: cli.global.exclude_dirs.clone(),
        extensions: cli.global.extensions.clone(),
        follow_symlinks: cli.global.follow_symlinks,
        max_depth: cli.global.max_depth,
    });
    debug!(?settings, "effective settings");

    match cli.command {
        Command::Scan { path, format } => run_scan(&settings, &path, format),
        Command::Duplicates {
            path,
            min_size,
            top,
            algorithm,
            format,
        } => run_duplicates(&settings, &path, min_size.as_deref(), top, algorithm, format),
        Command::Organize {
            path,
            output_dir,
            copy,
            keepers_only,
            rule,
            dry_run,
            format,
        } => {
            let mut options = settings.organize.clone();
            if copy {
                options.transfer_mode = TransferMode::Copy;
            }
            if keepers_only {
                options.duplicate_policy = DuplicatePolicy::KeepersOnly;
            }
            if let Some(rule) = rule {
                options.rule = rule;
            }
            settings.organize = options;
            run_organize(&settings, &path, &output_dir, dry_run, format)
        }
        Command::Report {
            path,
            find_duplicates,
            format,
        } => run_report(&settings, &path, find_duplicates, format),
        Command::Export {
            path,
            output,
            with_hashes,
        } => run_export(&settings, &path, output, with_hashes),
    }
}

/// Scan `path` with the effective settings, reporting skipped paths on stderr.
fn scan(settings: &Settings, path: &Path) -> Result<ScanIndex> {
    let config = settings.scan.to_config(path)?;

    eprintln!("Scanning {}...", path.display());
    let index = Scanner::new().scan(&config).context("Scan failed")?;

    if index.has_warnings() {
        eprintln!(
            "warning: {} path(s) skipped during scan",
            index.skipped_paths().len()
        );
        for skipped in index.skipped_paths().iter().take(10) {
            eprintln!("  {}: {}", skipped.path.display(), skipped.message);
        }
        if index.skipped_paths().len() > 10 {
            eprintln!("  ... and {} more", index.skipped_paths().len() - 10);
        }
    }

    Ok(index)
}

fn find_duplicates(settings: &Settings, index: &ScanIndex) -> DuplicateReport {
    eprintln!("Finding duplicates...");
    let report = DuplicateFinder::with_config(settings.duplicates.clone()).find_duplicates(index);
    warn_hash_errors(&report);
    report
}

fn warn_hash_errors(report: &DuplicateReport) {
    if report.hash_errors.is_empty() {
        return;
    }
    eprintln!(
        "warning: {} file(s) could not be read for hashing",
        report.hash_errors.len()
    );
    for failure in report.hash_errors.iter().take(10) {
        eprintln!("  {}: {}", failure.path.display(), failure.message);
    }
}

/// Run a quick scan summary.
fn run_scan(settings: &Settings, path: &Path, format: OutputFormat) -> Result<()> {
    let index = scan(settings, path)?;
    let report = summarize(&index, None);

    match format {
        OutputFormat::Text => {
            print_header(&report, &index);
            print_categories(&report);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Run duplicate detection.
fn run_duplicates(
    settings: &Settings,
    path: &Path,
    min_size: Option<&str>,
    top_n: Option<usize>,
    algorithm: Option<HashAlgorithm>,
    format: OutputFormat,
) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(min_size) = min_size {
        settings.duplicates.min_size = parse_size(min_size)?;
    }
    if let Some(top_n) = top_n {
        settings.duplicates.max_groups = top_n;
    }
    if let Some(algorithm) = algorithm {
        settings.duplicates.algorithm = algorithm;
    }

    let index = scan(&settings, path)?;
    let report = find_duplicates(&settings, &index);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report ({})", report.algorithm);
            println!("{}", "─".repeat(70));
            println!();

            if report.groups.is_empty() {
                println!(" No duplicate files found.");
            } else {
                println!(
                    " Found {} duplicate groups ({} files)",
                    report.group_count, report.files_with_duplicates
                );
                println!(
                    " Total wasted space: {}",
                    format_size(report.total_wasted_space)
                );
                println!();

                for (i, group) in report.groups.iter().enumerate() {
                    println!(
                        " Group {} ({} files, {} each, {} wasted)",
                        i + 1,
                        group.count(),
                        format_size(group.size_bytes),
                        format_size(group.wasted_bytes)
                    );
                    for member in &group.members {
                        let marker = if *member == group.keeper { "*" } else { " " };
                        println!("  {marker} {}", member.display());
                    }
                    println!();
                }
                println!(" (* = keeper)");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Plan and optionally execute an organization run.
fn run_organize(
    settings: &Settings,
    path: &Path,
    output_dir: &Path,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let options = &settings.organize;
    let index = scan(settings, path)?;

    let duplicates = match options.duplicate_policy {
        DuplicatePolicy::KeepersOnly => Some(find_duplicates(settings, &index)),
        DuplicatePolicy::KeepAll => None,
    };

    let rule = options.layout_rule();
    let plan = Planner::with_mode(options.transfer_mode)
        .plan(
            &index,
            output_dir,
            rule.as_ref(),
            options.duplicate_policy,
            duplicates.as_ref(),
        )
        .context("Planning failed")?;

    if dry_run {
        match format {
            OutputFormat::Text => print_plan(&plan),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        }
        return Ok(());
    }

    if plan.is_noop() {
        eprintln!("Nothing to do: every file is already in place.");
    } else {
        eprintln!(
            "Organizing {} files ({}) into {}...",
            plan.actionable(),
            format_size(plan.bytes_to_transfer()),
            plan.destination_root.display()
        );
    }

    let report = PlanExecutor::new()
        .execute(&plan)
        .context("Organization failed")?;

    match format {
        OutputFormat::Text => print_execution(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.is_success() {
        eprintln!("warning: {} action(s) failed", report.failed);
    }

    Ok(())
}

/// Run the full analysis report.
fn run_report(
    settings: &Settings,
    path: &Path,
    with_duplicates: bool,
    format: OutputFormat,
) -> Result<()> {
    let index = scan(settings, path)?;
    let duplicates = with_duplicates.then(|| find_duplicates(settings, &index));
    let report = summarize(&index, duplicates.as_ref());

    match format {
        OutputFormat::Text => {
            print_header(&report, &index);
            print_categories(&report);

            println!(" Age Distribution:");
            let max_size = report
                .age_buckets
                .iter()
                .map(|b| b.total_size)
                .max()
                .unwrap_or(0)
                .max(1);
            for bucket in &report.age_buckets {
                println!(
                    "   {:<12} {:>10} {:>8} files  {}",
                    bucket.name,
                    format_size(bucket.total_size),
                    bucket.file_count,
                    make_bar(bucket.total_size as f64 / max_size as f64, 30)
                );
            }
            println!("   Average age: {}", format_age(report.average_age));
            println!();

            if let Some(largest) = &report.largest_file {
                println!(
                    " Largest: {} ({})",
                    largest.path.display(),
                    format_size(largest.size_bytes)
                );
            }
            if let Some(oldest) = &report.oldest_file {
                println!(
                    " Oldest:  {} ({})",
                    oldest.path.display(),
                    oldest.modified_at.format("%Y-%m-%d")
                );
            }
            if let Some(newest) = &report.newest_file {
                println!(
                    " Newest:  {} ({})",
                    newest.path.display(),
                    newest.modified_at.format("%Y-%m-%d")
                );
            }

            if let Some(dups) = &report.duplicates {
                println!();
                println!(
                    " Duplicates: {} groups, {} redundant files, {} wasted",
                    dups.group_count,
                    dups.redundant_files,
                    format_size(dups.wasted_bytes)
                );
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Export the scan index to JSON.
fn run_export(
    settings: &Settings,
    path: &Path,
    output: Option<PathBuf>,
    with_hashes: bool,
) -> Result<()> {
    let mut index = scan(settings, path)?;
    if with_hashes {
        index = find_duplicates(settings, &index).annotate(&index);
    }

    let json = serde_json::to_string_pretty(&index)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn print_header(report: &AnalysisReport, index: &ScanIndex) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        report.root_path.display(),
        format_size(report.total_size)
    );
    println!(" {} files", report.total_files);
    println!(" Scanned in {:.2}s", index.scan_duration().as_secs_f64());
    if !report.complete {
        println!(" (partial: scan was cancelled)");
    }
    if report.skipped_count > 0 {
        println!(" {} path(s) skipped", report.skipped_count);
    }
    println!("{}", "─".repeat(60));
    println!();
}

fn print_categories(report: &AnalysisReport) {
    println!(" By type:");
    let total = report.total_size.max(1);
    for stats in &report.categories {
        println!(
            "   {:<10} {:>10} {:>8} files  {}",
            stats.category.as_str(),
            format_size(stats.total_size),
            stats.file_count,
            make_bar(stats.total_size as f64 / total as f64, 30)
        );
    }
    println!();
}

fn print_plan(plan: &OrganizationPlan) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Plan for {}", plan.destination_root.display());
    println!(
        " {} to transfer ({}), {} skipped, {} duplicates left in place",
        plan.actionable(),
        format_size(plan.bytes_to_transfer()),
        plan.skipped(),
        plan.excluded_duplicates.len()
    );
    println!("{}", "─".repeat(70));

    for action in &plan.actions {
        match &action.reason {
            Some(reason) => println!(
                " {:<13} {} ({reason})",
                action.action_kind.to_string(),
                action.source_path.display()
            ),
            None => println!(
                " {:<13} {} -> {}",
                action.action_kind.to_string(),
                action.source_path.display(),
                action.destination_path.display()
            ),
        }
    }
    println!();
}

fn print_execution(report: &ExecutionReport) {
    println!();
    println!(
        " {} ({} transferred)",
        report.summary(),
        format_size(report.bytes_transferred)
    );
    for outcome in &report.outcomes {
        if let ActionStatus::Failed(reason) = &outcome.status {
            println!("   failed: {}: {reason}", outcome.source_path.display());
        }
    }
    println!();
}

/// Create a simple bar visualization.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(digits_end);

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit {other:?}"),
    };
    let num: f64 = num
        .parse()
        .wrap_err_with(|| format!("Invalid size {s:?}"))?;

    Ok((num * multiplier as f64) as u64)
}
