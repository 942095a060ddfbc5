//! dupsweep - find files with identical content.
//!
//! Usage:
//!   dupsweep [PATH]              Scan PATH and list duplicate groups
//!   dupsweep scan [PATH]         Same, with scan options
//!   dupsweep clean [PATH]        Move extra copies into quarantine
//!   dupsweep info FILE           Show size and timestamps of a file
//!   dupsweep --help              Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tracing_subscriber::EnvFilter;

use dupsweep_analyze::{ScanCoordinator, ScanEvent, ScanOutcome, ScanPhase, start_scan};
use dupsweep_core::{ScanConfig, file_info, format_size};
use dupsweep_ops::{QUARANTINE_DIR_NAME, Quarantine, QuarantineEvent, start_quarantine};

/// How many warnings or failed moves to list before summarizing the rest.
const MAX_LISTED_FAILURES: usize = 5;

#[derive(Parser)]
#[command(
    name = "dupsweep",
    version,
    about = "Find duplicate files by content",
    long_about = "dupsweep groups files by size, then hashes only the files that share a \
                  size to find exact duplicates.\n\n\
                  Run `dupsweep [PATH]` for a report, or `dupsweep clean [PATH] --yes` \
                  to move every copy but the first into a quarantine directory."
)]
struct Cli {
    /// Path to scan (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and report duplicate groups
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move every duplicate except the first of each group into quarantine
    Clean {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: ScanArgs,

        /// Actually move files (without this, only list what would move)
        #[arg(short, long)]
        yes: bool,

        /// Quarantine directory (defaults to PATH/Deleted_Duplicates)
        #[arg(short, long)]
        quarantine_dir: Option<PathBuf>,
    },

    /// Show size and timestamps of a file
    Info {
        /// File to describe
        path: PathBuf,
    },
}

/// Options shared by every command that scans.
#[derive(Args, Default)]
struct ScanArgs {
    /// Load scan options from a JSON file (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of hashing threads (0 = one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Hash size buckets one at a time
    #[arg(long)]
    sequential: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Maximum directory depth
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Skip entries whose name matches this glob (repeatable)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Minimum file size to consider (e.g., "1KB", "1MB")
    #[arg(short, long)]
    min_size: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Scan {
            path,
            options,
            format,
        }) => {
            run_scan(&path, &options, format).await?;
        }
        Some(Command::Clean {
            path,
            options,
            yes,
            quarantine_dir,
        }) => {
            run_clean(&path, &options, yes, quarantine_dir).await?;
        }
        Some(Command::Info { path }) => {
            run_info(&path)?;
        }
        None => {
            run_scan(&cli.path, &ScanArgs::default(), OutputFormat::Text).await?;
        }
    }

    Ok(())
}

/// Route library logs to stderr, honoring `RUST_LOG` when set.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build the scan configuration from an optional JSON file and CLI flags.
fn build_config(args: &ScanArgs, extra_ignores: &[String]) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(file) => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read config {}", file.display()))?;
            serde_json::from_str::<ScanConfig>(&text)
                .with_context(|| format!("Invalid config {}", file.display()))?
        }
        None => ScanConfig::default(),
    };

    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.sequential {
        config.parallel = false;
    }
    if args.follow_symlinks {
        config.follow_symlinks = true;
    }
    if args.no_hidden {
        config.include_hidden = false;
    }
    if args.max_depth.is_some() {
        config.max_depth = args.max_depth;
    }
    if let Some(min_size) = &args.min_size {
        config.min_size = parse_size(min_size)?;
    }
    config.ignore_patterns.extend(args.ignore.iter().cloned());
    for pattern in extra_ignores {
        if !config.ignore_patterns.contains(pattern) {
            config.ignore_patterns.push(pattern.clone());
        }
    }

    config.validate().context("Invalid scan options")?;
    Ok(config)
}

/// Run a scan in the background, cancelling it on Ctrl+C.
async fn scan_tree(path: &Path, config: ScanConfig) -> Result<ScanOutcome> {
    let path = path.canonicalize().context("Invalid path")?;

    eprintln!("Scanning {}...", path.display());

    let coordinator = ScanCoordinator::new(config);
    let cancel = coordinator.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            cancel.cancel();
        }
    });

    let mut rx = start_scan(path, coordinator);
    let mut phase = ScanPhase::Idle;
    let mut outcome = None;

    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Progress(progress) => {
                if progress.phase == ScanPhase::Resolving && phase != ScanPhase::Resolving {
                    eprintln!(
                        "Hashing {} size group(s) after seeing {} files...",
                        progress.buckets_total, progress.files_seen
                    );
                }
                tracing::trace!(
                    phase = %progress.phase,
                    files_seen = progress.files_seen,
                    files_hashed = progress.files_hashed,
                    "progress"
                );
                phase = progress.phase;
            }
            ScanEvent::Complete(result) => {
                outcome = Some(result.context("Scan failed")?);
                break;
            }
        }
    }

    ctrl_c.abort();
    outcome.ok_or_else(|| eyre!("Scan ended without a result"))
}

/// Scan and print duplicate groups.
async fn run_scan(path: &Path, options: &ScanArgs, format: OutputFormat) -> Result<()> {
    let config = build_config(options, &[QUARANTINE_DIR_NAME.to_string()])?;
    let outcome = scan_tree(path, config).await?;

    match format {
        OutputFormat::Text => print_report(&outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    Ok(())
}

fn print_report(outcome: &ScanOutcome) {
    let duplicates = &outcome.duplicates;
    let stats = &outcome.stats;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate File Report - {}", outcome.root.display());
    println!("{}", "─".repeat(70));
    println!();

    if duplicates.is_empty() {
        println!(" No duplicate files found.");
    } else {
        println!(
            " Found {} duplicate groups ({} files)",
            duplicates.len(),
            duplicates.file_count()
        );
        println!(
            " Total wasted space: {}",
            format_size(duplicates.wasted_bytes())
        );
        println!();

        for (i, group) in duplicates.groups().enumerate() {
            println!(
                " Group {} ({} files, {} each, {} wasted)",
                i + 1,
                group.count(),
                format_size(group.size),
                format_size(group.wasted_bytes())
            );
            for (j, path) in group.paths.iter().enumerate() {
                let marker = if j == 0 { "keep" } else { "dup " };
                let modified = file_info(path)
                    .map(|info| info.modified.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("   [{marker}] {modified}  {}", path.display());
            }
            println!();
        }
    }

    println!("{}", "─".repeat(70));
    println!(" Total files found:      {}", stats.total_files);
    println!(" Files scanned:          {}", stats.scanned_files);
    println!(" Duplicate groups found: {}", duplicates.len());
    println!(" Time taken:             {:.2}s", stats.elapsed.as_secs_f64());

    if !outcome.warnings.is_empty() {
        println!();
        println!(" {} warning(s) during scan", outcome.warnings.len());
        for warning in outcome.warnings.iter().take(MAX_LISTED_FAILURES) {
            println!("   {}: {}", warning.path.display(), warning.message);
        }
        if let Some(more) = unlisted_count(outcome.warnings.len()) {
            println!("   ... and {more} more");
        }
    }
}

/// Scan, then move every duplicate but the first of each group aside.
async fn run_clean(
    path: &Path,
    options: &ScanArgs,
    yes: bool,
    quarantine_dir: Option<PathBuf>,
) -> Result<()> {
    let mut ignores = vec![QUARANTINE_DIR_NAME.to_string()];
    if let Some(name) = quarantine_dir.as_deref().and_then(Path::file_name) {
        ignores.push(name.to_string_lossy().into_owned());
    }

    let config = build_config(options, &ignores)?;
    let outcome = scan_tree(path, config).await?;

    let candidates = outcome.duplicates.removal_candidates();
    if candidates.is_empty() {
        println!("No duplicate files found.");
        return Ok(());
    }

    let quarantine = match quarantine_dir {
        Some(dir) => Quarantine::new(dir),
        None => Quarantine::for_root(&outcome.root),
    };

    if !yes {
        println!(
            "Would move {} file(s) ({}) to {}:",
            candidates.len(),
            format_size(outcome.duplicates.wasted_bytes()),
            quarantine.dir().display()
        );
        for candidate in &candidates {
            println!("   {}", candidate.display());
        }
        println!();
        println!("Re-run with --yes to move them.");
        return Ok(());
    }

    let mut rx = start_quarantine(candidates, quarantine.clone());
    let mut summary = None;
    while let Some(event) = rx.recv().await {
        match event {
            QuarantineEvent::Progress {
                completed,
                total,
                current,
            } => {
                tracing::debug!(completed, total, path = %current.display(), "moved");
            }
            QuarantineEvent::Complete(result) => summary = Some(result),
        }
    }

    let Some(summary) = summary else {
        bail!("Quarantine ended without a result");
    };

    println!(
        "Moved {} file(s) to {}",
        summary.moved_count(),
        quarantine.dir().display()
    );

    if summary.has_errors() {
        println!();
        println!("Errors occurred:");
        for failure in summary.errors.iter().take(MAX_LISTED_FAILURES) {
            println!("   {}: {}", failure.path.display(), failure.message);
        }
        if let Some(more) = unlisted_count(summary.errors.len()) {
            println!("   ... and {more} more");
        }
    }

    Ok(())
}

/// Number of problems left out of a capped listing, if any.
fn unlisted_count(total: usize) -> Option<usize> {
    (total > MAX_LISTED_FAILURES).then(|| total - MAX_LISTED_FAILURES)
}

/// Print display metadata for one file.
fn run_info(path: &Path) -> Result<()> {
    let info = file_info(path).ok_or_else(|| eyre!("Cannot read {}", path.display()))?;

    println!("{}", path.display());
    println!("  Size:     {} ({} bytes)", info.size_readable, info.size);
    println!(
        "  Modified: {}",
        info.modified.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(created) = info.created {
        println!("  Created:  {}", created.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit: {other}"),
    };

    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;
    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("10XB").is_err());
        assert!(parse_size("abc").is_err());
    }

    #[test]
    fn test_unlisted_count() {
        assert_eq!(unlisted_count(0), None);
        assert_eq!(unlisted_count(MAX_LISTED_FAILURES), None);
        assert_eq!(unlisted_count(MAX_LISTED_FAILURES + 3), Some(3));
    }

    #[test]
    fn test_build_config_flags_override_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("config.json");
        std::fs::write(&file, r#"{"min_size": 10, "threads": 2, "ignore_patterns": ["*.tmp"]}"#)
            .unwrap();

        let args = ScanArgs {
            config: Some(file),
            threads: Some(4),
            sequential: true,
            ignore: vec!["target".to_string()],
            ..ScanArgs::default()
        };
        let config = build_config(&args, &[QUARANTINE_DIR_NAME.to_string()]).unwrap();

        assert_eq!(config.min_size, 10);
        assert_eq!(config.threads, 4);
        assert!(!config.parallel);
        assert!(config.include_hidden);
        assert_eq!(
            config.ignore_patterns,
            vec!["*.tmp", "target", QUARANTINE_DIR_NAME]
        );
    }

    #[test]
    fn test_build_config_rejects_bad_glob() {
        let args = ScanArgs {
            ignore: vec!["[".to_string()],
            ..ScanArgs::default()
        };
        assert!(build_config(&args, &[]).is_err());
    }
}
