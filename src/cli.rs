//! Command-line interface module for nexus-sorter.
//!
//! This module handles argument parsing, merges flags with the settings file,
//! and drives one organizing run with console output.

use crate::category_table::CategoryTable;
use crate::config::Settings;
use crate::directory_map::DirectoryMapper;
use crate::organizer::{OrganizeEngine, OrganizeOptions, RunReport};
use crate::output::{OutputFormatter, ProgressReporter};
use crate::path_planner::BucketOptions;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Sort a directory's files into category folders.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "nexus-sorter", version, about)]
pub struct Args {
    /// Directory to organize.
    pub directory: PathBuf,

    /// Category definition file (JSON or TOML). Falls back to built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub categories: Option<PathBuf>,

    /// Write the active category table to this file before organizing.
    #[arg(long, value_name = "PATH")]
    pub save_categories: Option<PathBuf>,

    /// Add a YYYY-MM folder under each category.
    #[arg(long)]
    pub by_date: bool,

    /// Add a small/medium/large folder under each category.
    #[arg(long)]
    pub by_size: bool,

    /// Skip files last modified more than DAYS days ago.
    #[arg(long, value_name = "DAYS")]
    pub max_age: Option<String>,

    /// Settings file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show what would happen without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Don't print the directory tree before and after.
    #[arg(long)]
    pub no_tree: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses an age limit in days.
///
/// Anything that is not a finite, non-negative number disables the age
/// filter with a warning instead of aborting the run.
///
/// # Arguments
///
/// * `raw` - The value given to `--max-age`
///
/// # Example
///
/// ```
/// use nexus_sorter::cli::parse_age_limit;
///
/// assert_eq!(parse_age_limit("7.5"), Some(7.5));
/// assert_eq!(parse_age_limit("0"), Some(0.0));
/// ```
pub fn parse_age_limit(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(days) if days.is_finite() && days >= 0.0 => Some(days),
        _ => {
            tracing::warn!(value = raw, "Invalid age limit");
            OutputFormatter::warning(&format!(
                "Invalid age limit '{}', age filter disabled",
                raw
            ));
            None
        }
    }
}

/// Combines flags with loaded settings. Flags win.
///
/// Bucketing flags can only switch bucketing on, so a settings file can make
/// it the default. An explicit `--max-age` replaces the settings value even
/// when it is invalid and therefore disables the filter.
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `settings` - Settings loaded with [`Settings::load`]
pub fn resolve_options(args: &Args, settings: &Settings) -> OrganizeOptions {
    let max_age_days = match &args.max_age {
        Some(raw) => parse_age_limit(raw),
        None => settings
            .organize
            .max_age_days
            .filter(|days| days.is_finite() && *days >= 0.0),
    };

    OrganizeOptions {
        buckets: BucketOptions {
            by_size: args.by_size || settings.organize.by_size,
            by_date: args.by_date || settings.organize.by_date,
        },
        max_age_days,
        dry_run: args.dry_run,
    }
}

/// Runs the CLI application.
///
/// Setup failures (unreadable settings, missing target directory, invalid
/// filters) are returned as `Err` before anything is written. Per-file
/// problems are reported in the returned [`RunReport`].
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `cancel` - Set to stop the run between files
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use nexus_sorter::cli::{Args, run_cli};
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicBool;
///
/// let args = Args::parse_from(["nexus-sorter", "/path/to/directory", "--by-date"]);
/// match run_cli(&args, Arc::new(AtomicBool::new(false))) {
///     Ok(report) => println!("Moved {} files", report.stats.moved),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args, cancel: Arc<AtomicBool>) -> Result<RunReport, String> {
    let settings = Settings::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = settings
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let options = resolve_options(args, &settings);

    let categories = args
        .categories
        .as_deref()
        .or(settings.organize.categories.as_deref());
    let table = CategoryTable::load_or_default(categories);

    let engine = OrganizeEngine::new(&args.directory, table, options)
        .map_err(|e| e.to_string())?
        .with_filters(filters)
        .with_cancel_flag(cancel);
    let root = engine.root().to_path_buf();

    if let Some(path) = &args.save_categories {
        match engine.table().save(path) {
            Ok(()) => OutputFormatter::success(&format!(
                "Saved categories to {}",
                path.display()
            )),
            Err(e) => OutputFormatter::warning(&format!("Could not save categories: {}", e)),
        }
    }

    OutputFormatter::info(&format!("🚀 Organizing {}", root.display()));
    if options.dry_run {
        OutputFormatter::dry_run_notice("No files will be moved.");
    }

    let mapper = DirectoryMapper::new();
    if !args.no_tree {
        OutputFormatter::tree("📂 Initial structure", &mapper.map(&root));
    }

    let report = {
        let mut reporter = ProgressReporter::new(&root);
        let report = engine.run_with_observer(&mut reporter);
        reporter.finish();
        report
    };

    if !args.no_tree && !options.dry_run {
        OutputFormatter::tree("📂 Final structure", &mapper.map(&root));
    }

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &RunReport) {
    OutputFormatter::header("📈 Organization summary");
    OutputFormatter::run_stats(&report.stats);

    let counts = report.category_counts();
    if !counts.is_empty() {
        OutputFormatter::summary_table(&counts, report.stats.moved);
    }

    if report.interrupted {
        OutputFormatter::warning("Interrupted. Remaining files were left untouched.");
    } else if report.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_age_limit_accepts_numbers() {
        assert_eq!(parse_age_limit("30"), Some(30.0));
        assert_eq!(parse_age_limit(" 7.5 "), Some(7.5));
        assert_eq!(parse_age_limit("0"), Some(0.0));
    }

    #[test]
    fn test_parse_age_limit_rejects_garbage() {
        assert_eq!(parse_age_limit("abc"), None);
        assert_eq!(parse_age_limit(""), None);
        assert_eq!(parse_age_limit("-3"), None);
        assert_eq!(parse_age_limit("NaN"), None);
        assert_eq!(parse_age_limit("inf"), None);
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::parse_from([
            "nexus-sorter",
            "/tmp/inbox",
            "--by-date",
            "--max-age",
            "14",
            "--dry-run",
        ]);
        assert_eq!(args.directory, PathBuf::from("/tmp/inbox"));
        assert!(args.by_date);
        assert!(!args.by_size);
        assert_eq!(args.max_age.as_deref(), Some("14"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.organize.by_size = true;
        settings.organize.max_age_days = Some(90.0);

        let args = Args::parse_from(["nexus-sorter", "/tmp", "--max-age", "10"]);
        let options = resolve_options(&args, &settings);
        assert!(options.buckets.by_size);
        assert!(!options.buckets.by_date);
        assert_eq!(options.max_age_days, Some(10.0));

        let args = Args::parse_from(["nexus-sorter", "/tmp"]);
        assert_eq!(resolve_options(&args, &settings).max_age_days, Some(90.0));
    }

    #[test]
    fn test_invalid_max_age_disables_filter() {
        let mut settings = Settings::default();
        settings.organize.max_age_days = Some(90.0);
        let args = Args::parse_from(["nexus-sorter", "/tmp", "--max-age", "soon"]);
        assert_eq!(resolve_options(&args, &settings).max_age_days, None);
    }

    #[test]
    fn test_run_cli_missing_directory_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope");
        let save_to = temp_dir.path().join("saved.json");
        let config = temp_dir.path().join("settings.toml");
        fs::write(&config, "").expect("Failed to write config");

        let args = Args {
            directory: missing.clone(),
            save_categories: Some(save_to.clone()),
            config: Some(config),
            no_tree: true,
            ..Args::default()
        };
        let result = run_cli(&args, Arc::new(AtomicBool::new(false)));

        assert!(result.is_err());
        assert!(!missing.exists());
        assert!(!save_to.exists());
    }

    #[test]
    fn test_run_cli_organizes_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("inbox");
        fs::create_dir(&root).expect("Failed to create dir");
        fs::write(root.join("photo.png"), "png bytes").expect("Failed to write file");
        let config = temp_dir.path().join("settings.toml");
        fs::write(&config, "").expect("Failed to write config");

        let args = Args {
            directory: root.clone(),
            config: Some(config),
            no_tree: true,
            ..Args::default()
        };
        let report = run_cli(&args, Arc::new(AtomicBool::new(false))).expect("run succeeds");

        assert_eq!(report.stats.moved, 1);
        assert!(root.join("Images").join("photo.png").exists());
    }
}
