//! Output formatting and styling module.
//!
//! All console output of the CLI goes through here: colored status lines, the
//! progress bar, directory trees and the end-of-run summary.

use crate::directory_map::{DirectoryMap, NodeKind};
use crate::organizer::{Disposition, FileOutcome, RunObserver, RunStats, SkipReason};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nexus_sorter::output::OutputFormatter;
    /// OutputFormatter::success("Directory organized");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nexus_sorter::output::OutputFormatter;
    /// OutputFormatter::error("Directory does not exist: /tmp/missing");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` entries.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of entries the run will report
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nexus_sorter::output::OutputFormatter;
    /// let bar = OutputFormatter::create_progress_bar(42);
    /// bar.inc(1);
    /// bar.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a directory tree under a header, directories in blue and
    /// unreadable ones in red.
    ///
    /// # Arguments
    ///
    /// * `title` - Header printed above the tree
    /// * `map` - Snapshot taken with [`crate::DirectoryMapper`]
    pub fn tree(title: &str, map: &DirectoryMap) {
        Self::header(title);
        for line in map.render() {
            let label = line.label();
            let styled = match line.kind {
                NodeKind::Directory => label.blue().bold(),
                NodeKind::File => label.normal(),
                NodeKind::AccessDenied => label.red(),
            };
            println!("{}{}", line.prefix.dimmed(), styled);
        }
    }

    /// One-line description of a file outcome, with paths shown relative to
    /// `root`.
    ///
    /// # Arguments
    ///
    /// * `outcome` - The outcome reported by the engine
    /// * `root` - The organized directory
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_sorter::organizer::{Disposition, FileOutcome, SkipReason};
    /// use nexus_sorter::output::OutputFormatter;
    /// use std::path::{Path, PathBuf};
    ///
    /// colored::control::set_override(false);
    /// let outcome = FileOutcome {
    ///     source: PathBuf::from("/data/Images/a.jpg"),
    ///     disposition: Disposition::Skipped(SkipReason::AlreadyOrganized),
    /// };
    /// let line = OutputFormatter::describe_outcome(&outcome, Path::new("/data"));
    /// assert!(line.contains("Images/a.jpg"));
    /// ```
    pub fn describe_outcome(outcome: &FileOutcome, root: &Path) -> String {
        let name = outcome
            .source
            .strip_prefix(root)
            .unwrap_or(&outcome.source)
            .display()
            .to_string();

        match &outcome.disposition {
            Disposition::Moved {
                destination,
                category,
            } => {
                let shown = destination.strip_prefix(root).unwrap_or(destination);
                format!("{} {} → {} ({})", "✨".green(), name, shown.display(), category)
                    .green()
                    .to_string()
            }
            Disposition::Skipped(SkipReason::Duplicate { original }) => {
                format!("📑 Duplicate found: {} is identical to {}", name, original)
                    .yellow()
                    .to_string()
            }
            Disposition::Skipped(SkipReason::TooOld { age_days }) => {
                format!("⏰ Skipped {} ({:.1} days old)", name, age_days)
                    .yellow()
                    .to_string()
            }
            Disposition::Skipped(SkipReason::Excluded) => {
                format!("⏭ Excluded {}", name).dimmed().to_string()
            }
            Disposition::Skipped(SkipReason::AlreadyOrganized) => {
                format!("⏭ Already organized {}", name).dimmed().to_string()
            }
            Disposition::Failed(e) => format!("❌ Error processing {}: {}", name, e)
                .red()
                .bold()
                .to_string(),
        }
    }

    /// Prints a table of moved files per category, sorted by name.
    ///
    /// # Arguments
    ///
    /// * `category_counts` - Map of category folder to file count
    /// * `total_files` - Total number of files moved
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            let file_word = if **count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }

    /// Prints the run counters.
    pub fn run_stats(stats: &RunStats) {
        println!("📊 Total files processed: {}", stats.total);
        println!("✅ Files moved: {}", stats.moved.to_string().green());
        println!("⏭️ Files skipped: {}", stats.skipped.to_string().yellow());
        let errors = if stats.errors == 0 {
            stats.errors.to_string().normal()
        } else {
            stats.errors.to_string().red().bold()
        };
        println!("❌ Errors encountered: {}", errors);
    }
}

/// Drives a progress bar and prints one line per file while a run is going.
pub struct ProgressReporter<'a> {
    root: &'a Path,
    bar: Option<ProgressBar>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root, bar: None }
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl RunObserver for ProgressReporter<'_> {
    fn discovered(&mut self, total: usize) {
        let bar = OutputFormatter::create_progress_bar(total as u64);
        bar.set_message("Sorting files...");
        self.bar = Some(bar);
    }

    fn file_processed(&mut self, outcome: &FileOutcome) {
        let line = OutputFormatter::describe_outcome(outcome, self.root);
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                bar.inc(1);
            }
            None => println!("{}", line),
        }
    }

    fn directory_removed(&mut self, path: &Path) {
        let shown = path.strip_prefix(self.root).unwrap_or(path);
        let line = format!("🗑️ Removed empty directory: {}", shown.display())
            .yellow()
            .to_string();
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }
}

impl Drop for ProgressReporter<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
