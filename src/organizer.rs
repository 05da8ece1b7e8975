//! The organize engine: walks a directory, filters and deduplicates files,
//! moves each one into its category folder, then removes directories left
//! empty.
//!
//! Every file gets an explicit [`FileOutcome`]; failures are recorded there
//! and counted, and never stop the run.
use crate::category_table::{CategoryTable, sanitize_label};
use crate::classifier::Classifier;
use crate::config::FileFilter;
use crate::file_record::{FileRecord, exceeds_age_limit};
use crate::hasher::{ContentDigest, ContentHasher};
use crate::path_planner::{BucketOptions, PathPlanner};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use walkdir::WalkDir;

/// How many times a move is re-planned when its destination appears between
/// planning and moving.
const MAX_PLAN_ATTEMPTS: usize = 3;

/// Errors that can occur while organizing.
#[derive(Debug)]
pub enum OrganizeError {
    /// The root directory is missing or not a directory.
    InvalidBasePath {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to create a category or bucket directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Something already exists at the destination.
    DestinationExists(PathBuf),
    /// Could not read a file's metadata.
    MetadataFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// A directory could not be listed during discovery.
    WalkFailed { path: PathBuf, reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists(path) => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::MetadataFailed { path, source } => {
                write!(f, "Failed to read metadata of {}: {}", path.display(), source)
            }
            Self::WalkFailed { path, reason } => {
                write!(f, "Failed to scan {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Counters for one run.
///
/// `total` counts discovered files only. A directory that cannot be listed
/// adds to `errors` without adding to `total`, so `processed()` can exceed
/// `total` by the number of such directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub moved: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunStats {
    fn record(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Moved { .. } => self.moved += 1,
            Disposition::Skipped(_) => self.skipped += 1,
            Disposition::Failed(_) => self.errors += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.moved + self.skipped + self.errors
    }
}

/// Why a file was left where it is.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The file already sits inside a category folder.
    AlreadyOrganized,
    /// A settings filter excludes the file.
    Excluded,
    /// The file is older than the configured age limit.
    TooOld { age_days: f64 },
    /// Same content as a file seen earlier in the run.
    Duplicate { original: String },
}

/// What happened to one file.
#[derive(Debug)]
pub enum Disposition {
    /// Moved (or, in a dry run, would be moved) to `destination`.
    Moved {
        destination: PathBuf,
        category: String,
    },
    Skipped(SkipReason),
    Failed(OrganizeError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub disposition: Disposition,
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub stats: RunStats,
    /// One entry per processed file, in processing order.
    pub outcomes: Vec<FileOutcome>,
    /// Directories removed by the cleanup pass.
    pub removed_dirs: Vec<PathBuf>,
    /// The run was cancelled before every file was processed.
    pub interrupted: bool,
    pub dry_run: bool,
}

impl RunReport {
    /// Number of moved files per category folder.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for outcome in &self.outcomes {
            if let Disposition::Moved { category, .. } = &outcome.disposition {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Receives progress events during a run. All methods default to no-ops.
pub trait RunObserver {
    /// Called once before processing with the number of entries that will be
    /// reported through `file_processed`.
    fn discovered(&mut self, _total: usize) {}
    fn file_processed(&mut self, _outcome: &FileOutcome) {}
    fn directory_removed(&mut self, _path: &Path) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Options for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrganizeOptions {
    pub buckets: BucketOptions,
    /// Skip files older than this many days.
    pub max_age_days: Option<f64>,
    /// Plan only; touch nothing on disk.
    pub dry_run: bool,
}

/// A discovery result: a regular file, or a directory that could not be read.
enum Discovered {
    File(PathBuf),
    Unreadable(PathBuf, OrganizeError),
}

/// State owned by a single run.
struct RunState {
    digests: HashMap<ContentDigest, String>,
    planner: PathPlanner,
    category_folders: Vec<String>,
    now: SystemTime,
}

/// Organizes one directory tree using one category table.
pub struct OrganizeEngine {
    root: PathBuf,
    table: CategoryTable,
    options: OrganizeOptions,
    filters: FileFilter,
    hasher: ContentHasher,
    cancel: Arc<AtomicBool>,
}

impl OrganizeEngine {
    /// Creates an engine for `root`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidBasePath` if `root` does not exist or is
    /// not a directory. Nothing is touched on disk in that case.
    pub fn new(root: &Path, table: CategoryTable, options: OrganizeOptions) -> OrganizeResult<Self> {
        let metadata = fs::metadata(root).map_err(|e| OrganizeError::InvalidBasePath {
            path: root.to_path_buf(),
            source: e,
        })?;

        if !metadata.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "base path is not a directory"),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            table,
            options,
            filters: FileFilter::allow_all(),
            hasher: ContentHasher::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_filters(mut self, filters: FileFilter) -> Self {
        self.filters = filters;
        self
    }

    /// Shares a cancellation flag; setting it stops the run before the next
    /// file.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn run(&self) -> RunReport {
        self.run_with_observer(&mut NoopObserver)
    }

    /// Runs the whole pipeline, reporting progress to `observer`.
    pub fn run_with_observer(&self, observer: &mut dyn RunObserver) -> RunReport {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            ..RunReport::default()
        };

        let discovered = self.discover();
        report.stats.total = discovered
            .iter()
            .filter(|entry| matches!(entry, Discovered::File(_)))
            .count();
        observer.discovered(discovered.len());
        tracing::info!(
            root = %self.root.display(),
            files = report.stats.total,
            dry_run = self.options.dry_run,
            "Starting organize run"
        );

        let mut state = RunState {
            digests: HashMap::new(),
            planner: PathPlanner::new(&self.root, self.options.buckets),
            category_folders: self.table.folder_names(),
            now: SystemTime::now(),
        };

        for entry in discovered {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::warn!(
                    processed = report.stats.processed(),
                    total = report.stats.total,
                    "Run interrupted"
                );
                report.interrupted = true;
                break;
            }

            let outcome = match entry {
                Discovered::File(path) => {
                    let disposition = self.process_file(&path, &mut state);
                    FileOutcome {
                        source: path,
                        disposition,
                    }
                }
                Discovered::Unreadable(path, error) => FileOutcome {
                    source: path,
                    disposition: Disposition::Failed(error),
                },
            };

            if let Disposition::Failed(e) = &outcome.disposition {
                tracing::error!(path = %outcome.source.display(), "{}", e);
            }

            report.stats.record(&outcome.disposition);
            observer.file_processed(&outcome);
            report.outcomes.push(outcome);
        }

        if !report.interrupted && !self.options.dry_run {
            report.removed_dirs = self.remove_empty_dirs(observer);
        }

        tracing::info!(
            moved = report.stats.moved,
            skipped = report.stats.skipped,
            errors = report.stats.errors,
            "Organize run finished"
        );
        report
    }

    /// Lists every regular file under the root before anything moves, in
    /// name order so the first of a set of duplicates is stable.
    fn discover(&self) -> Vec<Discovered> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    Some(Discovered::File(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Some(Discovered::Unreadable(
                        path.clone(),
                        OrganizeError::WalkFailed {
                            path,
                            reason: e.to_string(),
                        },
                    ))
                }
            })
            .collect()
    }

    fn process_file(&self, path: &Path, state: &mut RunState) -> Disposition {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if is_inside_category_folder(relative, &state.category_folders) {
            tracing::debug!(path = %relative.display(), "Already organized");
            return Disposition::Skipped(SkipReason::AlreadyOrganized);
        }

        if !self.filters.allows(relative) {
            tracing::debug!(path = %relative.display(), "Excluded by filters");
            return Disposition::Skipped(SkipReason::Excluded);
        }

        let record = match FileRecord::from_path(path) {
            Ok(record) => record,
            Err(e) => {
                return Disposition::Failed(OrganizeError::MetadataFailed {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        if let Some(limit) = self.options.max_age_days {
            let age_days = record.age_days(state.now);
            if exceeds_age_limit(age_days, limit) {
                tracing::debug!(path = %relative.display(), age_days, "Older than age limit");
                return Disposition::Skipped(SkipReason::TooOld { age_days });
            }
        }

        if let Some(digest) = record.digest(&self.hasher) {
            if let Some(original) = state.digests.get(&digest) {
                tracing::info!("Duplicate found: {} is identical to {}", record.name, original);
                return Disposition::Skipped(SkipReason::Duplicate {
                    original: original.clone(),
                });
            }
            state.digests.insert(digest, record.name.clone());
        }

        let category = Classifier::new(&self.table).category_of(&record.name);
        match self.relocate(&record, category, &mut state.planner) {
            Ok(destination) => Disposition::Moved {
                destination,
                category: sanitize_label(category),
            },
            Err(e) => Disposition::Failed(e),
        }
    }

    /// Plans the destination and moves the file there (or only plans, in a
    /// dry run).
    fn relocate(
        &self,
        record: &FileRecord,
        category: &str,
        planner: &mut PathPlanner,
    ) -> OrganizeResult<PathBuf> {
        if self.options.dry_run {
            let destination = planner.destination_for(category, record);
            tracing::debug!(
                "Would move {} to {}",
                record.path.display(),
                destination.display()
            );
            planner.reserve(destination.clone());
            return Ok(destination);
        }

        let dir = planner.category_dir(category, record.size, record.modified);
        fs::create_dir_all(&dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dir.clone(),
            source: e,
        })?;

        let mut attempts = 1;
        loop {
            let destination = planner.destination_for(category, record);
            match move_file(&record.path, &destination) {
                Ok(()) => {
                    tracing::info!(
                        "Moved {} to {}",
                        record.path.display(),
                        destination.display()
                    );
                    return Ok(destination);
                }
                Err(OrganizeError::DestinationExists(_)) if attempts < MAX_PLAN_ATTEMPTS => {
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Removes directories that are empty, deepest first. Failures (not
    /// empty, permission denied) are ignored.
    fn remove_empty_dirs(&self, observer: &mut dyn RunObserver) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir());

        for entry in walker {
            match fs::remove_dir(entry.path()) {
                Ok(()) => {
                    tracing::info!("Removed empty directory: {}", entry.path().display());
                    observer.directory_removed(entry.path());
                    removed.push(entry.into_path());
                }
                Err(e) => {
                    tracing::trace!(path = %entry.path().display(), error = %e, "Directory kept");
                }
            }
        }
        removed
    }
}

/// True when the first component of `relative` (a path under the root) is one
/// of the top-level category folders and the file sits below it.
fn is_inside_category_folder(relative: &Path, folders: &[String]) -> bool {
    let mut components = relative.components();
    let first = match components.next() {
        Some(Component::Normal(name)) => name.to_string_lossy(),
        _ => return false,
    };
    components.next().is_some() && folders.iter().any(|folder| *folder == first)
}

/// Moves `source` to `destination` without ever replacing an existing entry.
///
/// Within a filesystem the destination is created as a hard link, which fails
/// with `AlreadyExists` instead of replacing anything, and the source name is
/// then removed. Where hard links are unavailable (another device, or a
/// filesystem without them) the file is copied into a newly created
/// destination instead. If the source cannot be removed afterwards the new
/// entry is deleted again, so the file ends up in exactly one place.
pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
    let failure = |e: io::Error| OrganizeError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };
    let exists_or = |e: io::Error| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            OrganizeError::DestinationExists(destination.to_path_buf())
        } else {
            failure(e)
        }
    };

    match fs::hard_link(source, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(exists_or(e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(failure(e)),
        Err(e) => {
            tracing::debug!(error = %e, "Hard link unavailable, falling back to copy");
            copy_to_new_file(source, destination).map_err(exists_or)?;
        }
    }

    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(failure(e));
    }
    Ok(())
}

/// Copies `source` into a file that must not exist yet. A partially written
/// destination is removed on failure.
fn copy_to_new_file(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let metadata = reader.metadata()?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.set_permissions(metadata.permissions()))
        .and_then(|_| metadata.modified())
        .and_then(|modified| writer.set_modified(modified))
        .and_then(|_| writer.sync_all());

    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine(root: &Path, options: OrganizeOptions) -> OrganizeEngine {
        OrganizeEngine::new(root, CategoryTable::default(), options).expect("Failed to build engine")
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = OrganizeEngine::new(
            &temp_dir.path().join("nope"),
            CategoryTable::default(),
            OrganizeOptions::default(),
        );
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").expect("Failed to write file");

        let result = OrganizeEngine::new(&file, CategoryTable::default(), OrganizeOptions::default());
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
        assert!(file.exists());
    }

    #[test]
    fn test_is_inside_category_folder() {
        let folders = vec!["Images".to_string(), "Others".to_string()];
        assert!(is_inside_category_folder(Path::new("Images/a.jpg"), &folders));
        assert!(is_inside_category_folder(Path::new("Images/2024-01/a.jpg"), &folders));
        assert!(is_inside_category_folder(Path::new("Others/README"), &folders));
        assert!(!is_inside_category_folder(Path::new("Images"), &folders));
        assert!(!is_inside_category_folder(Path::new("a.jpg"), &folders));
        assert!(!is_inside_category_folder(Path::new("photos/Images/a.jpg"), &folders));
    }

    #[test]
    fn test_move_file_refuses_existing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        let destination = temp_dir.path().join("b.txt");
        fs::write(&source, "source").expect("Failed to write file");
        fs::write(&destination, "keep me").expect("Failed to write file");

        let result = move_file(&source, &destination);
        assert!(matches!(result, Err(OrganizeError::DestinationExists(_))));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "keep me");
        assert!(source.exists());
    }

    #[test]
    fn test_move_file_missing_source_leaves_nothing_behind() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("ghost.txt");
        let destination = temp_dir.path().join("moved.txt");

        let result = move_file(&source, &destination);
        assert!(matches!(result, Err(OrganizeError::FileMoveFailure { .. })));
        assert!(!destination.exists());
    }

    #[test]
    fn test_copy_to_new_file_refuses_existing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.bin");
        let destination = temp_dir.path().join("b.bin");
        fs::write(&source, "new").expect("Failed to write file");
        fs::write(&destination, "old").expect("Failed to write file");

        let err = copy_to_new_file(&source, &destination).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
    }

    #[test]
    fn test_copy_to_new_file_copies_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.bin");
        let destination = temp_dir.path().join("b.bin");
        fs::write(&source, "payload").expect("Failed to write file");

        copy_to_new_file(&source, &destination).expect("Failed to copy");
        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
        assert!(source.exists());
    }

    #[test]
    fn test_move_file_leaves_single_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        let destination = temp_dir.path().join("sub").join("a.txt");
        fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create dir");
        fs::write(&source, "payload").expect("Failed to write file");

        move_file(&source, &destination).expect("Failed to move");
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let links = fs::metadata(&destination).unwrap().nlink();
            assert_eq!(links, 1);
        }
    }

    #[test]
    fn test_move_file_refuses_dangling_symlink_destination() {
        #[cfg(unix)]
        {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let source = temp_dir.path().join("a.txt");
            let destination = temp_dir.path().join("b.txt");
            fs::write(&source, "source").expect("Failed to write file");
            std::os::unix::fs::symlink(temp_dir.path().join("missing"), &destination)
                .expect("Failed to create symlink");

            let result = move_file(&source, &destination);
            assert!(matches!(result, Err(OrganizeError::DestinationExists(_))));
            assert!(source.exists());
            assert!(destination.symlink_metadata().unwrap().file_type().is_symlink());
        }
    }

    #[test]
    fn test_run_counts_add_up() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "image").expect("Failed to write file");
        fs::write(root.join("b.txt"), "text").expect("Failed to write file");
        fs::write(root.join("c.jpg"), "image").expect("Failed to write file");
        fs::write(root.join("README"), "readme").expect("Failed to write file");

        let report = engine(root, OrganizeOptions::default()).run();
        assert_eq!(report.stats.total, 4);
        assert_eq!(report.stats.moved, 3);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.errors, 0);
        assert_eq!(report.stats.processed(), report.stats.total);
        assert!(root.join("Others").join("README").exists());

        let counts = report.category_counts();
        assert_eq!(counts.get("Images"), Some(&1));
        assert_eq!(counts.get("Documents"), Some(&1));
        assert_eq!(counts.get("Others"), Some(&1));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("empty")).expect("Failed to create dir");
        fs::write(root.join("a.jpg"), "one").expect("Failed to write file");
        fs::create_dir(root.join("sub")).expect("Failed to create dir");
        fs::write(root.join("sub").join("a.jpg"), "two").expect("Failed to write file");

        let options = OrganizeOptions {
            dry_run: true,
            ..OrganizeOptions::default()
        };
        let report = engine(root, options).run();

        assert!(report.dry_run);
        assert_eq!(report.stats.moved, 2);
        assert!(report.removed_dirs.is_empty());
        assert!(root.join("a.jpg").exists());
        assert!(root.join("sub").join("a.jpg").exists());
        assert!(root.join("empty").exists());
        assert!(!root.join("Images").exists());

        let destinations: Vec<&PathBuf> = report
            .outcomes
            .iter()
            .filter_map(|o| match &o.disposition {
                Disposition::Moved { destination, .. } => Some(destination),
                _ => None,
            })
            .collect();
        assert_eq!(destinations.len(), 2);
        assert_ne!(destinations[0], destinations[1]);
    }

    #[test]
    fn test_cancelled_run_moves_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "image").expect("Failed to write file");
        fs::create_dir(root.join("empty")).expect("Failed to create dir");

        let cancel = Arc::new(AtomicBool::new(true));
        let report = engine(root, OrganizeOptions::default())
            .with_cancel_flag(cancel)
            .run();

        assert!(report.interrupted);
        assert_eq!(report.stats.total, 1);
        assert_eq!(report.stats.processed(), 0);
        assert!(root.join("a.jpg").exists());
        // Cleanup is skipped on interruption.
        assert!(root.join("empty").exists());
    }

    struct Recorder {
        total: Option<usize>,
        processed: usize,
        removed: Vec<PathBuf>,
    }

    impl RunObserver for Recorder {
        fn discovered(&mut self, total: usize) {
            self.total = Some(total);
        }

        fn file_processed(&mut self, _outcome: &FileOutcome) {
            self.processed += 1;
        }

        fn directory_removed(&mut self, path: &Path) {
            self.removed.push(path.to_path_buf());
        }
    }

    #[test]
    fn test_observer_receives_events() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("inbox")).expect("Failed to create dir");
        fs::write(root.join("inbox").join("a.mp3"), "audio").expect("Failed to write file");
        fs::write(root.join("b.pdf"), "pdf").expect("Failed to write file");

        let mut recorder = Recorder {
            total: None,
            processed: 0,
            removed: Vec::new(),
        };
        let report = engine(root, OrganizeOptions::default()).run_with_observer(&mut recorder);

        assert_eq!(recorder.total, Some(2));
        assert_eq!(recorder.processed, 2);
        assert_eq!(recorder.removed, vec![root.join("inbox")]);
        assert_eq!(report.removed_dirs, recorder.removed);
    }
}
