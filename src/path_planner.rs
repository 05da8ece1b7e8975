//! Destination planning: category folder, optional size and date buckets,
//! and collision-free file names.
//!
//! Planning never overwrites. When the natural destination is taken, a
//! timestamp is inserted before the extension (`photo_20250131_142502.jpg`),
//! with a counter appended if that name is taken too.
use crate::category_table::sanitize_label;
use crate::file_record::FileRecord;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const MIB: u64 = 1024 * 1024;

/// Size range of a file, used as an optional bucket folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBucket {
    /// Under 1 MiB.
    Small,
    /// Under 100 MiB.
    Medium,
    /// Everything else.
    Large,
}

impl SizeBucket {
    pub fn for_size(bytes: u64) -> Self {
        if bytes < MIB {
            SizeBucket::Small
        } else if bytes < 100 * MIB {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
        }
    }
}

/// `YYYY-MM` folder name for a modification time, in local time.
pub fn date_bucket(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified).format("%Y-%m").to_string()
}

/// Which secondary bucket layers to add under the category folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketOptions {
    pub by_size: bool,
    pub by_date: bool,
}

/// Computes where files go under a root directory.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    root: PathBuf,
    buckets: BucketOptions,
    reserved: HashSet<PathBuf>,
}

impl PathPlanner {
    pub fn new(root: impl Into<PathBuf>, buckets: BucketOptions) -> Self {
        Self {
            root: root.into(),
            buckets,
            reserved: HashSet::new(),
        }
    }

    /// The directory a file of this category, size and age belongs in.
    /// Size buckets nest above date buckets.
    pub fn category_dir(&self, category: &str, size: u64, modified: SystemTime) -> PathBuf {
        let mut dir = self.root.join(sanitize_label(category));
        if self.buckets.by_size {
            dir.push(SizeBucket::for_size(size).dir_name());
        }
        if self.buckets.by_date {
            dir.push(date_bucket(modified));
        }
        dir
    }

    /// The full destination for `file`, renamed if its natural spot is taken.
    pub fn destination_for(&self, category: &str, file: &FileRecord) -> PathBuf {
        let dir = self.category_dir(category, file.size, file.modified);
        self.free_path(&dir, &file.name, Local::now())
    }

    /// First free path for `file_name` inside `dir`, using `stamp` for the
    /// collision token.
    pub fn free_path(&self, dir: &Path, file_name: &str, stamp: DateTime<Local>) -> PathBuf {
        let candidate = dir.join(file_name);
        if !self.is_taken(&candidate) {
            return candidate;
        }

        let (stem, ext) = split_file_name(file_name);
        let token = stamp.format("%Y%m%d_%H%M%S").to_string();
        let mut attempt: u32 = 0;
        loop {
            let name = if attempt == 0 {
                format!("{}_{}{}", stem, token, ext)
            } else {
                format!("{}_{}_{}{}", stem, token, attempt, ext)
            };
            let path = dir.join(name);
            if !self.is_taken(&path) {
                return path;
            }
            attempt += 1;
        }
    }

    /// Marks a path as taken without touching the disk. Used by dry runs so
    /// later plans see earlier ones.
    pub fn reserve(&mut self, path: PathBuf) {
        self.reserved.insert(path);
    }

    /// Anything at the path counts, including dangling symlinks.
    fn is_taken(&self, path: &Path) -> bool {
        self.reserved.contains(path) || path.symlink_metadata().is_ok()
    }
}

/// Splits a file name into stem and extension (with its dot, or empty).
fn split_file_name(file_name: &str) -> (String, String) {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}
