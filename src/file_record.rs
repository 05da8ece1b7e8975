//! Per-file facts gathered once during a run.
use crate::hasher::{ContentDigest, ContentHasher};
use std::cell::OnceCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// A discovered regular file.
#[derive(Debug)]
pub struct FileRecord {
    /// Full path of the file where it was found.
    pub path: PathBuf,
    /// The file name component.
    pub name: String,
    /// Last modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub size: u64,
    digest: OnceCell<Option<ContentDigest>>,
}

impl FileRecord {
    /// Reads the metadata of `path` into a record. The digest is not computed
    /// until [`FileRecord::digest`] is first called.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            modified: metadata.modified()?,
            size: metadata.len(),
            digest: OnceCell::new(),
        })
    }

    /// The content digest, computed at most once.
    ///
    /// Returns `None` when the file could not be read; the failure is logged
    /// and not retried.
    pub fn digest(&self, hasher: &ContentHasher) -> Option<ContentDigest> {
        *self.digest.get_or_init(|| match hasher.digest(&self.path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not hash file; treating it as unique"
                );
                None
            }
        })
    }

    /// Age in fractional days relative to `now`. Modification times in the
    /// future count as age zero.
    pub fn age_days(&self, now: SystemTime) -> f64 {
        now.duration_since(self.modified)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64()
            / SECONDS_PER_DAY
    }
}

/// True when a file of `age_days` is past `limit_days`. The boundary itself
/// is still inside the limit.
pub fn exceeds_age_limit(age_days: f64, limit_days: f64) -> bool {
    age_days > limit_days
}
