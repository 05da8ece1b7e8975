//! Filename → category resolution.
use crate::category_table::CategoryTable;
use std::path::Path;

/// Returns the lowercased extension of `filename` including its leading dot,
/// or an empty string when there is none.
///
/// Dotfiles such as `.bashrc` have no extension; `archive.tar.gz` yields `.gz`.
///
/// ```
/// use nexus_sorter::classifier::extension_of;
///
/// assert_eq!(extension_of("Photo.JPG"), ".jpg");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("README"), "");
/// assert_eq!(extension_of(".bashrc"), "");
/// ```
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Classifies files by name against a borrowed [`CategoryTable`].
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    table: &'a CategoryTable,
}

impl<'a> Classifier<'a> {
    pub fn new(table: &'a CategoryTable) -> Self {
        Self { table }
    }

    /// The category label for `filename`. Unknown or missing extensions get
    /// the fallback label.
    pub fn category_of(&self, filename: &str) -> &'a str {
        self.table.resolve(&extension_of(filename))
    }
}
