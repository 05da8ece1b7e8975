//! Category definitions for extension-based sorting.
//!
//! A [`CategoryTable`] is an ordered list of category labels, each with the
//! file extensions that belong to it. Lookups are first-match-wins in table
//! order, so an extension listed under two categories always resolves to the
//! earlier one.
//!
//! # Examples
//!
//! ```
//! use nexus_sorter::category_table::{CategoryTable, FALLBACK_CATEGORY, sanitize_label};
//!
//! let table = CategoryTable::default();
//! assert_eq!(sanitize_label(table.resolve(".PNG")), "Images");
//! assert_eq!(sanitize_label(table.resolve(".pdf")), "Documents");
//! assert_eq!(table.resolve(".unknown"), FALLBACK_CATEGORY);
//! ```
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Label returned when no category claims an extension.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Folder used when a label sanitizes down to nothing.
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

/// Built-in category table, in lookup order.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "📸 Images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".tiff", ".ico", ".raw",
            ".heic", ".jfif", ".psd", ".ai",
        ],
    ),
    (
        "📄 Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xlsx", ".csv", ".ppt", ".pptx",
            ".pages", ".numbers", ".key", ".md", ".epub", ".mobi",
        ],
    ),
    (
        "🎵 Audio",
        &[
            ".mp3", ".wav", ".flac", ".m4a", ".aac", ".wma", ".ogg", ".midi", ".aiff", ".alac",
            ".dsd", ".dsf",
        ],
    ),
    (
        "🎬 Video",
        &[
            ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg",
            ".3gp", ".vob", ".ts",
        ],
    ),
    (
        "🗄️ Archives",
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".iso", ".cab", ".jar", ".war",
            ".ear",
        ],
    ),
    (
        "💻 Code",
        &[
            ".py", ".js", ".html", ".css", ".java", ".cpp", ".php", ".rb", ".swift", ".go", ".rs",
            ".sql", ".sh", ".bat", ".ps1", ".tsx", ".jsx", ".vue",
        ],
    ),
    (
        "⚙️ Executables",
        &[
            ".exe", ".msi", ".app", ".dmg", ".deb", ".rpm", ".apk", ".ipa", ".appx",
        ],
    ),
    (
        "🎨 Design",
        &[
            ".psd", ".ai", ".xd", ".sketch", ".fig", ".indd", ".ae", ".afdesign", ".blend",
        ],
    ),
    (
        "📊 Data",
        &[
            ".json", ".xml", ".yaml", ".csv", ".sql", ".db", ".sqlite", ".mdb", ".accdb",
        ],
    ),
    (
        "📝 Text",
        &[".txt", ".md", ".log", ".ini", ".cfg", ".conf", ".env"],
    ),
    (
        "📚 Books",
        &[".pdf", ".epub", ".mobi", ".azw", ".azw3", ".fb2", ".djvu"],
    ),
    ("📦 Software", &[".iso", ".img", ".vhd", ".vmdk", ".ova"]),
    (
        "🔒 Security",
        &[".key", ".pem", ".crt", ".cer", ".p12", ".pfx"],
    ),
    (
        "🎮 Games",
        &[".sav", ".rom", ".nes", ".snes", ".gba", ".nds"],
    ),
    ("📧 Email", &[".eml", ".msg", ".pst", ".ost", ".mbox"]),
    ("🔤 Fonts", &[".ttf", ".otf", ".woff", ".woff2", ".eot"]),
];

/// Anything that is not a letter, a digit, a combining mark, a space or a
/// small set of punctuation is decoration. Emoji variation selectors and the
/// keycap mark are marks too, but only ever decorate icons.
static DECORATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\p{M} _\-.()&+,']|[\x{FE00}-\x{FE0F}\x{20E3}]")
        .expect("decoration pattern is valid")
});

/// Marks left without a base character once their icon is stripped.
static ORPHAN_MARKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\p{L}\p{N}\p{M}])\p{M}+").expect("orphan mark pattern is valid")
});

/// Derives a filesystem-safe folder name from a category label.
///
/// Icons and other decorative characters are stripped, surrounding whitespace
/// and dots are trimmed, and an empty result becomes [`UNCATEGORIZED_FOLDER`].
///
/// ```
/// use nexus_sorter::category_table::sanitize_label;
///
/// assert_eq!(sanitize_label("🗄️ Archives"), "Archives");
/// assert_eq!(sanitize_label("Work/Invoices"), "WorkInvoices");
/// assert_eq!(sanitize_label("✨✨"), "Uncategorized");
/// ```
pub fn sanitize_label(label: &str) -> String {
    let stripped = DECORATION.replace_all(label, "");
    let stripped = ORPHAN_MARKS.replace_all(&stripped, "${1}");
    let trimmed = stripped.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        UNCATEGORIZED_FOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercases an extension and makes sure it carries a leading dot.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.is_empty() || lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Errors raised while reading or writing a category definition file.
#[derive(Debug)]
pub enum CategoryError {
    /// The definition file does not exist.
    NotFound(PathBuf),
    /// The definition file exists but could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not a label → extension-list mapping.
    Parse { path: PathBuf, reason: String },
    /// The table could not be written.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The table could not be encoded.
    Serialize(String),
}

impl fmt::Display for CategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Category file not found: {}", path.display())
            }
            Self::Read { path, source } => {
                write!(f, "Could not read category file {}: {}", path.display(), source)
            }
            Self::Parse { path, reason } => {
                write!(f, "Invalid category file {}: {}", path.display(), reason)
            }
            Self::Write { path, source } => {
                write!(f, "Could not write category file {}: {}", path.display(), source)
            }
            Self::Serialize(reason) => write!(f, "Could not encode categories: {}", reason),
        }
    }
}

impl std::error::Error for CategoryError {}

pub type CategoryResult<T> = Result<T, CategoryError>;

/// On-disk encoding of a definition file, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionFormat {
    Json,
    Toml,
}

impl DefinitionFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// A single labelled category and its extensions, stored as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    label: String,
    extensions: Vec<String>,
}

impl Category {
    pub fn new(label: impl Into<String>, extensions: Vec<String>) -> Self {
        Self {
            label: label.into(),
            extensions,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Normalized extension set, used for matching and equivalence.
    pub fn extension_set(&self) -> BTreeSet<String> {
        self.extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect()
    }

    fn matches(&self, normalized_ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| normalize_extension(e) == normalized_ext)
    }
}

/// Ordered mapping from category label to extension list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Builds a table from categories, keeping their order.
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The compiled-in table.
    pub fn defaults() -> Self {
        Self::new(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(label, exts)| {
                    Category::new(*label, exts.iter().map(|e| e.to_string()).collect())
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Category::label)
    }

    /// Resolves an extension (with or without its leading dot) to a label.
    ///
    /// Matching is case-insensitive and first-match-wins. An empty or unknown
    /// extension resolves to [`FALLBACK_CATEGORY`].
    pub fn resolve(&self, extension: &str) -> &str {
        let wanted = normalize_extension(extension);
        if wanted.is_empty() {
            return FALLBACK_CATEGORY;
        }
        self.iter()
            .find(|c| c.matches(&wanted))
            .map(Category::label)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Every top-level folder name this table can produce, fallback included.
    pub fn folder_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for label in self.labels().chain(std::iter::once(FALLBACK_CATEGORY)) {
            let folder = sanitize_label(label);
            if !names.contains(&folder) {
                names.push(folder);
            }
        }
        names
    }

    /// Same labels in the same order, with equal extension sets.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.categories.len() == other.categories.len()
            && self
                .categories
                .iter()
                .zip(&other.categories)
                .all(|(a, b)| a.label == b.label && a.extension_set() == b.extension_set())
    }

    /// Loads a definition file, failing on any problem.
    ///
    /// `.toml` files are read as TOML, everything else as JSON.
    pub fn try_load(path: &Path) -> CategoryResult<Self> {
        if !path.exists() {
            return Err(CategoryError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| CategoryError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let parsed = match DefinitionFormat::for_path(path) {
            DefinitionFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            DefinitionFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| CategoryError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Loads a definition file if one is given, otherwise the defaults.
    ///
    /// A missing, unreadable, malformed or empty file is logged as a warning
    /// and the defaults are used instead; this never fails.
    pub fn load_or_default(source: Option<&Path>) -> Self {
        let Some(path) = source else {
            return Self::defaults();
        };

        match Self::try_load(path) {
            Ok(table) if table.is_empty() => {
                tracing::warn!(
                    "{} defines no categories. Using default categories.",
                    path.display()
                );
                Self::defaults()
            }
            Ok(table) => {
                tracing::info!(
                    path = %path.display(),
                    categories = table.len(),
                    "Loaded category definitions"
                );
                table
            }
            Err(e) => {
                tracing::warn!("{}. Using default categories.", e);
                Self::defaults()
            }
        }
    }

    /// Writes the table to `destination`, as TOML for `.toml` paths and
    /// pretty-printed JSON otherwise.
    pub fn save(&self, destination: &Path) -> CategoryResult<()> {
        let encoded = match DefinitionFormat::for_path(destination) {
            DefinitionFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| CategoryError::Serialize(e.to_string()))?
            }
            DefinitionFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| CategoryError::Serialize(e.to_string()))?,
        };

        fs::write(destination, encoded).map_err(|e| CategoryError::Write {
            path: destination.to_path_buf(),
            source: e,
        })?;

        tracing::info!(path = %destination.display(), "Categories saved");
        Ok(())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Serialize for CategoryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for category in self.iter() {
            map.serialize_entry(category.label(), category.extensions())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = CategoryTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category labels to extension lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut categories = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, extensions)) = map.next_entry::<String, Vec<String>>()? {
                    categories.push(Category::new(label, extensions));
                }
                Ok(CategoryTable::new(categories))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
