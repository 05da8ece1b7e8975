//! Run settings and file filters.
//!
//! Settings are read from a TOML file and supply defaults for every CLI
//! option, plus optional filter rules that keep matching files out of a run.
//!
//! # Settings File Format
//!
//! ```toml
//! [organize]
//! categories = "categories.json"
//! by_date = false
//! by_size = true
//! max_age_days = 90.0
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! names = [".DS_Store", "Thumbs.db"]
//! globs = ["*.part", "node_modules/**"]
//! extensions = ["tmp"]
//! regex = ['^~\$']
//!
//! [filters.keep]
//! globs = []
//! ```
//!
//! Globs are matched against the path relative to the directory being
//! organized; names and regexes against the file name alone.

use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings file looked up in the current directory.
pub const LOCAL_SETTINGS_FILE: &str = ".nexusrc.toml";

/// Errors that can occur while loading settings or compiling filters.
#[derive(Debug)]
pub enum ConfigError {
    /// An explicitly named settings file does not exist.
    NotFound(PathBuf),
    Read { path: PathBuf, source: io::Error },
    /// The file is not valid TOML or has the wrong shape.
    Parse { path: PathBuf, reason: String },
    InvalidGlob { pattern: String, reason: String },
    InvalidRegex { pattern: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Settings file not found: {}", path.display())
            }
            ConfigError::Read { path, source } => {
                write!(f, "Cannot read settings {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "Invalid settings in {}: {}", path.display(), reason)
            }
            ConfigError::InvalidGlob { pattern, reason } => {
                write!(f, "Invalid glob '{}': {}", pattern, reason)
            }
            ConfigError::InvalidRegex { pattern, reason } => {
                write!(f, "Invalid regex '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Everything a settings file can specify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub organize: OrganizeSettings,
    pub filters: FilterRules,
}

/// Defaults for the organize run; CLI flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeSettings {
    /// Category definition file (JSON or TOML).
    pub categories: Option<PathBuf>,
    pub by_date: bool,
    pub by_size: bool,
    /// Skip files older than this many days.
    pub max_age_days: Option<f64>,
}

/// Which files take part in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Organize dot-files too.
    pub include_hidden: bool,
    pub exclude: ExcludeRules,
    /// Globs that override every exclusion.
    pub keep: KeepRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude: ExcludeRules::default(),
            keep: KeepRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact file names.
    pub names: Vec<String>,
    pub globs: Vec<String>,
    /// Extensions, with or without the leading dot, any case.
    pub extensions: Vec<String>,
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepRules {
    pub globs: Vec<String>,
}

impl Settings {
    /// Loads settings.
    ///
    /// An explicit `config_path` must exist. Without one, the first existing
    /// file from [`Settings::candidate_paths`] is used, or the built-in
    /// defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::read(path);
        }

        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::read(&path),
            None => {
                tracing::debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Implicit lookup order: `.nexusrc.toml` in the working directory, then
    /// `$HOME/.config/nexus-sorter/config.toml`.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_SETTINGS_FILE)];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("nexus-sorter")
                    .join("config.toml"),
            );
        }
        paths
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // A relative category file is relative to the settings file.
        if let (Some(categories), Some(base)) = (&settings.organize.categories, path.parent()) {
            if categories.is_relative() {
                settings.organize.categories = Some(base.join(categories));
            }
        }

        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }
}

impl FilterRules {
    /// Compiles the rules into a [`FileFilter`].
    ///
    /// # Errors
    ///
    /// Returns an error for the first glob or regex that does not compile.
    pub fn compile(&self) -> Result<FileFilter, ConfigError> {
        let mut rules = Vec::new();
        rules.extend(self.exclude.names.iter().cloned().map(ExcludeRule::Name));
        rules.extend(
            self.exclude
                .extensions
                .iter()
                .map(|ext| ExcludeRule::Extension(ext.trim_start_matches('.').to_lowercase())),
        );
        for pattern in &self.exclude.globs {
            rules.push(ExcludeRule::Glob(glob_pattern(pattern)?));
        }
        for pattern in &self.exclude.regex {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            rules.push(ExcludeRule::Regex(regex));
        }

        let keep = self
            .keep
            .globs
            .iter()
            .map(|pattern| glob_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FileFilter {
            include_hidden: self.include_hidden,
            keep,
            rules,
        })
    }
}

fn glob_pattern(pattern: &str) -> Result<Pattern, ConfigError> {
    Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })
}

/// `*` must not cross directory separators.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
enum ExcludeRule {
    Name(String),
    /// Lowercased, without the dot.
    Extension(String),
    Glob(Pattern),
    Regex(Regex),
}

impl ExcludeRule {
    fn matches(&self, relative: &Path, file_name: &str) -> bool {
        match self {
            ExcludeRule::Name(name) => name == file_name,
            ExcludeRule::Extension(ext) => relative
                .extension()
                .is_some_and(|e| e.to_string_lossy().to_lowercase() == *ext),
            ExcludeRule::Glob(pattern) => pattern.matches_path_with(relative, GLOB_OPTIONS),
            ExcludeRule::Regex(regex) => regex.is_match(file_name),
        }
    }
}

/// Compiled filter rules.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include_hidden: bool,
    keep: Vec<Pattern>,
    rules: Vec<ExcludeRule>,
}

impl FileFilter {
    /// A filter that lets every file through.
    pub fn allow_all() -> Self {
        Self {
            include_hidden: true,
            keep: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Whether a file, given relative to the organized root, takes part.
    pub fn allows(&self, relative: &Path) -> bool {
        if self
            .keep
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, GLOB_OPTIONS))
        {
            return true;
        }

        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        !self.rules.iter().any(|rule| rule.matches(relative, &file_name))
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn excluding(exclude: ExcludeRules) -> FileFilter {
        FilterRules {
            exclude,
            ..FilterRules::default()
        }
        .compile()
        .expect("rules compile")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.filters.include_hidden);
        assert!(!settings.organize.by_date);
        assert!(!settings.organize.by_size);
        assert_eq!(settings.organize.max_age_days, None);
        assert_eq!(settings.organize.categories, None);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings: Settings = toml::from_str("").expect("empty TOML parses");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_allow_all_lets_everything_through() {
        let filter = FileFilter::allow_all();
        assert!(filter.allows(Path::new(".DS_Store")));
        assert!(filter.allows(Path::new("deep/nested/file.tmp")));
    }

    #[test]
    fn test_hidden_files_can_be_left_out() {
        let filter = FilterRules {
            include_hidden: false,
            ..FilterRules::default()
        }
        .compile()
        .unwrap();
        assert!(!filter.allows(Path::new(".env")));
        assert!(!filter.allows(Path::new("sub/.hidden")));
        assert!(filter.allows(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_names_and_extensions() {
        let filter = excluding(ExcludeRules {
            names: vec!["Thumbs.db".to_string()],
            extensions: vec!["tmp".to_string(), ".BAK".to_string()],
            ..Default::default()
        });

        assert!(!filter.allows(Path::new("Thumbs.db")));
        assert!(!filter.allows(Path::new("sub/Thumbs.db")));
        assert!(!filter.allows(Path::new("draft.TMP")));
        assert!(!filter.allows(Path::new("old.bak")));
        assert!(filter.allows(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclude_globs_stay_within_directories() {
        let filter = excluding(ExcludeRules {
            globs: vec!["**/logs/**".to_string(), "*.part".to_string()],
            ..Default::default()
        });

        assert!(!filter.allows(Path::new("logs/app.txt")));
        assert!(!filter.allows(Path::new("app/logs/app.txt")));
        assert!(filter.allows(Path::new("my_logs/app.txt")));
        assert!(!filter.allows(Path::new("video.mp4.part")));
        assert!(filter.allows(Path::new("downloads/video.mp4.part")));
    }

    #[test]
    fn test_exclude_regex_matches_file_name() {
        let filter = excluding(ExcludeRules {
            regex: vec![r"^~\$".to_string()],
            ..Default::default()
        });

        assert!(!filter.allows(Path::new("docs/~$report.docx")));
        assert!(filter.allows(Path::new("docs/report.docx")));
    }

    #[test]
    fn test_keep_overrides_exclusions() {
        let filter = FilterRules {
            include_hidden: false,
            exclude: ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            keep: KeepRules {
                globs: vec!["keep.log".to_string(), ".important".to_string()],
            },
        }
        .compile()
        .unwrap();

        assert!(filter.allows(Path::new("keep.log")));
        assert!(!filter.allows(Path::new("other.log")));
        assert!(filter.allows(Path::new(".important")));
        assert!(!filter.allows(Path::new(".other")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..FilterRules::default()
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegex { .. })
        ));

        let bad_glob = FilterRules {
            keep: KeepRules {
                globs: vec!["[unclosed".to_string()],
            },
            ..FilterRules::default()
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn test_load_settings_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[organize]
categories = "my_categories.json"
by_size = true
max_age_days = 14.5

[filters.exclude]
extensions = ["part"]
"#,
        )
        .expect("Failed to write settings");

        let settings = Settings::load(Some(&path)).expect("Failed to load settings");
        assert_eq!(
            settings.organize.categories,
            Some(temp_dir.path().join("my_categories.json"))
        );
        assert!(settings.organize.by_size);
        assert!(!settings.organize.by_date);
        assert_eq!(settings.organize.max_age_days, Some(14.5));
        assert!(settings.filters.include_hidden);
        assert_eq!(settings.filters.exclude.extensions, vec!["part".to_string()]);
    }

    #[test]
    fn test_absolute_categories_path_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let elsewhere = TempDir::new().expect("Failed to create temp directory");
        let categories = elsewhere.path().join("shared.json");
        let path = temp_dir.path().join("settings.toml");
        let content = format!(
            "[organize]\ncategories = '{}'\n",
            categories.display()
        );
        fs::write(&path, content).expect("Failed to write settings");

        let settings = Settings::load(Some(&path)).expect("Failed to load settings");
        assert_eq!(settings.organize.categories, Some(categories));
    }

    #[test]
    fn test_explicit_missing_settings_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = Settings::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_wrong_types_are_parse_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[organize]\nby_size = \"sometimes\"\n").expect("Failed to write");

        let result = Settings::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_candidate_paths_start_local() {
        let paths = Settings::candidate_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_SETTINGS_FILE));
    }
}
