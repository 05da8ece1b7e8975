//! nexus-sorter - sorts a directory tree into category folders
//!
//! This library classifies files by extension against an ordered category
//! table, skips duplicates by content digest, optionally buckets by size and
//! modification month, moves files without ever overwriting, and removes the
//! directories it leaves empty.

pub mod category_table;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod directory_map;
pub mod file_record;
pub mod hasher;
pub mod organizer;
pub mod output;
pub mod path_planner;

pub use category_table::{Category, CategoryError, CategoryTable};
pub use classifier::Classifier;
pub use config::{ConfigError, FileFilter, Settings};
pub use directory_map::{DirectoryMap, DirectoryMapper};
pub use hasher::{ContentDigest, ContentHasher};
pub use organizer::{
    FileOutcome, OrganizeEngine, OrganizeError, OrganizeOptions, RunObserver, RunReport, RunStats,
};
pub use path_planner::{BucketOptions, PathPlanner};

pub use cli::{Args, run_cli};
