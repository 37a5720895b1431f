//! Mirror specification models and top-level error types.

use std::fmt;
use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Pattern matching mode for the directory/file exclusion lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMirrorPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Outcome of the file selector for one file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileSelection {
    /// File participates in the mirror pass.
    Selected,
    /// Extension is not on the allow-list.
    Unrecognized,
    /// File matches a skip suffix or an exclusion pattern.
    Skipped,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One filename remap: a basename ending with `suffix_match` becomes
/// `name_replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRenameRule {
    pub suffix_match: String,
    pub name_replacement: String,
}

impl SpecRenameRule {
    pub fn new(suffix_match: impl Into<String>, name_replacement: impl Into<String>) -> Self {
        Self {
            suffix_match: suffix_match.into(),
            name_replacement: name_replacement.into(),
        }
    }
}

/// Tokens driving the content rewrite pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRewriteOptions {
    /// Lowercase project token replaced everywhere (`hazel`).
    pub token_project: String,
    /// Replacement token of the test tree (`HazelInternalTests`).
    pub token_test: String,
    /// Display name restored in front of `display_qualifier` (`Hazel`).
    pub display_name: String,
    /// Word following the display name in banners (`Language`).
    pub display_qualifier: String,
    /// Umbrella header of the production tree (`hazel.h`).
    pub name_header_umbrella_src: String,
    /// Umbrella header of the test tree (`HazelInternalTests.h`).
    pub name_header_umbrella_dst: String,
}

impl Default for SpecRewriteOptions {
    fn default() -> Self {
        Self {
            token_project: "hazel".to_string(),
            token_test: "HazelInternalTests".to_string(),
            display_name: "Hazel".to_string(),
            display_qualifier: "Language".to_string(),
            name_header_umbrella_src: "hazel.h".to_string(),
            name_header_umbrella_dst: "HazelInternalTests.h".to_string(),
        }
    }
}

/// Version control metadata directories, matched by exact basename.
pub const NAMES_VCS_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

/// Input options for `mirror_tree`.
#[derive(Debug, Clone)]
pub struct SpecMirrorOptions {
    /// File name suffixes that participate in the pass.
    pub extensions_recognized: Vec<String>,
    /// File name suffixes excluded from the pass even when recognized.
    pub suffixes_skip_files: Vec<String>,
    /// Ordered basename remaps; first match wins.
    pub rules_rename: Vec<SpecRenameRule>,
    /// Source directory path suffixes whose files get linkage stripping.
    pub suffixes_policy_dirs: Vec<String>,
    /// Extra exclude patterns applied to directory basename. VCS metadata
    /// directories (`NAMES_VCS_DIRS`) are skipped regardless of this list.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Extra exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumMirrorPatternMode,
    /// Content rewrite tokens.
    pub spec_rewrite: SpecRewriteOptions,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecMirrorOptions {
    fn default() -> Self {
        let spec_rewrite = SpecRewriteOptions::default();
        Self {
            extensions_recognized: [".c", ".cpp", ".h", ".hpp"]
                .into_iter()
                .map(String::from)
                .collect(),
            suffixes_skip_files: vec!["main.c".to_string()],
            rules_rename: vec![
                SpecRenameRule::new(
                    spec_rewrite.name_header_umbrella_src.clone(),
                    spec_rewrite.name_header_umbrella_dst.clone(),
                ),
                SpecRenameRule::new("maininternaltests.c", "main.c"),
            ],
            suffixes_policy_dirs: vec!["compiler".to_string()],
            patterns_exclude_dirs: None,
            patterns_exclude_files: None,
            rule_pattern: EnumMirrorPatternMode::Glob,
            spec_rewrite,
            if_dry_run: false,
        }
    }
}

/// Fatal errors. Any of these aborts the run; files written before the
/// failure are left in place.
#[derive(Debug)]
pub enum MirrorTreeError {
    /// Invalid exclude pattern.
    InvalidPattern(String),
    /// Source path is not a directory.
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    SourceDestinationOverlap {
        /// Normalized source directory.
        source: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination root initialization failed.
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// A destination subdirectory could not be created.
    DirectoryCreateFailed { path: PathBuf, message: String },
    /// A source directory could not be listed.
    ReadDirectoryFailed { path: PathBuf, message: String },
    /// A source file could not be read as text.
    ReadFailed { path: PathBuf, message: String },
    /// A destination file could not be written.
    WriteFailed { path: PathBuf, message: String },
    /// Destination path escapes the root or traverses a symlink.
    UnsafeDestination(String),
}

impl fmt::Display for MirrorTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(msg) => write!(f, "{msg}"),
            Self::SourceNotDirectory(path) => {
                write!(f, "Source is not a directory: {}", path.display())
            }
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination directories overlap: {} <-> {}",
                source.display(),
                destination.display()
            ),
            Self::DestinationInitFailed { path, message } => {
                write!(
                    f,
                    "Failed to initialize destination {}: {message}",
                    path.display()
                )
            }
            Self::DirectoryCreateFailed { path, message } => {
                write!(f, "Failed to create directory {}: {message}", path.display())
            }
            Self::ReadDirectoryFailed { path, message } => {
                write!(f, "Failed to read directory {}: {message}", path.display())
            }
            Self::ReadFailed { path, message } => {
                write!(f, "Failed to read {}: {message}", path.display())
            }
            Self::WriteFailed { path, message } => {
                write!(f, "Failed to write {}: {message}", path.display())
            }
            Self::UnsafeDestination(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MirrorTreeError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
