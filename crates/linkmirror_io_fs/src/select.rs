//! File selector and path mapper.

use std::path::{Path, PathBuf};

use crate::spec::{EnumFileSelection, SpecMirrorOptions, SpecRenameRule};
use crate::util::{TypeMirrorPatternSeq, should_exclude_by_patterns};

/// Decide whether `name_file` takes part in the pass.
///
/// Checks run cheapest first: extension allow-list, then skip suffixes,
/// then the optional exclusion patterns.
pub(crate) fn select_file(
    name_file: &str,
    spec_mr_options: &SpecMirrorOptions,
    patterns_exclude_files: Option<&TypeMirrorPatternSeq>,
) -> EnumFileSelection {
    if !is_extension_recognized(name_file, &spec_mr_options.extensions_recognized) {
        return EnumFileSelection::Unrecognized;
    }
    if is_skipped(name_file, &spec_mr_options.suffixes_skip_files)
        || should_exclude_by_patterns(name_file, patterns_exclude_files)
    {
        return EnumFileSelection::Skipped;
    }
    EnumFileSelection::Selected
}

pub fn is_extension_recognized(name_file: &str, extensions_recognized: &[String]) -> bool {
    extensions_recognized
        .iter()
        .any(|ext| name_file.ends_with(ext.as_str()))
}

pub fn is_skipped(name_file: &str, suffixes_skip_files: &[String]) -> bool {
    suffixes_skip_files
        .iter()
        .any(|suffix| name_file.ends_with(suffix.as_str()))
}

/// Basename after the rename rules; first matching rule wins.
pub fn derive_destination_name<'a>(
    name_file: &'a str,
    rules_rename: &'a [SpecRenameRule],
) -> &'a str {
    rules_rename
        .iter()
        .find(|rule| name_file.ends_with(rule.suffix_match.as_str()))
        .map(|rule| rule.name_replacement.as_str())
        .unwrap_or(name_file)
}

/// Map a source directory into the destination tree (root prefix swap only).
pub fn derive_destination_dir(
    path_dir_src_sub: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> PathBuf {
    match path_dir_src_sub.strip_prefix(path_dir_src) {
        Ok(path_rel) if path_rel.as_os_str().is_empty() => path_dir_dst.to_path_buf(),
        Ok(path_rel) => path_dir_dst.join(path_rel),
        Err(_) => path_dir_dst.to_path_buf(),
    }
}

/// Map a source file path into the destination tree.
///
/// The directory part keeps its position relative to `path_dir_src`; only
/// the basename is subject to `rules_rename`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use linkmirror_io_fs::select::derive_destination_path;
/// use linkmirror_io_fs::SpecRenameRule;
///
/// let rules = vec![SpecRenameRule::new("maininternaltests.c", "main.c")];
/// let path_dst = derive_destination_path(
///     Path::new("/repo/hazel/maininternaltests.c"),
///     Path::new("/repo/hazel"),
///     Path::new("/repo/HazelInternalTests"),
///     &rules,
/// );
/// assert_eq!(path_dst, Path::new("/repo/HazelInternalTests/main.c"));
/// ```
pub fn derive_destination_path(
    path_file_src: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
    rules_rename: &[SpecRenameRule],
) -> PathBuf {
    let Some(name_file) = path_file_src.file_name().map(|n| n.to_string_lossy()) else {
        return path_dir_dst.to_path_buf();
    };
    let path_dir_dst_sub = match path_file_src.parent() {
        Some(path_parent) => derive_destination_dir(path_parent, path_dir_src, path_dir_dst),
        None => path_dir_dst.to_path_buf(),
    };
    path_dir_dst_sub.join(derive_destination_name(&name_file, rules_rename))
}
