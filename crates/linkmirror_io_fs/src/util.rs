use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumMirrorPatternMode, MirrorTreeError, NAMES_VCS_DIRS};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeMirrorPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecMirrorPatterns {
    pub(crate) patterns_exclude_dirs: Option<TypeMirrorPatternSeq>,
    pub(crate) patterns_exclude_files: Option<TypeMirrorPatternSeq>,
}

impl SpecMirrorPatterns {
    pub(crate) fn from_raw(
        patterns_exclude_dirs: Option<&[String]>,
        patterns_exclude_files: Option<&[String]>,
        rule_pattern: EnumMirrorPatternMode,
    ) -> Result<Self, MirrorTreeError> {
        Ok(Self {
            patterns_exclude_dirs: _compile(patterns_exclude_dirs, rule_pattern)?,
            patterns_exclude_files: _compile(patterns_exclude_files, rule_pattern)?,
        })
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumMirrorPatternMode,
) -> Result<Option<TypeMirrorPatternSeq>, MirrorTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumMirrorPatternMode::Literal => {
            Ok(Some(TypeMirrorPatternSeq::Literal(patterns.to_vec())))
        }
        EnumMirrorPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        MirrorTreeError::InvalidPattern(format!("Invalid exclude pattern: {e}"))
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypeMirrorPatternSeq::Glob(l_glob)))
        }
        EnumMirrorPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    MirrorTreeError::InvalidPattern(format!("Invalid exclude pattern: {e}"))
                })?;
                l_regex.push(regex);
            }
            Ok(Some(TypeMirrorPatternSeq::Regex(l_regex)))
        }
    }
}

pub(crate) fn should_exclude_by_patterns(
    value: &str,
    patterns_exclude: Option<&TypeMirrorPatternSeq>,
) -> bool {
    match patterns_exclude {
        None => false,
        Some(TypeMirrorPatternSeq::Literal(v)) => v.iter().any(|p| value.contains(p.as_str())),
        Some(TypeMirrorPatternSeq::Glob(v)) => v.iter().any(|p| p.is_match(value)),
        Some(TypeMirrorPatternSeq::Regex(v)) => v.iter().any(|p| p.is_match(value)),
    }
}

/// VCS metadata check. Exact basename comparison, independent of the
/// user's pattern mode.
pub(crate) fn is_vcs_dir(name_dir: &str) -> bool {
    NAMES_VCS_DIRS.contains(&name_dir)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// String-level suffix test on a path, so `src/mycompiler` ends with
/// `compiler` while `compiler/sub` does not.
pub(crate) fn path_ends_with_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().ends_with(suffix)
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    _absolutize_path(path)
}

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// The destination usually does not exist yet, so the nearest existing
/// ancestor is canonicalized and the missing tail re-appended.
fn _normalize_path_lenient(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_cursor = path_abs.as_path();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_cursor) {
            return l_tail
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, part| acc.join(part));
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent;
            }
            _ => return path_abs,
        }
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path_lenient(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), MirrorTreeError> {
    let path_dir_dst_root_abs = _absolutize_path(path_dir_dst_root);
    let path_dst_item_abs = _absolutize_path(path_dst_item);

    let path_rel = path_dst_item_abs
        .strip_prefix(&path_dir_dst_root_abs)
        .map_err(|_| {
            MirrorTreeError::UnsafeDestination(format!(
                "Unsafe destination path escapes destination root: {} (root={})",
                path_dst_item.display(),
                path_dir_dst_root.display()
            ))
        })?;

    let mut path_cursor = path_dir_dst_root_abs.clone();
    for part_rel in path_rel.components() {
        path_cursor.push(part_rel.as_os_str());
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta_cursor) => {
                if meta_cursor.file_type().is_symlink() {
                    return Err(MirrorTreeError::UnsafeDestination(format!(
                        "Unsafe destination path traverses symlink component: {}",
                        path_cursor.display()
                    )));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => {
                return Err(MirrorTreeError::UnsafeDestination(format!(
                    "Failed to inspect destination path component {} ({e})",
                    path_cursor.display()
                )));
            }
        }
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DirectoryMaterializer

/// Ensure `path_dir_dst` exists.
///
/// Returns `Ok(true)` when the directory was materialized by this call and
/// `Ok(false)` when it was already known to `set_materialized`. An existing
/// directory on disk is success; an existing non-directory or any other IO
/// failure is fatal.
pub(crate) fn ensure_directory(
    path_dir_dst: &Path,
    set_materialized: &mut HashSet<PathBuf>,
) -> Result<bool, MirrorTreeError> {
    if set_materialized.contains(path_dir_dst) {
        return Ok(false);
    }
    fs::create_dir_all(path_dir_dst).map_err(|e| MirrorTreeError::DirectoryCreateFailed {
        path: path_dir_dst.to_path_buf(),
        message: e.to_string(),
    })?;
    set_materialized.insert(path_dir_dst.to_path_buf());
    Ok(true)
}

/// Copy permission bits from the source file to the rewritten destination.
///
/// The owner-write bit is always kept so a later pass can overwrite the file.
pub(crate) fn copy_permissions(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, _writable_permissions(stat_src.permissions()))
}

/// Make an existing destination file writable before it is overwritten.
/// A missing file is fine.
pub(crate) fn ensure_writable(path_file_dst: &Path) -> io::Result<()> {
    let stat_dst = match fs::symlink_metadata(path_file_dst) {
        Ok(stat_dst) => stat_dst,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !stat_dst.file_type().is_file() {
        return Ok(());
    }
    fs::set_permissions(path_file_dst, _writable_permissions(stat_dst.permissions()))
}

#[cfg(unix)]
fn _writable_permissions(perms: fs::Permissions) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(perms.mode() | 0o200)
}

#[cfg(not(unix))]
fn _writable_permissions(mut perms: fs::Permissions) -> fs::Permissions {
    perms.set_readonly(false);
    perms
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{
        SpecMirrorPatterns, ensure_directory, is_vcs_dir, path_ends_with_suffix,
        should_exclude_by_patterns,
    };
    use crate::spec::{EnumMirrorPatternMode, MirrorTreeError};

    static N_TEST_DIRS: AtomicU64 = AtomicU64::new(0);

    struct TestDir {
        path: PathBuf,
    }

    impl TestDir {
        fn new() -> Self {
            let n = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos();
            let n_seq = N_TEST_DIRS.fetch_add(1, Ordering::SeqCst);
            let path = std::env::temp_dir().join(format!("linkmirror_util_test_{n}_{n_seq}"));
            std::fs::create_dir_all(&path).expect("create test dir");
            Self { path }
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn strings(l_raw: &[&str]) -> Vec<String> {
        l_raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn glob_excludes_vcs_dirs_exactly() {
        let l_raw = strings(&[".git", ".hg"]);
        let spec_pats = SpecMirrorPatterns::from_raw(
            Some(l_raw.as_slice()),
            None,
            EnumMirrorPatternMode::Glob,
        )
        .expect("compile");
        let pats = spec_pats.patterns_exclude_dirs.as_ref();
        assert!(should_exclude_by_patterns(".git", pats));
        assert!(should_exclude_by_patterns(".hg", pats));
        assert!(!should_exclude_by_patterns(".github", pats));
        assert!(!should_exclude_by_patterns("compiler", pats));
    }

    #[test]
    fn vcs_dirs_match_exact_basename_only() {
        assert!(is_vcs_dir(".git"));
        assert!(is_vcs_dir(".hg"));
        assert!(is_vcs_dir(".svn"));
        assert!(!is_vcs_dir(".github"));
        assert!(!is_vcs_dir("xgit"));
        assert!(!is_vcs_dir(".Git"));
    }

    #[test]
    fn literal_mode_matches_substrings() {
        let l_raw = strings(&["_gen"]);
        let spec_pats = SpecMirrorPatterns::from_raw(
            None,
            Some(l_raw.as_slice()),
            EnumMirrorPatternMode::Literal,
        )
        .expect("compile");
        let pats = spec_pats.patterns_exclude_files.as_ref();
        assert!(should_exclude_by_patterns("tokens_gen.h", pats));
        assert!(!should_exclude_by_patterns("tokens.h", pats));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let l_raw = strings(&["("]);
        let err = SpecMirrorPatterns::from_raw(
            Some(l_raw.as_slice()),
            None,
            EnumMirrorPatternMode::Regex,
        )
        .expect_err("invalid regex must fail");
        assert!(matches!(err, MirrorTreeError::InvalidPattern(_)));
    }

    #[test]
    fn empty_pattern_list_excludes_nothing() {
        let l_raw: Vec<String> = Vec::new();
        let spec_pats = SpecMirrorPatterns::from_raw(
            Some(l_raw.as_slice()),
            None,
            EnumMirrorPatternMode::Glob,
        )
        .expect("compile");
        assert!(spec_pats.patterns_exclude_dirs.is_none());
        assert!(!should_exclude_by_patterns(".git", None));
    }

    #[test]
    fn suffix_test_is_string_level() {
        assert!(path_ends_with_suffix(Path::new("/src/hazel/compiler"), "compiler"));
        assert!(path_ends_with_suffix(Path::new("/src/hazel/mycompiler"), "compiler"));
        assert!(!path_ends_with_suffix(Path::new("/src/hazel/compiler/sub"), "compiler"));
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let tmp = TestDir::new();
        let path_dir = tmp.path().join("a/b");
        let mut set_materialized = HashSet::new();

        assert!(ensure_directory(&path_dir, &mut set_materialized).expect("first"));
        assert!(!ensure_directory(&path_dir, &mut set_materialized).expect("second"));

        // Already on disk but unknown to a fresh set: still success.
        let mut set_fresh = HashSet::new();
        assert!(ensure_directory(&path_dir, &mut set_fresh).expect("existing"));
        assert!(path_dir.is_dir());
    }

    #[test]
    fn ensure_directory_fails_on_file() {
        let tmp = TestDir::new();
        let path_file = tmp.path().join("occupied");
        std::fs::write(&path_file, "x").expect("write");

        let err = ensure_directory(&path_file, &mut HashSet::new()).expect_err("must fail");
        assert!(matches!(err, MirrorTreeError::DirectoryCreateFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn copy_permissions_keeps_owner_write() {
        use std::os::unix::fs::PermissionsExt;

        use super::copy_permissions;

        let tmp = TestDir::new();
        let path_src = tmp.path().join("io.h");
        let path_dst = tmp.path().join("io_out.h");
        std::fs::write(&path_src, "x").expect("write src");
        std::fs::write(&path_dst, "x").expect("write dst");
        std::fs::set_permissions(&path_src, std::fs::Permissions::from_mode(0o444))
            .expect("chmod");

        copy_permissions(&path_src, &path_dst).expect("copy permissions");
        let mode = std::fs::metadata(&path_dst).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn ensure_writable_unlocks_read_only_file() {
        use std::os::unix::fs::PermissionsExt;

        use super::ensure_writable;

        let tmp = TestDir::new();
        let path_dst = tmp.path().join("io.h");
        std::fs::write(&path_dst, "x").expect("write");
        std::fs::set_permissions(&path_dst, std::fs::Permissions::from_mode(0o444))
            .expect("chmod");

        ensure_writable(&path_dst).expect("unlock");
        let mode = std::fs::metadata(&path_dst).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        ensure_writable(&tmp.path().join("missing.h")).expect("missing file is fine");
    }
}
