//! Tree traversal and mirror orchestration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::policy::{DirectoryPolicy, SuffixDirectoryPolicy};
use crate::report::{ReportMirror, ReportMirrorBuilder, SpecMirrorRecord};
use crate::rewrite::{SpecSubstitutionRule, build_substitution_rules, rewrite_source};
use crate::select::{derive_destination_dir, derive_destination_path, select_file};
use crate::spec::{EnumFileSelection, MirrorTreeError, SpecMirrorOptions};
use crate::util::{
    SpecMirrorPatterns, copy_permissions, ensure_directory, ensure_writable, is_overlap,
    is_vcs_dir, should_exclude_by_patterns, validate_destination_path_safety,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    name_dir: String,
    if_is_symlink: bool,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: String,
    if_is_symlink: bool,
}

struct SpecMirrorContext<'a> {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_mr_options: SpecMirrorOptions,
    spec_mr_pats: SpecMirrorPatterns,
    l_rules: Vec<SpecSubstitutionRule>,
    policy: &'a dyn DirectoryPolicy,
    builder_mr_report: ReportMirrorBuilder,
    set_materialized_dirs: HashSet<PathBuf>,
}

/// Mirror `dir_source` into `dir_destination`, stripping linkage keywords in
/// directories matched by `suffixes_policy_dirs`.
///
/// See [`mirror_tree_with_policy`] for the pass itself.
pub fn mirror_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_mr_options: SpecMirrorOptions,
) -> Result<ReportMirror, MirrorTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let policy = SuffixDirectoryPolicy::new(spec_mr_options.suffixes_policy_dirs.clone());
    mirror_tree_with_policy(dir_source, dir_destination, spec_mr_options, &policy)
}

/// Mirror `dir_source` into `dir_destination` with an explicit directory
/// policy.
///
/// This function performs:
/// 1. Input validation and destination root initialization.
/// 2. A single sequential walk: every visited directory is materialized,
///    every selected file is mapped, read, rewritten and written.
/// 3. Report aggregation.
///
/// Any filesystem failure aborts the pass with [`MirrorTreeError`]; files
/// already written stay in place.
pub fn mirror_tree_with_policy<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_mr_options: SpecMirrorOptions,
    policy: &dyn DirectoryPolicy,
) -> Result<ReportMirror, MirrorTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(MirrorTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(MirrorTreeError::SourceDestinationOverlap {
            source: path_dir_src,
            destination: path_dir_dst,
        });
    }
    if let Ok(meta_dir_dst) = fs::symlink_metadata(&path_dir_dst)
        && meta_dir_dst.file_type().is_symlink()
    {
        return Err(MirrorTreeError::DestinationInitFailed {
            path: path_dir_dst,
            message: "Destination root path must not be a symbolic link.".to_string(),
        });
    }

    let spec_mr_pats = SpecMirrorPatterns::from_raw(
        spec_mr_options.patterns_exclude_dirs.as_deref(),
        spec_mr_options.patterns_exclude_files.as_deref(),
        spec_mr_options.rule_pattern,
    )?;
    let l_rules = build_substitution_rules(&spec_mr_options.spec_rewrite)?;

    let mut set_materialized_dirs = HashSet::new();
    let mut builder_mr_report = ReportMirrorBuilder::default();
    if !spec_mr_options.if_dry_run {
        let if_created = ensure_directory(&path_dir_dst, &mut set_materialized_dirs).map_err(
            |e| match e {
                MirrorTreeError::DirectoryCreateFailed { path, message } => {
                    MirrorTreeError::DestinationInitFailed { path, message }
                }
                other => other,
            },
        )?;
        if if_created {
            builder_mr_report.add_dir();
        }
    }

    let mut spec_mr_ctx = SpecMirrorContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        spec_mr_options,
        spec_mr_pats,
        l_rules,
        policy,
        builder_mr_report,
        set_materialized_dirs,
    };

    walk_directory(&path_dir_src, &mut spec_mr_ctx)?;
    Ok(spec_mr_ctx.builder_mr_report.build())
}

fn materialize_directory(
    path_dir_dst_sub: &Path,
    spec_mr_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    if spec_mr_ctx.set_materialized_dirs.contains(path_dir_dst_sub) {
        return Ok(());
    }
    validate_destination_path_safety(path_dir_dst_sub, &spec_mr_ctx.path_dir_dst)?;

    if spec_mr_ctx.spec_mr_options.if_dry_run {
        spec_mr_ctx
            .set_materialized_dirs
            .insert(path_dir_dst_sub.to_path_buf());
        spec_mr_ctx.builder_mr_report.add_dir();
        return Ok(());
    }

    if ensure_directory(path_dir_dst_sub, &mut spec_mr_ctx.set_materialized_dirs)? {
        log::debug!("Materialized {}", path_dir_dst_sub.display());
        spec_mr_ctx.builder_mr_report.add_dir();
    }
    Ok(())
}

fn walk_directory(
    path_root: &Path,
    spec_mr_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    let path_dir_dst_sub = derive_destination_dir(
        path_root,
        &spec_mr_ctx.path_dir_src,
        &spec_mr_ctx.path_dir_dst,
    );
    materialize_directory(&path_dir_dst_sub, spec_mr_ctx)?;

    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    let map_read_dir_err = |e: std::io::Error| MirrorTreeError::ReadDirectoryFailed {
        path: path_root.to_path_buf(),
        message: e.to_string(),
    };
    for _entry_res in fs::read_dir(path_root).map_err(map_read_dir_err)? {
        let entry = _entry_res.map_err(map_read_dir_err)?;
        let path_entry = entry.path();
        let c_name = entry.file_name().to_string_lossy().to_string();
        let cfg_file_type = entry.file_type().map_err(map_read_dir_err)?;

        let b_is_symlink = cfg_file_type.is_symlink();
        let b_is_dir = cfg_file_type.is_dir() || (b_is_symlink && path_entry.is_dir());
        if b_is_dir {
            l_dirs.push(SpecDirEntry {
                path_dir_src_sub: path_entry,
                name_dir: c_name,
                if_is_symlink: b_is_symlink,
            });
        } else if cfg_file_type.is_file() || b_is_symlink {
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: c_name,
                if_is_symlink: b_is_symlink,
            });
        } else {
            spec_mr_ctx
                .builder_mr_report
                .add_warning(format!("Special file skipped: {}", path_entry.display()));
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    for _file_entry in l_files {
        handle_file_entry(_file_entry, path_root, spec_mr_ctx)?;
    }

    for _dir_entry in l_dirs {
        if is_vcs_dir(&_dir_entry.name_dir) {
            log::debug!("Skipped VCS metadata {}", _dir_entry.path_dir_src_sub.display());
            continue;
        }
        if should_exclude_by_patterns(
            &_dir_entry.name_dir,
            spec_mr_ctx.spec_mr_pats.patterns_exclude_dirs.as_ref(),
        ) {
            log::debug!("Excluded {}", _dir_entry.path_dir_src_sub.display());
            continue;
        }
        if _dir_entry.if_is_symlink {
            spec_mr_ctx.builder_mr_report.add_warning(format!(
                "Symlinked directory not followed: {}",
                _dir_entry.path_dir_src_sub.display()
            ));
            continue;
        }
        walk_directory(&_dir_entry.path_dir_src_sub, spec_mr_ctx)?;
    }

    Ok(())
}

fn handle_file_entry(
    spec_file_entry: SpecFileEntry,
    path_dir_src_sub: &Path,
    spec_mr_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    spec_mr_ctx.builder_mr_report.add_scanned();

    match select_file(
        &spec_file_entry.name_file,
        &spec_mr_ctx.spec_mr_options,
        spec_mr_ctx.spec_mr_pats.patterns_exclude_files.as_ref(),
    ) {
        EnumFileSelection::Unrecognized => return Ok(()),
        EnumFileSelection::Skipped => {
            log::debug!("Skipped {}", spec_file_entry.path_file_src.display());
            spec_mr_ctx.builder_mr_report.add_skipped();
            return Ok(());
        }
        EnumFileSelection::Selected => spec_mr_ctx.builder_mr_report.add_matched(),
    }

    if spec_file_entry.if_is_symlink {
        let meta_file_src_target = fs::metadata(&spec_file_entry.path_file_src).map_err(|e| {
            MirrorTreeError::ReadFailed {
                path: spec_file_entry.path_file_src.clone(),
                message: format!("Broken symlink ({e})"),
            }
        })?;
        if !meta_file_src_target.file_type().is_file() {
            spec_mr_ctx.builder_mr_report.add_warning(format!(
                "Special file target skipped: {}",
                spec_file_entry.path_file_src.display()
            ));
            spec_mr_ctx.builder_mr_report.add_skipped();
            return Ok(());
        }
    }

    let path_file_dst = derive_destination_path(
        &spec_file_entry.path_file_src,
        &spec_mr_ctx.path_dir_src,
        &spec_mr_ctx.path_dir_dst,
        &spec_mr_ctx.spec_mr_options.rules_rename,
    );
    if let Some(path_parent_dst) = path_file_dst.parent() {
        materialize_directory(path_parent_dst, spec_mr_ctx)?;
    }
    validate_destination_path_safety(&path_file_dst, &spec_mr_ctx.path_dir_dst)?;

    let if_stripped = spec_mr_ctx.policy.is_strippable(path_dir_src_sub);
    let content_src = fs::read_to_string(&spec_file_entry.path_file_src).map_err(|e| {
        MirrorTreeError::ReadFailed {
            path: spec_file_entry.path_file_src.clone(),
            message: e.to_string(),
        }
    })?;
    let content_dst = rewrite_source(
        &content_src,
        path_dir_src_sub,
        &spec_mr_ctx.l_rules,
        spec_mr_ctx.policy,
    );

    let record = SpecMirrorRecord {
        path_file_src: spec_file_entry.path_file_src,
        path_file_dst,
        if_stripped,
    };

    if spec_mr_ctx.spec_mr_options.if_dry_run {
        log::info!(
            "Would copy {} -> {}",
            record.path_file_src.display(),
            record.path_file_dst.display()
        );
        spec_mr_ctx.builder_mr_report.add_planned(record);
        return Ok(());
    }
    log::info!(
        "Copying {} -> {}",
        record.path_file_src.display(),
        record.path_file_dst.display()
    );

    let map_write_err = |e: std::io::Error| MirrorTreeError::WriteFailed {
        path: record.path_file_dst.clone(),
        message: e.to_string(),
    };
    ensure_writable(&record.path_file_dst).map_err(map_write_err)?;
    fs::write(&record.path_file_dst, content_dst).map_err(map_write_err)?;
    copy_permissions(&record.path_file_src, &record.path_file_dst).map_err(map_write_err)?;

    spec_mr_ctx.builder_mr_report.add_copied(record);
    Ok(())
}
