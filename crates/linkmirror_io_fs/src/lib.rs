//! `linkmirror_io_fs` v1:
//! Test-tree mirroring engine for the Hazel compiler sources.
//!
//! Copies a source tree into a sibling test tree, renaming the umbrella
//! header and entry point and stripping linkage keywords (`static`,
//! `inline`, `extern`) from files in policy directories, so a test binary
//! can call functions that production builds keep internal.
//!
//! - `mirror`  : traversal and mirror orchestration
//! - `select`  : file selector and path mapper
//! - `rewrite` : ordered text substitution rules
//! - `policy`  : directory policy predicate
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod mirror;
pub mod policy;
pub mod report;
pub mod rewrite;
pub mod select;
pub mod spec;
mod util;

pub use mirror::{mirror_tree, mirror_tree_with_policy};
pub use policy::{DirectoryPolicy, SuffixDirectoryPolicy};
pub use report::{ReportMirror, ReportMirrorBuilder, SpecMirrorRecord};
pub use rewrite::{
    EnumRewriteScope, SpecSubstitutionRule, build_substitution_rules, rewrite_source,
    rewrite_text,
};
pub use spec::{
    EnumFileSelection, EnumMirrorPatternMode, MirrorTreeError, NAMES_VCS_DIRS, SpecMirrorOptions,
    SpecRenameRule, SpecRewriteOptions,
};
