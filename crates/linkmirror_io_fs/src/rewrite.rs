//! Content rewriter: an ordered list of text substitutions folded over the
//! source text.
//!
//! Every rule sees the output of the rule before it. Two rules exist only to
//! undo collateral damage of an earlier blunt rule; they carry the label of
//! the rule they repair in [`SpecSubstitutionRule::repairs`] and sit directly
//! behind it.
//!
//! | # | label                   | scope      | effect                                   |
//! |---|-------------------------|------------|------------------------------------------|
//! | 1 | `identity`              | always     | `hazel` → `HazelInternalTests`           |
//! | 2 | `display-restore`       | always     | `HazelInternalTests Language` → `Hazel Language` |
//! | 3 | `umbrella-header`       | always     | `hazel.h` → `HazelInternalTests.h`       |
//! | 4 | `strip-static-inline`   | policy     | drop `static inline `                    |
//! | 5 | `strip-static`          | policy     | drop `static `                           |
//! | 6 | `strip-inline`          | policy     | drop `inline `                           |
//! | 7 | `strip-extern`          | policy     | drop `extern `                           |
//! | 8 | `linkage-block-restore` | policy     | `"C" {` → `extern "C" {`                 |
//! | 9 | `comment-marker`        | always     | `// "C"` → `// extern "C"`               |
//!
//! Keyword removals are whole-word: the keyword must not continue an
//! identifier (`is_static ` stays). A rule that matches nothing is a no-op.

use std::path::Path;

use regex::{NoExpand, Regex};

use crate::policy::DirectoryPolicy;
use crate::spec::{MirrorTreeError, SpecRewriteOptions};

pub const RULE_IDENTITY: &str = "identity";
pub const RULE_DISPLAY_RESTORE: &str = "display-restore";
pub const RULE_UMBRELLA_HEADER: &str = "umbrella-header";
pub const RULE_STRIP_STATIC_INLINE: &str = "strip-static-inline";
pub const RULE_STRIP_STATIC: &str = "strip-static";
pub const RULE_STRIP_INLINE: &str = "strip-inline";
pub const RULE_STRIP_EXTERN: &str = "strip-extern";
pub const RULE_LINKAGE_BLOCK_RESTORE: &str = "linkage-block-restore";
pub const RULE_COMMENT_MARKER: &str = "comment-marker";

/// Where a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRewriteScope {
    /// Every mirrored file.
    Always,
    /// Only files whose directory passes the [`DirectoryPolicy`].
    PolicyOnly,
}

#[derive(Debug, Clone)]
pub enum TypeRewritePattern {
    /// Plain substring, every occurrence.
    Literal(String),
    /// Whole-word keyword followed by one space.
    Keyword(Regex),
}

#[derive(Debug, Clone)]
pub struct SpecSubstitutionRule {
    pub label: &'static str,
    pub pattern: TypeRewritePattern,
    pub replacement: String,
    pub scope: EnumRewriteScope,
    /// Label of the earlier rule whose over-rewrite this one undoes.
    pub repairs: Option<&'static str>,
}

impl SpecSubstitutionRule {
    pub fn literal(
        label: &'static str,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        scope: EnumRewriteScope,
    ) -> Self {
        Self {
            label,
            pattern: TypeRewritePattern::Literal(pattern.into()),
            replacement: replacement.into(),
            scope,
            repairs: None,
        }
    }

    /// Removal of `keyword ` (one trailing space) in policy directories.
    pub fn strip_keyword(label: &'static str, keyword: &str) -> Result<Self, MirrorTreeError> {
        let regex = Regex::new(&format!(r"\b{} ", regex::escape(keyword))).map_err(|e| {
            MirrorTreeError::InvalidPattern(format!("Invalid keyword `{keyword}`: {e}"))
        })?;
        Ok(Self {
            label,
            pattern: TypeRewritePattern::Keyword(regex),
            replacement: String::new(),
            scope: EnumRewriteScope::PolicyOnly,
            repairs: None,
        })
    }

    pub fn repairing(mut self, label: &'static str) -> Self {
        self.repairs = Some(label);
        self
    }

    pub fn applies(&self, if_policy: bool) -> bool {
        match self.scope {
            EnumRewriteScope::Always => true,
            EnumRewriteScope::PolicyOnly => if_policy,
        }
    }

    pub fn apply(&self, text: String) -> String {
        match &self.pattern {
            TypeRewritePattern::Literal(pattern) => {
                if pattern.is_empty() || !text.contains(pattern.as_str()) {
                    return text;
                }
                text.replace(pattern.as_str(), &self.replacement)
            }
            TypeRewritePattern::Keyword(regex) => {
                if !regex.is_match(&text) {
                    return text;
                }
                regex
                    .replace_all(&text, NoExpand(&self.replacement))
                    .into_owned()
            }
        }
    }
}

/// Build the ordered rule list for one run.
pub fn build_substitution_rules(
    spec_rewrite: &SpecRewriteOptions,
) -> Result<Vec<SpecSubstitutionRule>, MirrorTreeError> {
    use EnumRewriteScope::{Always, PolicyOnly};

    let SpecRewriteOptions {
        token_project,
        token_test,
        display_name,
        display_qualifier,
        name_header_umbrella_src,
        name_header_umbrella_dst,
    } = spec_rewrite;

    Ok(vec![
        SpecSubstitutionRule::literal(RULE_IDENTITY, token_project, token_test, Always),
        SpecSubstitutionRule::literal(
            RULE_DISPLAY_RESTORE,
            format!("{token_test} {display_qualifier}"),
            format!("{display_name} {display_qualifier}"),
            Always,
        )
        .repairing(RULE_IDENTITY),
        SpecSubstitutionRule::literal(
            RULE_UMBRELLA_HEADER,
            name_header_umbrella_src,
            name_header_umbrella_dst,
            Always,
        ),
        // The pair goes first so neither keyword is left dangling on its own.
        SpecSubstitutionRule::strip_keyword(RULE_STRIP_STATIC_INLINE, "static inline")?,
        SpecSubstitutionRule::strip_keyword(RULE_STRIP_STATIC, "static")?,
        SpecSubstitutionRule::strip_keyword(RULE_STRIP_INLINE, "inline")?,
        SpecSubstitutionRule::strip_keyword(RULE_STRIP_EXTERN, "extern")?,
        SpecSubstitutionRule::literal(
            RULE_LINKAGE_BLOCK_RESTORE,
            "\"C\" {",
            "extern \"C\" {",
            PolicyOnly,
        )
        .repairing(RULE_STRIP_EXTERN),
        SpecSubstitutionRule::literal(
            RULE_COMMENT_MARKER,
            "// \"C\"",
            "// extern \"C\"",
            Always,
        ),
    ])
}

/// Fold the applicable rules over `text`.
pub fn rewrite_text(text: &str, l_rules: &[SpecSubstitutionRule], if_policy: bool) -> String {
    l_rules
        .iter()
        .filter(|rule| rule.applies(if_policy))
        .fold(text.to_string(), |acc, rule| rule.apply(acc))
}

/// Rewrite the content of a file living in `path_dir_src`.
pub fn rewrite_source(
    text: &str,
    path_dir_src: &Path,
    l_rules: &[SpecSubstitutionRule],
    policy: &dyn DirectoryPolicy,
) -> String {
    rewrite_text(text, l_rules, policy.is_strippable(path_dir_src))
}
