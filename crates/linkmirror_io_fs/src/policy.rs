//! Directory policy: which source directories get linkage stripping.

use std::path::Path;

use crate::util::path_ends_with_suffix;

/// Predicate over source directory paths.
///
/// Stripping is confined to directories holding functions that tests call
/// directly. Stripping everywhere would produce duplicate symbols once the
/// test tree is linked against the production library.
pub trait DirectoryPolicy {
    fn is_strippable(&self, path_dir_src: &Path) -> bool;
}

impl<F> DirectoryPolicy for F
where
    F: Fn(&Path) -> bool,
{
    fn is_strippable(&self, path_dir_src: &Path) -> bool {
        self(path_dir_src)
    }
}

/// Matches when the directory path ends with one of the suffixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixDirectoryPolicy {
    suffixes: Vec<String>,
}

impl SuffixDirectoryPolicy {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl DirectoryPolicy for SuffixDirectoryPolicy {
    fn is_strippable(&self, path_dir_src: &Path) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| path_ends_with_suffix(path_dir_src, suffix))
    }
}
