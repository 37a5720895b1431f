//! Mirror report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One written (or, in dry-run, planned) file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMirrorRecord {
    /// Source file path.
    pub path_file_src: PathBuf,
    /// Mapped destination file path.
    pub path_file_dst: PathBuf,
    /// Whether linkage stripping applied to this file.
    pub if_stripped: bool,
}

/// Aggregate counters and diagnostics for one `mirror_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportMirror {
    /// Total scanned file entries.
    pub cnt_scanned: u64,
    /// Number of files accepted by the selector.
    pub cnt_matched: u64,
    /// Number of files written (the copy count).
    pub cnt_copied: u64,
    /// Number of written files that went through linkage stripping.
    pub cnt_stripped: u64,
    /// Number of entries skipped by rule or dry-run.
    pub cnt_skipped: u64,
    /// Number of distinct destination directories materialized.
    pub cnt_dirs: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-file records in traversal order.
    pub records: Vec<SpecMirrorRecord>,
}

impl ReportMirror {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_stripped".to_string(), self.cnt_stripped);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_dirs".to_string(), self.cnt_dirs);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} scanned={} matched={} copied={} stripped={} skipped={} dirs={} warnings={}",
            dict_counts["cnt_scanned"],
            dict_counts["cnt_matched"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_stripped"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_dirs"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MIRROR]"))
    }
}

/// Mutable accumulator for mirror statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportMirrorBuilder {
    /// See [`ReportMirror::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportMirror::cnt_matched`].
    pub cnt_matched: u64,
    /// See [`ReportMirror::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportMirror::cnt_stripped`].
    pub cnt_stripped: u64,
    /// See [`ReportMirror::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportMirror::cnt_dirs`].
    pub cnt_dirs: u64,
    /// See [`ReportMirror::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportMirror::records`].
    pub records: Vec<SpecMirrorRecord>,
}

impl ReportMirrorBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Increment matched count by one.
    pub fn add_matched(&mut self) {
        self.cnt_matched += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Increment materialized directory count by one.
    pub fn add_dir(&mut self) {
        self.cnt_dirs += 1;
    }

    /// Record one written file and bump the copy count.
    pub fn add_copied(&mut self, record: SpecMirrorRecord) {
        self.cnt_copied += 1;
        if record.if_stripped {
            self.cnt_stripped += 1;
        }
        self.records.push(record);
    }

    /// Dry-run: record the file that would be written, count it as skipped.
    pub fn add_planned(&mut self, record: SpecMirrorRecord) {
        self.cnt_skipped += 1;
        self.records.push(record);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportMirror {
        ReportMirror {
            cnt_scanned: self.cnt_scanned,
            cnt_matched: self.cnt_matched,
            cnt_copied: self.cnt_copied,
            cnt_stripped: self.cnt_stripped,
            cnt_skipped: self.cnt_skipped,
            cnt_dirs: self.cnt_dirs,
            warnings: self.warnings,
            records: self.records,
        }
    }
}
