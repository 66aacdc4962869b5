//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters for one `copy_tree` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportCopy {
    /// Folders discovered, including the root task.
    pub cnt_expected: u64,
    /// Copy tasks fully processed.
    pub cnt_inspected: u64,
    /// Folders created under the destination root.
    pub cnt_folders_created: u64,
    /// Files copied.
    pub cnt_files_copied: u64,
    /// Set once every discovered task was inspected.
    pub if_complete: bool,
    /// Non-fatal warnings collected during the run.
    pub warnings: Vec<String>,
}

impl ReportCopy {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_expected".to_string(), self.cnt_expected);
        dict_counts.insert("cnt_inspected".to_string(), self.cnt_inspected);
        dict_counts.insert("cnt_folders_created".to_string(), self.cnt_folders_created);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} inspected={}/{} folders={} files={} warnings={} complete={}",
            dict_counts["cnt_inspected"],
            dict_counts["cnt_expected"],
            dict_counts["cnt_folders_created"],
            dict_counts["cnt_files_copied"],
            dict_counts["cnt_warnings"],
            self.if_complete
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    /// See [`ReportCopy::cnt_expected`].
    pub cnt_expected: u64,
    /// See [`ReportCopy::cnt_inspected`].
    pub cnt_inspected: u64,
    /// See [`ReportCopy::cnt_folders_created`].
    pub cnt_folders_created: u64,
    /// See [`ReportCopy::cnt_files_copied`].
    pub cnt_files_copied: u64,
    /// See [`ReportCopy::warnings`].
    pub warnings: Vec<String>,
}

impl ReportCopyBuilder {
    /// Record one newly discovered folder (a task that must still be inspected).
    pub fn add_expected(&mut self) {
        self.cnt_expected += 1;
    }

    /// Record one fully processed task.
    pub fn add_inspected(&mut self) {
        self.cnt_inspected += 1;
    }

    pub fn add_folder_created(&mut self) {
        self.cnt_folders_created += 1;
    }

    pub fn add_files_copied(&mut self, value: u64) {
        self.cnt_files_copied += value;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    ///
    /// Completion is derived, never set directly: the run is complete only when
    /// every discovered task has been inspected.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_expected: self.cnt_expected,
            cnt_inspected: self.cnt_inspected,
            cnt_folders_created: self.cnt_folders_created,
            cnt_files_copied: self.cnt_files_copied,
            if_complete: self.cnt_expected > 0 && self.cnt_inspected == self.cnt_expected,
            warnings: self.warnings,
        }
    }
}
