//! Officer service configuration.

use kmp_core::models::branch::MAX_HIERARCHY_DEPTH;

/// Configuration for the officer service.
#[derive(Debug, Clone)]
pub struct OfficerConfig {
    /// Shown when an assignment reports to nobody (top of the hierarchy).
    pub society_label: String,
    /// Shown when the office an assignment reports to is vacant.
    pub not_filled_label: String,
    /// Upper bound on branch and office walks. Defaults to the same bound
    /// the branch store uses for ancestor lookups.
    pub max_hierarchy_depth: usize,
    /// Reason recorded on officers displaced from an
    /// `only_one_per_branch` office.
    pub replaced_reason: String,
}

impl Default for OfficerConfig {
    fn default() -> Self {
        Self {
            society_label: "Society".into(),
            not_filled_label: "Not Filled".into(),
            max_hierarchy_depth: MAX_HIERARCHY_DEPTH,
            replaced_reason: "Replaced by new officer".into(),
        }
    }
}
