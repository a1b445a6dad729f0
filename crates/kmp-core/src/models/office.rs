//! Office domain model.
//!
//! An office is a position (e.g. "Kingdom Seneschal") independent of who
//! holds it. Offices form their own hierarchy: an office either stands on its
//! own, reports to another office, or is a deputy of another office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an office sits in the office hierarchy.
///
/// A deputy always reports to its principal, and an office that reports
/// directly to another cannot also be a deputy. Both fields of the stored
/// representation are derived from this value, never set independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OfficeHierarchy {
    /// Top of the office hierarchy; holders report to the Society.
    #[default]
    Independent,
    /// Reports to the given office in an ancestor branch.
    ReportsTo(Uuid),
    /// Deputy of the given office within the same branch.
    DeputyTo(Uuid),
}

impl OfficeHierarchy {
    /// Rebuild from stored `deputy_to_id` / `reports_to_id` columns.
    ///
    /// A deputy link wins over a conflicting reports-to link.
    pub fn from_parts(deputy_to_id: Option<Uuid>, reports_to_id: Option<Uuid>) -> Self {
        match (deputy_to_id, reports_to_id) {
            (Some(principal), _) => OfficeHierarchy::DeputyTo(principal),
            (None, Some(superior)) => OfficeHierarchy::ReportsTo(superior),
            (None, None) => OfficeHierarchy::Independent,
        }
    }

    pub fn deputy_to_id(&self) -> Option<Uuid> {
        match self {
            OfficeHierarchy::DeputyTo(id) => Some(*id),
            _ => None,
        }
    }

    pub fn reports_to_id(&self) -> Option<Uuid> {
        match self {
            OfficeHierarchy::ReportsTo(id) | OfficeHierarchy::DeputyTo(id) => Some(*id),
            OfficeHierarchy::Independent => None,
        }
    }

    /// Whether this hierarchy points at `office_id`.
    pub fn references(&self, office_id: Uuid) -> bool {
        self.reports_to_id() == Some(office_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
    pub requires_warrant: bool,
    /// Every applicable branch is expected to fill this office.
    pub required_office: bool,
    /// Appointing a new holder replaces the current one.
    pub only_one_per_branch: bool,
    /// Holders may report past vacant ancestor branches.
    pub can_skip_report: bool,
    pub hierarchy: OfficeHierarchy,
    pub grants_role_id: Option<Uuid>,
    /// Term length in months; `0` means open-ended.
    pub term_length: u32,
    pub applicable_branch_types: Vec<String>,
    pub default_contact_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Office {
    pub fn is_deputy(&self) -> bool {
        self.deputy_to_id().is_some()
    }

    pub fn deputy_to_id(&self) -> Option<Uuid> {
        self.hierarchy.deputy_to_id()
    }

    pub fn reports_to_id(&self) -> Option<Uuid> {
        self.hierarchy.reports_to_id()
    }

    pub fn applies_to(&self, branch_type: &str) -> bool {
        self.applicable_branch_types.is_empty()
            || self.applicable_branch_types.iter().any(|t| t == branch_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOffice {
    pub name: String,
    pub department_id: Uuid,
    pub requires_warrant: bool,
    pub required_office: bool,
    pub only_one_per_branch: bool,
    pub can_skip_report: bool,
    pub hierarchy: OfficeHierarchy,
    pub grants_role_id: Option<Uuid>,
    pub term_length: u32,
    pub applicable_branch_types: Vec<String>,
    pub default_contact_address: Option<String>,
}

impl CreateOffice {
    /// A standalone office with no flags set.
    pub fn new(name: impl Into<String>, department_id: Uuid, term_length: u32) -> Self {
        Self {
            name: name.into(),
            department_id,
            requires_warrant: false,
            required_office: false,
            only_one_per_branch: false,
            can_skip_report: false,
            hierarchy: OfficeHierarchy::Independent,
            grants_role_id: None,
            term_length,
            applicable_branch_types: Vec::new(),
            default_contact_address: None,
        }
    }

    pub fn reporting_to(mut self, superior: Uuid) -> Self {
        self.hierarchy = OfficeHierarchy::ReportsTo(superior);
        self
    }

    pub fn deputy_of(mut self, principal: Uuid) -> Self {
        self.hierarchy = OfficeHierarchy::DeputyTo(principal);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOffice {
    pub name: Option<String>,
    pub department_id: Option<Uuid>,
    pub requires_warrant: Option<bool>,
    pub required_office: Option<bool>,
    pub only_one_per_branch: Option<bool>,
    pub can_skip_report: Option<bool>,
    /// Replaces both hierarchy links at once.
    pub hierarchy: Option<OfficeHierarchy>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub grants_role_id: Option<Option<Uuid>>,
    pub term_length: Option<u32>,
    pub applicable_branch_types: Option<Vec<String>>,
    pub default_contact_address: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deputy_reports_to_principal() {
        let principal = Uuid::new_v4();
        let hierarchy = OfficeHierarchy::DeputyTo(principal);
        assert_eq!(hierarchy.deputy_to_id(), Some(principal));
        assert_eq!(hierarchy.reports_to_id(), Some(principal));
    }

    #[test]
    fn reports_to_clears_deputy() {
        let superior = Uuid::new_v4();
        let hierarchy = OfficeHierarchy::ReportsTo(superior);
        assert_eq!(hierarchy.deputy_to_id(), None);
        assert_eq!(hierarchy.reports_to_id(), Some(superior));
    }

    #[test]
    fn stored_deputy_wins_over_conflicting_reports_to() {
        let principal = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            OfficeHierarchy::from_parts(Some(principal), Some(other)),
            OfficeHierarchy::DeputyTo(principal)
        );
        assert_eq!(
            OfficeHierarchy::from_parts(None, Some(other)),
            OfficeHierarchy::ReportsTo(other)
        );
        assert_eq!(
            OfficeHierarchy::from_parts(None, None),
            OfficeHierarchy::Independent
        );
    }

    #[test]
    fn builder_switches_hierarchy() {
        let dept = Uuid::new_v4();
        let principal = Uuid::new_v4();
        let input = CreateOffice::new("Deputy Seneschal", dept, 24).deputy_of(principal);
        assert_eq!(input.hierarchy.reports_to_id(), Some(principal));

        let superior = Uuid::new_v4();
        let input = input.reporting_to(superior);
        assert_eq!(input.hierarchy.deputy_to_id(), None);
        assert_eq!(input.hierarchy.reports_to_id(), Some(superior));
    }
}
