//! "Reports to" text shown next to an officer.
//!
//! Names and email addresses are emitted as-is; callers supply values that
//! are already safe to embed in HTML.

use kmp_core::error::KmpResult;
use kmp_core::models::officer::Officer;
use kmp_core::repository::{MemberRepository, OfficerRepository};

use crate::config::OfficerConfig;
use crate::hierarchy::{resolve_effective_deputy_to, resolve_effective_reports_to};

/// Render who `officer` currently reports to.
///
/// Yields the Society label when the officer reports to nobody and the
/// not-filled label when every slot it reports to is vacant.
pub async fn format_reports_to<O, M>(
    officers: &O,
    members: &M,
    officer: &Officer,
    config: &OfficerConfig,
) -> KmpResult<String>
where
    O: OfficerRepository,
    M: MemberRepository,
{
    if officer.reports_to_office_id.is_none() && officer.deputy_to_office_id.is_none() {
        return Ok(config.society_label.clone());
    }

    let reports_to = resolve_effective_reports_to(officers, officer).await?;
    let deputy_to = resolve_effective_deputy_to(officers, officer).await?;
    if reports_to.is_empty() && deputy_to.is_empty() {
        return Ok(config.not_filled_label.clone());
    }

    let mut entries = Vec::with_capacity(reports_to.len() + deputy_to.len());
    for holder in reports_to.iter().chain(&deputy_to) {
        let member = members.get_by_id(holder.member_id).await?;
        entries.push(display_entry(&member.sca_name, &holder.email_address));
    }

    Ok(join_unique(entries).unwrap_or_else(|| config.not_filled_label.clone()))
}

/// A mailto link when the office has a contact address, else the bare name.
pub fn display_entry(name: &str, email_address: &str) -> String {
    if email_address.is_empty() {
        name.to_string()
    } else {
        format!("<a href='mailto:{email_address}'>{name}</a>")
    }
}

/// Join entries with `", "`, keeping the first occurrence of each.
/// Returns `None` when there is nothing to show.
pub fn join_unique(entries: impl IntoIterator<Item = String>) -> Option<String> {
    let mut unique: Vec<String> = Vec::new();
    for entry in entries {
        if !unique.contains(&entry) {
            unique.push(entry);
        }
    }

    (!unique.is_empty()).then(|| unique.join(", "))
}
