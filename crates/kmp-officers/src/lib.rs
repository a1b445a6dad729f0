//! KMP Officers: officer assignment, reporting-hierarchy resolution and
//! the "reports to" display.

pub mod config;
pub mod display;
pub mod error;
pub mod hierarchy;
pub mod reporting;
pub mod service;

pub use config::OfficerConfig;
pub use error::OfficerError;
pub use service::{
    AssignOfficer, OfficerService, RecalculateSummary, ReleaseOfficer, SyncSummary,
};
