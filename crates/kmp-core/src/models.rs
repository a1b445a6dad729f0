//! Domain models for KMP officers.
//!
//! These are the core types shared across all crates.

pub mod branch;
pub mod department;
pub mod member;
pub mod member_role;
pub mod office;
pub mod officer;
pub mod window;
