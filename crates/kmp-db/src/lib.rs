//! KMP Database: SurrealDB connection management, repository
//! implementations and the active-window manager.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations of the `kmp-core` traits ([`repository`])
//! - The SurrealDB-backed [`SurrealActiveWindowManager`]
//! - Error types ([`DbError`])

mod active_window;
mod connection;
mod error;
pub mod repository;
mod schema;

pub use active_window::SurrealActiveWindowManager;
pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
