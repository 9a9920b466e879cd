//! `SQLite` backend for the transcription store.
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode and pragmas applied to
//!   every connection.
//! - **[`migrations`]**: Version-tracked schema, embedded at compile time.
//! - **[`row_types`]**: Row structs for `rusqlite` mapping.
//! - **[`repositories`]**: Stateless repositories taking `&Connection`.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;

pub use connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use migrations::{current_version, latest_version, run_migrations};
