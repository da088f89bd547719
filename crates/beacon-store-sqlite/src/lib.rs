//! SQLite backend for the Beacon alert store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-step write (status CAS,
//! claim, location append) is one SQLite transaction; the one-open-alert-
//! per-owner invariant is a partial unique index, so it holds even under
//! racing creates.

mod encode;
mod schema;
mod store;

pub mod error;

pub use store::SqliteStore;
