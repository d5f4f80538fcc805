//! SQLite scheduling store for weft.
//!
//! Persists activity-scheduled events so a worker process can pick them up,
//! lease them and complete them across restarts.

mod schema;
mod store;

pub use store::SqliteActivityStore;
