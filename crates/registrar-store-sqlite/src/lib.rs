//! SQLite backend for the Registrar store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Multi-step writes (resolve then insert,
//! restore checks, academic-year activation) run inside one closure and one
//! transaction.

mod admin;
mod encode;
mod lifecycle;
mod query;
mod resolve;
mod schema;
mod store;
mod write;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
