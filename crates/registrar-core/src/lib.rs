//! Core types and trait definitions for the Registrar school-records store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod academic_year;
pub mod admin;
pub mod course;
pub mod department;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod person;
pub mod query;
pub mod reference;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
