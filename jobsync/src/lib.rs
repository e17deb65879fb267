//! jobsync library crate.
//!
//! This module exposes the core functionality for integration testing.

pub mod api;
pub mod database;
pub mod error;
pub mod mailsource;
pub mod scanner;
pub mod vault;
pub mod worker;

pub use error::{Error, Result};
