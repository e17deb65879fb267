//! Repository layer for database access.
//!
//! This module implements the Repository Pattern to abstract all database
//! interactions, creating a clean and maintainable data access layer.

pub mod job_records;
pub mod queue;
pub mod sync_status;
pub mod tokens;

pub use job_records::*;
pub use queue::*;
pub use sync_status::*;
pub use tokens::*;
