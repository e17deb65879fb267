//! Database models for jobsync.
//!
//! These models map directly to the database schema. Timestamps are stored
//! as RFC3339 strings so their string order matches their time order.

pub mod job_record;
pub mod queue_job;
pub mod sync_status;
pub mod token;

pub use job_record::*;
pub use queue_job::*;
pub use sync_status::*;
pub use token::*;
