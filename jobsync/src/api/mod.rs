//! REST API server module.
//!
//! Provides HTTP endpoints for connecting a mailbox, running on-demand
//! scans, and monitoring the initial import.

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
