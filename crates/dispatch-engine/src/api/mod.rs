//! External collaborator surfaces
//!
//! Each API is a cheap clone over the shared engine: [`AdminApi`] for
//! rule administration and roster sync, [`BreakApi`] for the break UI,
//! [`DispatchClient`] for the lead-ingestion pipeline.

pub mod admin;
pub mod client;

pub use admin::AdminApi;
pub use client::{BreakApi, DispatchClient};
