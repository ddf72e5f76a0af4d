//! HTTP API layer for enquete-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: survey authoring, response collection, results
//! - **Extractors**: token authentication
//! - **Middleware**: bearer token resolution
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
