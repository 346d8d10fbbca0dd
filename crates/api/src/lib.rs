//! HTTP API layer for foodgram.
//!
//! This crate provides the REST API served under `/api`:
//!
//! - **Endpoints**: auth, users, tags, ingredients and recipes
//! - **Extractors**: token authentication, recipe payloads (JSON or multipart)
//! - **Pagination**: page-number envelopes for list endpoints
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod pagination;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
