//! REST API layer for HTTP request/response handling.
//!
//! # Modules
//!
//! - [`dto`] - Request/response payloads
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Identity, rate limiting and tracing middleware
//! - [`routes`] - Route composition for `/api`

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
