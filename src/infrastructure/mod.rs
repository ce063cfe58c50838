//! Infrastructure layer for external integrations.
//!
//! Concrete implementations of the domain traits.
//!
//! # Modules
//!
//! - [`counter`] - Rate-limit counter stores (Redis and in-memory)
//! - [`persistence`] - PostgreSQL and in-memory repositories

pub mod counter;
pub mod persistence;
