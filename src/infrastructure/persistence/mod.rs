//! Short URL and API token repository implementations.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - Short URL storage in PostgreSQL
//! - [`PgTokenRepository`] - API token storage and lookup
//! - [`InMemoryUrlRepository`] - Process-local short URL storage

pub mod memory_url_repository;
pub mod pg_token_repository;
pub mod pg_url_repository;

pub use memory_url_repository::InMemoryUrlRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_url_repository::PgUrlRepository;
