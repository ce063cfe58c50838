//! Collaborator contracts for the domain layer.
//!
//! These traits abstract storage and shared state so the URL service and the
//! rate limiter can be exercised against in-memory fakes or `mockall` mocks.
//! Concrete implementations live in `crate::infrastructure`.
//!
//! - [`UrlRepository`] - Short URL persistence
//! - [`TokenRepository`] - API token lookup for identity resolution
//! - [`CounterStore`] - Atomic increment-with-expiry for rate limiting

pub mod counter_store;
pub mod token_repository;
pub mod url_repository;

pub use counter_store::CounterStore;
pub use token_repository::{ApiToken, TokenRepository};
pub use url_repository::UrlRepository;

#[cfg(test)]
pub use counter_store::MockCounterStore;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use url_repository::MockUrlRepository;
