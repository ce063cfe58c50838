//! Domain layer containing entities, collaborator contracts and click accounting.
//!
//! The domain layer has no dependency on infrastructure. Storage, the counter
//! store and the identity provider are reached through the traits in
//! [`repositories`] and [`identity`].
//!
//! # Modules
//!
//! - [`entities`] - Short URL record and its visibility rules
//! - [`repositories`] - Storage and counter store contracts
//! - [`identity`] - Credential to subject id resolution contract
//! - [`client_identity`] - Rate-limit key derivation
//! - [`click_event`] - Click event model
//! - [`click_worker`] - Bounded asynchronous click worker
//!
//! # Click Processing Flow
//!
//! 1. Redirect handler resolves the short code
//! 2. [`click_event::ClickEvent`] is pushed onto a bounded channel (non-blocking)
//! 3. [`click_worker::run_click_worker`] applies the increment with bounded retry
//! 4. `click_count` is updated through [`repositories::UrlRepository`]

pub mod click_event;
pub mod click_worker;
pub mod client_identity;
pub mod entities;
pub mod identity;
pub mod repositories;
