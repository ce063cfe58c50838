//! Application layer services implementing business logic.
//!
//! Services consume the domain traits and give HTTP handlers and the admin
//! CLI a narrow API.
//!
//! # Available Services
//!
//! - [`services::url_service::UrlService`] - Short URL lifecycle
//! - [`services::rate_limit_service::RateLimiter`] - Fixed-window admission
//! - [`services::auth_service::AuthService`] - API token to subject resolution

pub mod services;
