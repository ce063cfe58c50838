//! Business logic services for the application layer.

pub mod auth_service;
pub mod rate_limit_service;
pub mod url_service;

pub use auth_service::AuthService;
pub use rate_limit_service::{Admission, RateLimitPolicy, RateLimiter};
pub use url_service::UrlService;
