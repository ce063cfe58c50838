//! Core domain entities.
//!
//! - [`ShortUrl`] - A short code mapped to an original URL
//! - [`NewShortUrl`] - Input for creating a record
//! - [`Visibility`] - Read-time state of a record (visible, expired, gone)

pub mod short_url;

pub use short_url::{NewShortUrl, ShortUrl, Visibility};
