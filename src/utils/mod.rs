//! Utility functions shared across layers.
//!
//! - [`code_generator`] - Random short code generation
//! - [`url_validator`] - Destination URL validation
//! - [`db_error`] - Database error classification

pub mod code_generator;
pub mod db_error;
pub mod url_validator;
