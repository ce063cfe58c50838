//! Counter store implementations for the rate limiter.
//!
//! # Implementations
//!
//! - [`RedisCounterStore`] - Shared Redis counters (production)
//! - [`InMemoryCounterStore`] - Per-process counters (development, tests, fallback)

pub mod memory;
pub mod redis_counter_store;

pub use memory::InMemoryCounterStore;
pub use redis_counter_store::RedisCounterStore;
