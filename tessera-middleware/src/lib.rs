//! tessera-middleware
//!
//! Guards and storage the orchestrator threads through every fetch:
//!
//! - [`RateLimiter`]: non-blocking token buckets per (provider, capability).
//! - [`CircuitBreaker`]: Closed/Open/HalfOpen failure isolation per
//!   (provider, capability).
//! - [`Cache`]: TTL and schema-version checks over a [`CacheStore`] backend,
//!   with [`MemoryCacheStore`] and [`JsonFileCacheStore`] implementations.
#![warn(missing_docs)]

/// Schema-versioned composite cache.
pub mod cache;
/// Circuit breaker.
pub mod circuit_breaker;
mod keyed;
/// Token-bucket rate limiter.
pub mod rate_limit;

pub use crate::cache::{
    Cache, CacheEntry, CacheLookup, CacheStore, JsonFileCacheStore, MemoryCacheStore,
};
pub use crate::circuit_breaker::{CircuitBreaker, Permit};
pub use crate::rate_limit::RateLimiter;
