//! Tessera answers financial data requests from several upstream providers at
//! once, each guarded and ranked, and assembles one composite record per
//! request.
//!
//! Overview
//! - Routes each (capability, entity) request through a ranked list of
//!   [`ProviderAdapter`]s, configured per capability.
//! - Guards every provider call with a token-bucket [`RateLimiter`] and a
//!   [`CircuitBreaker`], both keyed by (provider, capability).
//! - Normalizes each provider's answer onto a canonical schema and merges
//!   answers first-non-null-wins, recording which provider supplied each field.
//! - Caches composites with a capability-specific TTL and the schema version
//!   they were produced under, so a schema bump invalidates old entries.
//!
//! Key behaviors and trade-offs
//! - Providers are tried strictly in priority order and never raced; lower
//!   fanout and predictable quota usage at the cost of latency when a
//!   preferred provider is slow.
//! - Throttled or open-circuit providers are skipped, never waited on.
//! - The walk stops once the capability's completeness rule holds, so
//!   lower-priority providers are only consulted for missing fields.
//! - Partial composites are successes; only a composite with no field at all
//!   fails, as `CapabilityUnavailable`.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera::{Capability, EntityId, Tessera};
//!
//! let tessera = Tessera::builder()
//!     .with_adapter(finnhub.clone())
//!     .with_adapter(fmp.clone())
//!     .with_adapter(fallback.clone())
//!     .prefer_for(Capability::Fundamentals, &[finnhub, fmp, fallback])
//!     .build()?;
//!
//! let aapl = EntityId::new("AAPL")?;
//! let (record, report) = tessera
//!     .fetch_with_report(Capability::Fundamentals, &aapl)
//!     .await?;
//! println!("roe from {:?}: {}", record.source_of("roe"), report.summary());
//! ```
//!
//! See `tessera/demos/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod fallback;
mod router;

pub use crate::core::{Tessera, TesseraBuilder};

pub use tessera_middleware::{
    Cache, CacheEntry, CacheLookup, CacheStore, CircuitBreaker, JsonFileCacheStore,
    MemoryCacheStore, Permit, RateLimiter,
};

// Re-export core types for convenience
pub use tessera_core::{
    AllCanonicalFields, AttemptOutcome, BreakerConfig, CacheOutcome, Capability, CircuitSnapshot,
    CircuitState, Clock, CompletenessRule, CompositeRecord, EntityId, Exhaustive, FetchReport,
    FieldMap, FieldMaps, FieldName, FnRule, MissReason, NormalizedRecord, Observation,
    ProviderAdapter, ProviderAttempt, ProviderDescriptor, ProviderHealth, ProviderKey,
    RateLimitConfig, RateSnapshot, RawFetchResult, RawValue, RequiredFields, SCHEMA_VERSION,
    SkipReason, SystemClock, TesseraConfig, TesseraError, Transform, TtlPolicy, Value,
};
