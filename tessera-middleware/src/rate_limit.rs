//! Token-bucket rate limiting per (provider, capability).
//!
//! Each key owns a bucket that refills continuously at `refill_per_second` up
//! to `capacity`. [`RateLimiter::try_acquire`] never waits: it refills from the
//! elapsed time, then spends one token or reports "not now". The orchestrator
//! treats "not now" as a reason to move to the next provider.

use tessera_core::{Capability, RateLimitConfig, RateSnapshot, TesseraConfig};
use tokio::time::Instant;

use crate::keyed::KeyedState;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_second: f64,
    last_refill_at: Instant,
}

impl TokenBucket {
    fn new(cfg: RateLimitConfig) -> Self {
        Self {
            tokens: cfg.capacity,
            capacity: cfg.capacity,
            refill_per_second: cfg.refill_per_second,
            last_refill_at: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill_at).as_secs_f64();
        self.tokens = elapsed
            .mul_add(self.refill_per_second, self.tokens)
            .min(self.capacity);
        self.last_refill_at = now;
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    const fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            tokens: self.tokens,
            capacity: self.capacity,
            refill_per_second: self.refill_per_second,
        }
    }
}

/// Non-blocking token-bucket limiter keyed by (provider, capability).
///
/// Buckets are created on first use from the provider's configuration and
/// live for the lifetime of the limiter.
pub struct RateLimiter {
    cfg: TesseraConfig,
    buckets: KeyedState<TokenBucket>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    /// Limiter where every provider uses `default`.
    #[must_use]
    pub fn new(default: RateLimitConfig) -> Self {
        Self::from_config(&TesseraConfig {
            default_rate_limit: default,
            ..TesseraConfig::default()
        })
    }

    /// Limiter using the default and per-provider limits of `cfg`.
    #[must_use]
    pub fn from_config(cfg: &TesseraConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            buckets: KeyedState::new("rate limiter"),
        }
    }

    /// Set the limit for one provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>, cfg: RateLimitConfig) -> Self {
        self.cfg.rate_limits.insert(provider.into(), cfg);
        self
    }

    /// Configuration in force for `provider`.
    #[must_use]
    pub fn config_for(&self, provider: &str) -> RateLimitConfig {
        self.cfg.rate_limit_for(provider)
    }

    /// Spend one token for (`provider`, `capability`).
    ///
    /// Returns `false` without side effects when less than one token is
    /// available. Refill and deduction happen under the key's lock, so
    /// concurrent callers never double-spend.
    pub fn try_acquire(&self, provider: &str, capability: Capability) -> bool {
        let cfg = self.config_for(provider);
        let bucket = self
            .buckets
            .entry(provider, capability, || TokenBucket::new(cfg));
        let acquired = self.buckets.lock(&bucket).try_acquire(Instant::now());

        #[cfg(feature = "tracing")]
        if !acquired {
            tracing::debug!(
                provider = %provider,
                capability = %capability,
                "rate limiter: no token available"
            );
        }

        acquired
    }

    /// Current bucket state after refill. Unused keys report a full bucket.
    #[must_use]
    pub fn snapshot(&self, provider: &str, capability: Capability) -> RateSnapshot {
        self.buckets.get(provider, capability).map_or_else(
            || TokenBucket::new(self.config_for(provider)).snapshot(),
            |bucket| {
                let mut b = self.buckets.lock(&bucket);
                b.refill(Instant::now());
                b.snapshot()
            },
        )
    }

    /// Refill the bucket for a key to capacity.
    pub fn reset(&self, provider: &str, capability: Capability) {
        self.buckets.remove(provider, capability);
    }
}
