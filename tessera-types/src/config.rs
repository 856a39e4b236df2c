//! Configuration types shared across the orchestrator, guards, and cache.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Capability, TesseraError};

/// Token-bucket parameters for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of tokens the bucket holds (burst size).
    pub capacity: f64,
    /// Tokens added per second of elapsed wall-clock time.
    pub refill_per_second: f64,
}

impl RateLimitConfig {
    /// Bucket that allows `per_minute` calls per minute with a burst of `burst`.
    #[must_use]
    pub fn per_minute(per_minute: u32, burst: u32) -> Self {
        Self {
            capacity: f64::from(burst),
            refill_per_second: f64::from(per_minute) / 60.0,
        }
    }

    /// # Errors
    /// Returns `InvalidArg` when capacity is below one token or the refill rate
    /// is negative or non-finite.
    pub fn validate(&self) -> Result<(), TesseraError> {
        if !self.capacity.is_finite() || self.capacity < 1.0 {
            return Err(TesseraError::InvalidArg(format!(
                "rate limit capacity must be >= 1, got {}",
                self.capacity
            )));
        }
        if !self.refill_per_second.is_finite() || self.refill_per_second < 0.0 {
            return Err(TesseraError::InvalidArg(format!(
                "rate limit refill must be finite and >= 0, got {}",
                self.refill_per_second
            )));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_per_second: 1.0,
        }
    }
}

/// Circuit breaker parameters for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker open.
    pub failure_threshold: u32,
    /// Time the breaker stays open before admitting a half-open probe.
    pub cooldown: Duration,
}

impl BreakerConfig {
    /// # Errors
    /// Returns `InvalidArg` when the failure threshold is zero.
    pub fn validate(&self) -> Result<(), TesseraError> {
        if self.failure_threshold == 0 {
            return Err(TesseraError::InvalidArg(
                "breaker failure_threshold must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// How long a cached composite stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TtlPolicy {
    /// Never cache this capability.
    Disabled,
    /// Fixed lifetime from the moment of writing.
    Fixed(Duration),
    /// Expire at the next weekday session close in `timezone`.
    ///
    /// Suited to end-of-day series: the upstream data cannot change before
    /// the next close, and changes right after it.
    UntilNextClose {
        /// Exchange timezone.
        timezone: Tz,
        /// Local close hour (0-23).
        hour: u32,
        /// Local close minute (0-59).
        minute: u32,
    },
}

impl TtlPolicy {
    /// Session close of the US equity markets (16:00 New York time).
    pub const US_EQUITY_CLOSE: Self = Self::UntilNextClose {
        timezone: chrono_tz::America::New_York,
        hour: 16,
        minute: 0,
    };

    /// Expiry instant for an entry written at `now`, or `None` when disabled.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::Disabled => None,
            Self::Fixed(d) if d.is_zero() => None,
            Self::Fixed(d) => chrono::Duration::from_std(d)
                .ok()
                .and_then(|d| now.checked_add_signed(d)),
            Self::UntilNextClose {
                timezone,
                hour,
                minute,
            } => Some(next_close(now, timezone, hour, minute)),
        }
    }
}

fn next_close(now: DateTime<Utc>, tz: Tz, hour: u32, minute: u32) -> DateTime<Utc> {
    let close = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let mut day = now.with_timezone(&tz).date_naive();
    // A week of candidates always contains a weekday close after `now`.
    for _ in 0..8 {
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        if !weekend
            && let Some(local) = tz.from_local_datetime(&day.and_time(close)).earliest()
        {
            let utc = local.with_timezone(&Utc);
            if utc > now {
                return utc;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    now + chrono::Duration::hours(24)
}

/// Global configuration for the `Tessera` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Provider order per capability. Listed providers are tried first, in
    /// order; capable but unlisted providers follow in registration order.
    pub priorities: BTreeMap<Capability, Vec<String>>,
    /// Per-provider token-bucket overrides.
    pub rate_limits: HashMap<String, RateLimitConfig>,
    /// Bucket used for providers without an override.
    pub default_rate_limit: RateLimitConfig,
    /// Per-provider circuit breaker overrides.
    pub breakers: HashMap<String, BreakerConfig>,
    /// Breaker used for providers without an override.
    pub default_breaker: BreakerConfig,
    /// Per-capability cache lifetime overrides.
    pub ttl: BTreeMap<Capability, TtlPolicy>,
    /// Timeout for individual adapter calls.
    pub provider_timeout: Duration,
}

impl TesseraConfig {
    /// Cache lifetime for a capability, falling back to built-in defaults.
    ///
    /// Defaults: fundamentals and profile 24h, quote 60s, intraday 5m, batch
    /// scans 15m, price history until the next US equity close.
    #[must_use]
    pub fn ttl_for(&self, capability: Capability) -> TtlPolicy {
        if let Some(p) = self.ttl.get(&capability) {
            return *p;
        }
        match capability {
            Capability::Fundamentals | Capability::Profile => {
                TtlPolicy::Fixed(Duration::from_secs(24 * 60 * 60))
            }
            Capability::Quote => TtlPolicy::Fixed(Duration::from_secs(60)),
            Capability::IntradaySeries => TtlPolicy::Fixed(Duration::from_secs(5 * 60)),
            Capability::BatchScan => TtlPolicy::Fixed(Duration::from_secs(15 * 60)),
            Capability::PriceHistory => TtlPolicy::US_EQUITY_CLOSE,
        }
    }

    /// Token bucket for a provider.
    #[must_use]
    pub fn rate_limit_for(&self, provider: &str) -> RateLimitConfig {
        self.rate_limits
            .get(provider)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    /// Breaker parameters for a provider.
    #[must_use]
    pub fn breaker_for(&self, provider: &str) -> BreakerConfig {
        self.breakers
            .get(provider)
            .copied()
            .unwrap_or(self.default_breaker)
    }

    /// Validate every guard parameter.
    ///
    /// # Errors
    /// Returns the first `InvalidArg` found.
    pub fn validate(&self) -> Result<(), TesseraError> {
        self.default_rate_limit.validate()?;
        self.default_breaker.validate()?;
        for cfg in self.rate_limits.values() {
            cfg.validate()?;
        }
        for cfg in self.breakers.values() {
            cfg.validate()?;
        }
        if self.provider_timeout.is_zero() {
            return Err(TesseraError::InvalidArg(
                "provider_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            priorities: BTreeMap::new(),
            rate_limits: HashMap::new(),
            default_rate_limit: RateLimitConfig::default(),
            breakers: HashMap::new(),
            default_breaker: BreakerConfig::default(),
            ttl: BTreeMap::new(),
            provider_timeout: Duration::from_secs(5),
        }
    }
}
