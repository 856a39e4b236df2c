//! Report envelopes produced by the orchestrator and its guards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Capability, EntityId, FieldName, TesseraError};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Provider is failing; calls are rejected until the cooldown elapses.
    Open,
    /// Cooldown elapsed; a single probe decides whether to close again.
    HalfOpen,
}

impl core::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        })
    }
}

/// Point-in-time view of one (provider, capability) circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Time since the circuit last opened, while it is Open or HalfOpen.
    pub open_for: Option<Duration>,
    /// Remaining cooldown before a probe is admitted (Open only).
    pub retry_in: Option<Duration>,
    /// Whether a half-open probe is currently outstanding.
    pub probe_in_flight: bool,
}

/// Point-in-time view of one (provider, capability) token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Tokens available right now (after refill).
    pub tokens: f64,
    /// Bucket capacity.
    pub capacity: f64,
    /// Refill rate in tokens per second.
    pub refill_per_second: f64,
}

/// Guard state of a provider for one capability, for operational visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Provider name.
    pub provider: String,
    /// Capability the guards are scoped to.
    pub capability: Capability,
    /// Circuit breaker state.
    pub circuit: CircuitSnapshot,
    /// Rate limiter state.
    pub rate: RateSnapshot,
}

/// Why a cache lookup did not produce a usable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissReason {
    /// Nothing stored for the key (or the stored entry was unreadable).
    Absent,
    /// Entry exists but its expiry has passed.
    Expired,
    /// Entry was produced under a different normalization schema.
    SchemaStale {
        /// Schema version stored with the entry.
        found: u32,
        /// Schema version of the running normalizer.
        current: u32,
    },
}

/// Cache involvement in one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheOutcome {
    /// Served from cache; no provider was contacted.
    Hit,
    /// Looked up and missed; providers were consulted.
    Miss(MissReason),
    /// Caching is disabled for this capability.
    Disabled,
}

/// Why a provider was not invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Circuit breaker rejected the call.
    CircuitOpen,
    /// Local token bucket was empty.
    RateLimited,
    /// The composite became complete before this provider's turn.
    AlreadyComplete,
}

/// Result of considering one provider during a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Provider answered and was merged.
    Success {
        /// Fields this provider was the first to populate.
        contributed: Vec<FieldName>,
    },
    /// Provider was called and failed.
    Failed(TesseraError),
    /// Provider was not called.
    Skipped(SkipReason),
}

/// Record of a single provider during a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Provider name.
    pub provider: String,
    /// What happened.
    pub outcome: AttemptOutcome,
    /// Wall-clock duration of the adapter call, when one was made.
    pub duration: Option<Duration>,
}

impl ProviderAttempt {
    /// Whether the provider's answer was merged.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success { .. })
    }

    /// Error for failed attempts, or the equivalent error for skipped ones.
    ///
    /// Used to build `CapabilityUnavailable`.
    #[must_use]
    pub fn as_error(&self, capability: Capability) -> Option<TesseraError> {
        match &self.outcome {
            AttemptOutcome::Success { .. } | AttemptOutcome::Skipped(SkipReason::AlreadyComplete) => {
                None
            }
            AttemptOutcome::Failed(e) => Some(e.clone()),
            AttemptOutcome::Skipped(SkipReason::CircuitOpen) => Some(TesseraError::circuit_open(
                self.provider.clone(),
                capability.as_str(),
            )),
            AttemptOutcome::Skipped(SkipReason::RateLimited) => Some(TesseraError::rejected(
                self.provider.clone(),
                capability.as_str(),
            )),
        }
    }
}

/// Diagnostics for one orchestrated fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    /// Capability requested.
    pub capability: Capability,
    /// Entity requested.
    pub entity: EntityId,
    /// Cache involvement.
    pub cache: CacheOutcome,
    /// Providers considered, in priority order. Empty on a cache hit.
    pub attempts: Vec<ProviderAttempt>,
    /// Whether the completeness rule was satisfied.
    pub complete: bool,
}

impl FetchReport {
    /// Start an empty report.
    #[must_use]
    pub const fn new(capability: Capability, entity: EntityId, cache: CacheOutcome) -> Self {
        Self {
            capability,
            entity,
            cache,
            attempts: Vec::new(),
            complete: false,
        }
    }

    /// Providers whose adapter was actually invoked.
    pub fn invoked(&self) -> impl Iterator<Item = &str> {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, AttemptOutcome::Skipped(_)))
            .map(|a| a.provider.as_str())
    }

    /// Skip reasons, by provider.
    pub fn skips(&self) -> impl Iterator<Item = (&str, SkipReason)> {
        self.attempts.iter().filter_map(|a| match a.outcome {
            AttemptOutcome::Skipped(r) => Some((a.provider.as_str(), r)),
            _ => None,
        })
    }

    /// Errors, by provider.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &TesseraError)> {
        self.attempts.iter().filter_map(|a| match &a.outcome {
            AttemptOutcome::Failed(e) => Some((a.provider.as_str(), e)),
            _ => None,
        })
    }

    /// One-line summary for logs, e.g. `finnhub: ok(1) -> fmp: ok(2) -> fallback: skipped(AlreadyComplete)`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.cache == CacheOutcome::Hit {
            return "cache: hit".to_string();
        }
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Success { contributed } => {
                    format!("{}: ok({})", a.provider, contributed.len())
                }
                AttemptOutcome::Failed(e) => format!("{}: error({e})", a.provider),
                AttemptOutcome::Skipped(r) => format!("{}: skipped({r:?})", a.provider),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
