//! Circuit breaker per (provider, capability).
//!
//! - **Closed**: calls pass. Consecutive failures are counted; reaching the
//!   threshold opens the circuit. Any success resets the count.
//! - **Open**: calls are rejected without contacting the provider until the
//!   cooldown has elapsed since the circuit opened. The next call after that
//!   moves to HalfOpen and is admitted as the probe.
//! - **HalfOpen**: exactly one probe is in flight; everyone else is rejected.
//!   A successful probe closes the circuit, a failed one reopens it and
//!   restarts the cooldown. Late results of calls admitted before the circuit
//!   opened do not move a HalfOpen circuit.
//!
//! State is in-memory and starts Closed on every process start.

use tessera_core::{
    BreakerConfig, Capability, CircuitSnapshot, CircuitState, TesseraConfig,
};
use tokio::time::Instant;

use crate::keyed::KeyedState;

/// Decision returned by [`CircuitBreaker::before_call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    /// Call may proceed. `probe` is true for the single half-open probe.
    Allowed {
        /// Whether this call is the half-open probe.
        probe: bool,
    },
    /// Call must not reach the provider.
    Rejected,
}

impl Permit {
    /// Whether the call may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_probe_in_flight: bool,
}

impl Circuit {
    const fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            half_open_probe_in_flight: false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.half_open_probe_in_flight = false;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.half_open_probe_in_flight = false;
    }

    fn snapshot(&self, cooldown: std::time::Duration, now: Instant) -> CircuitSnapshot {
        let open_for = self
            .opened_at
            .map(|t| now.saturating_duration_since(t));
        let retry_in = match (self.state, open_for) {
            (CircuitState::Open, Some(elapsed)) => Some(cooldown.saturating_sub(elapsed)),
            _ => None,
        };
        CircuitSnapshot {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            open_for,
            retry_in,
            probe_in_flight: self.half_open_probe_in_flight,
        }
    }
}

/// Failure-isolating state machine keyed by (provider, capability).
pub struct CircuitBreaker {
    cfg: TesseraConfig,
    circuits: KeyedState<Circuit>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl CircuitBreaker {
    /// Breaker where every provider uses `default`.
    #[must_use]
    pub fn new(default: BreakerConfig) -> Self {
        Self::from_config(&TesseraConfig {
            default_breaker: default,
            ..TesseraConfig::default()
        })
    }

    /// Breaker using the default and per-provider settings of `cfg`.
    #[must_use]
    pub fn from_config(cfg: &TesseraConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            circuits: KeyedState::new("circuit breaker"),
        }
    }

    /// Set the breaker parameters for one provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>, cfg: BreakerConfig) -> Self {
        self.cfg.breakers.insert(provider.into(), cfg);
        self
    }

    /// Configuration in force for `provider`.
    #[must_use]
    pub fn config_for(&self, provider: &str) -> BreakerConfig {
        self.cfg.breaker_for(provider)
    }

    /// Ask whether a call to (`provider`, `capability`) may proceed.
    ///
    /// Never blocks. An Open circuit whose cooldown has elapsed moves to
    /// HalfOpen here and the caller becomes the probe; concurrent callers
    /// observe the probe flag and are rejected.
    pub fn before_call(&self, provider: &str, capability: Capability) -> Permit {
        let cfg = self.config_for(provider);
        let circuit = self.circuits.entry(provider, capability, Circuit::new);
        let mut c = self.circuits.lock(&circuit);
        let now = Instant::now();

        match c.state {
            CircuitState::Closed => Permit::Allowed { probe: false },
            CircuitState::Open => {
                let cooled = c
                    .opened_at
                    .is_none_or(|t| now.saturating_duration_since(t) >= cfg.cooldown);
                if !cooled {
                    return Permit::Rejected;
                }
                c.state = CircuitState::HalfOpen;
                c.half_open_probe_in_flight = true;

                #[cfg(feature = "tracing")]
                tracing::info!(
                    provider = %provider,
                    capability = %capability,
                    "circuit breaker: open -> half-open, admitting probe"
                );

                Permit::Allowed { probe: true }
            }
            CircuitState::HalfOpen => {
                if c.half_open_probe_in_flight {
                    Permit::Rejected
                } else {
                    c.half_open_probe_in_flight = true;
                    Permit::Allowed { probe: true }
                }
            }
        }
    }

    /// Report the outcome of a call admitted with `Permit::Allowed { probe: false }`.
    ///
    /// Timeouts and other provider failures are `success == false`. While the
    /// circuit is HalfOpen only the probe decides the next state, so late
    /// results of calls admitted before the circuit opened are ignored.
    pub fn record_result(&self, provider: &str, capability: Capability, success: bool) {
        self.settle(provider, capability, success, false);
    }

    /// Report the outcome of the half-open probe.
    ///
    /// Success closes the circuit; failure reopens it and restarts the
    /// cooldown. If the circuit left HalfOpen meanwhile (a manual reset), the
    /// result counts like any other.
    pub fn record_probe_result(&self, provider: &str, capability: Capability, success: bool) {
        self.settle(provider, capability, success, true);
    }

    fn settle(&self, provider: &str, capability: Capability, success: bool, probe: bool) {
        let cfg = self.config_for(provider);
        let circuit = self.circuits.entry(provider, capability, Circuit::new);
        let mut c = self.circuits.lock(&circuit);
        let now = Instant::now();

        if c.state == CircuitState::HalfOpen && !probe {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                provider = %provider,
                capability = %capability,
                success,
                "circuit breaker: ignoring non-probe result while half-open"
            );
            return;
        }

        if success {
            match c.state {
                CircuitState::Closed => c.consecutive_failures = 0,
                CircuitState::HalfOpen => {
                    c.close();

                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        provider = %provider,
                        capability = %capability,
                        "circuit breaker: probe succeeded, closing"
                    );
                }
                // A call admitted before the circuit opened; it does not
                // shorten the cooldown.
                CircuitState::Open => {}
            }
            return;
        }

        c.consecutive_failures = c.consecutive_failures.saturating_add(1);
        match c.state {
            CircuitState::Closed => {
                if c.consecutive_failures >= cfg.failure_threshold {
                    c.open(now);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        provider = %provider,
                        capability = %capability,
                        failures = c.consecutive_failures,
                        "circuit breaker: opening"
                    );
                }
            }
            CircuitState::HalfOpen => {
                c.open(now);

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    provider = %provider,
                    capability = %capability,
                    "circuit breaker: probe failed, reopening"
                );
            }
            CircuitState::Open => {}
        }
    }

    /// Give back a half-open probe slot that was granted but never used.
    ///
    /// The orchestrator calls this when the rate limiter refuses a call the
    /// breaker had already admitted as the probe, or when the probe ends with
    /// an error that says nothing about the provider. Other states are
    /// unaffected.
    pub fn release_probe(&self, provider: &str, capability: Capability) {
        if let Some(circuit) = self.circuits.get(provider, capability) {
            let mut c = self.circuits.lock(&circuit);
            if c.state == CircuitState::HalfOpen {
                c.half_open_probe_in_flight = false;
            }
        }
    }

    /// Current state of a key. Unused keys are Closed.
    #[must_use]
    pub fn state(&self, provider: &str, capability: Capability) -> CircuitState {
        self.circuits
            .get(provider, capability)
            .map_or(CircuitState::Closed, |circuit| {
                self.circuits.lock(&circuit).state
            })
    }

    /// Point-in-time view of a key.
    #[must_use]
    pub fn snapshot(&self, provider: &str, capability: Capability) -> CircuitSnapshot {
        let cooldown = self.config_for(provider).cooldown;
        let now = Instant::now();
        self.circuits.get(provider, capability).map_or_else(
            || Circuit::new().snapshot(cooldown, now),
            |circuit| self.circuits.lock(&circuit).snapshot(cooldown, now),
        )
    }

    /// Snapshots of every key seen so far.
    #[must_use]
    pub fn snapshots(&self) -> Vec<(String, Capability, CircuitSnapshot)> {
        let now = Instant::now();
        let mut out: Vec<_> = self
            .circuits
            .entries()
            .into_iter()
            .map(|((provider, capability), circuit)| {
                let cooldown = self.config_for(&provider).cooldown;
                let snap = self.circuits.lock(&circuit).snapshot(cooldown, now);
                (provider, capability, snap)
            })
            .collect();
        out.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        out
    }

    /// Force a key back to Closed.
    pub fn reset(&self, provider: &str, capability: Capability) {
        if let Some(circuit) = self.circuits.get(provider, capability) {
            self.circuits.lock(&circuit).close();

            #[cfg(feature = "tracing")]
            tracing::info!(
                provider = %provider,
                capability = %capability,
                "circuit breaker: manual reset"
            );
        }
    }
}
