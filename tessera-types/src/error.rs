use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tessera workspace.
///
/// Provider-level variants are absorbed by the orchestrator and translated
/// into "try the next provider"; only `CapabilityUnavailable` (or argument and
/// configuration errors) reach callers of `Tessera::fetch`.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TesseraError {
    /// Network failure or transport error talking to a provider.
    #[error("{provider} unreachable for {capability}: {msg}")]
    ProviderUnreachable {
        /// Provider name.
        provider: String,
        /// Capability label.
        capability: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A provider call exceeded the configured timeout.
    #[error("provider timed out: {capability} via {provider}")]
    ProviderTimeout {
        /// Provider name that timed out.
        provider: String,
        /// Capability label.
        capability: String,
    },

    /// Local rate limiter refused the call; the provider was never contacted.
    #[error("{provider} throttled locally for {capability}")]
    ProviderRejected {
        /// Provider name.
        provider: String,
        /// Capability label.
        capability: String,
    },

    /// Circuit breaker short-circuited the call.
    #[error("circuit open: {provider} for {capability}")]
    CircuitOpen {
        /// Provider name.
        provider: String,
        /// Capability label.
        capability: String,
    },

    /// The provider answered with a malformed or empty payload.
    #[error("{provider} returned bad data for {capability}: {msg}")]
    ProviderDataError {
        /// Provider name.
        provider: String,
        /// Capability label.
        capability: String,
        /// Description of the problem.
        msg: String,
    },

    /// A resource or entity could not be found upstream.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "fundamentals for ZZZZ".
        what: String,
    },

    /// Every ranked provider was exhausted without producing a single field.
    #[error("{capability} unavailable for {entity} after {} attempt(s)", attempts.len())]
    CapabilityUnavailable {
        /// Capability label.
        capability: String,
        /// Entity identifier.
        entity: String,
        /// Per-provider reasons, in priority order.
        attempts: Vec<TesseraError>,
    },

    /// The requested capability is not implemented by the target adapter.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label describing what was requested.
        capability: String,
    },

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A raw fetch result is structurally unusable (wrong capability, no provider).
    #[error("malformed raw result: {0}")]
    MalformedRaw(String),

    /// Cache backend failure (I/O, serialization).
    #[error("cache error: {0}")]
    Cache(String),

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl TesseraError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `ProviderUnreachable` error.
    pub fn unreachable(
        provider: impl Into<String>,
        capability: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ProviderUnreachable {
            provider: provider.into(),
            capability: capability.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `ProviderRejected` error.
    pub fn rejected(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `CircuitOpen` error.
    pub fn circuit_open(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::CircuitOpen {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `ProviderDataError`.
    pub fn data(
        provider: impl Into<String>,
        capability: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ProviderDataError {
            provider: provider.into(),
            capability: capability.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether this error is evidence that the provider is broken.
    ///
    /// Local decisions (throttling, an already open circuit) and caller
    /// mistakes do not count.
    #[must_use]
    pub const fn counts_against_breaker(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnreachable { .. }
                | Self::ProviderTimeout { .. }
                | Self::ProviderDataError { .. }
                | Self::NotFound { .. }
                | Self::MalformedRaw(_)
                | Self::Other(_)
        )
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Capability absence, benign not-found conditions, and local guard
    /// decisions are not actionable. Aggregates are classified by their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Unsupported { .. }
            | Self::NotFound { .. }
            | Self::ProviderRejected { .. }
            | Self::CircuitOpen { .. } => false,
            Self::CapabilityUnavailable { attempts, .. } => {
                attempts.iter().any(Self::is_actionable)
            }
            _ => true,
        }
    }

    /// Flatten nested `CapabilityUnavailable` attempts into a plain vector.
    ///
    /// Other variants are preserved as-is.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::CapabilityUnavailable { attempts, .. } => {
                attempts.into_iter().flat_map(Self::flatten).collect()
            }
            other => vec![other],
        }
    }

    /// Provider name carried by provider-scoped variants.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderUnreachable { provider, .. }
            | Self::ProviderTimeout { provider, .. }
            | Self::ProviderRejected { provider, .. }
            | Self::CircuitOpen { provider, .. }
            | Self::ProviderDataError { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        Self::Cache(err.to_string())
    }
}
