use async_trait::async_trait;

use crate::{Capability, EntityId, RawFetchResult, TesseraError};
pub use tessera_types::ProviderKey;

/// An upstream data source.
///
/// Adapters wrap exactly one provider, advertise the capabilities they serve,
/// and return raw results in the provider's own field names and units. They
/// know nothing about other providers, rate limits, or circuit state; the
/// orchestrator owns all of that.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// A stable identifier used in priority lists, guard keys, and provenance
    /// (e.g., "finnhub", "fmp").
    fn name(&self) -> &'static str;

    /// Typed key constructed from the static name.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this adapter serves `capability`.
    ///
    /// Default: returns `false` for every capability. Adapters must explicitly
    /// override this method to declare what they support.
    fn supports(&self, capability: Capability) -> bool {
        let _ = capability;
        false
    }

    /// Fetch `capability` for `entity`.
    ///
    /// Implementations should return `TesseraError::ProviderUnreachable` for
    /// transport failures, `ProviderDataError` for unusable payloads, and
    /// `NotFound` when the provider does not know the entity. Timeouts are
    /// enforced by the caller.
    async fn fetch(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<RawFetchResult, TesseraError>;
}
