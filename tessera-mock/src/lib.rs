//! tessera-mock
//!
//! Deterministic provider adapters for tests and demos.
//!
//! - [`MockAdapter`] serves static fixtures for a handful of US tickers and
//!   reacts to the special entities `FAIL` and `TIMEOUT`.
//! - [`DynamicMockAdapter`] is scripted at runtime through a
//!   [`DynamicMockController`] and records every call it receives.
//! - [`ManualClock`] is a wall clock tests can set and advance.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use tessera_core::{Capability, EntityId, ProviderAdapter, RawFetchResult, TesseraError};

mod clock;
mod dynamic;
mod fixtures;

pub use clock::ManualClock;
pub use dynamic::{DynamicMockAdapter, DynamicMockController, MockBehavior};

/// How long the `TIMEOUT` entity stalls before answering.
pub const TIMEOUT_STALL: Duration = Duration::from_secs(300);

/// Fixture-backed adapter serving every capability.
///
/// Entities:
/// - `AAPL`, `MSFT`, `GOOG`: full fixture data under canonical field names.
/// - `FAIL`: fails with `ProviderUnreachable`.
/// - `TIMEOUT`: stalls for [`TIMEOUT_STALL`] so the caller's timeout fires.
/// - anything else: `NotFound`.
#[derive(Debug, Clone, Copy)]
pub struct MockAdapter {
    name: &'static str,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// Adapter named `tessera-mock`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: "tessera-mock",
        }
    }

    /// Adapter with a custom name, for priority tests with several fixtures.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }

    async fn maybe_fail_or_timeout(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<(), TesseraError> {
        match entity.as_str() {
            "FAIL" => Err(TesseraError::unreachable(
                self.name,
                capability,
                "forced failure",
            )),
            "TIMEOUT" => {
                tokio::time::sleep(TIMEOUT_STALL).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn fetch(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<RawFetchResult, TesseraError> {
        self.maybe_fail_or_timeout(capability, entity).await?;
        let fields = fixtures::by_symbol(capability, entity.as_str())
            .ok_or_else(|| TesseraError::not_found(format!("{capability} for {entity}")))?;
        let mut raw = RawFetchResult::new(self.name, capability, entity.clone());
        raw.fields = fields;
        Ok(raw)
    }
}
