//! Ranked fallback across providers for one (capability, entity) request.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tessera_core::{
    AttemptOutcome, CacheOutcome, Capability, CompositeBuilder, CompositeRecord, EntityId,
    FetchReport, NormalizedRecord, ProviderAdapter, ProviderAttempt, SkipReason, TesseraError,
};
use tessera_middleware::{CacheLookup, Permit};

use crate::Tessera;

impl Tessera {
    /// Fetch `capability` for `entity`, consulting the cache first.
    ///
    /// Behavior and trade-offs:
    /// - A fresh cache entry written under the current schema version is
    ///   returned without contacting any provider.
    /// - Otherwise capable providers are tried strictly in priority order. Each
    ///   passes the circuit breaker, then the rate limiter; a refusal from
    ///   either skips the provider without waiting.
    /// - Every answer is normalized and merged first-non-null-wins, so a
    ///   lower-priority provider only fills fields still missing.
    /// - The walk stops as soon as the capability's completeness rule holds.
    /// - A composite with at least one field is cached and returned, even when
    ///   incomplete.
    ///
    /// # Errors
    /// Returns `Unsupported` when no registered adapter serves `capability`,
    /// and `CapabilityUnavailable` (carrying every provider's error or skip)
    /// when no field could be populated.
    pub async fn fetch(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<CompositeRecord, TesseraError> {
        self.fetch_with_report(capability, entity)
            .await
            .map(|(record, _)| record)
    }

    /// Like [`fetch`](Self::fetch), also returning a per-provider account of
    /// the pass.
    ///
    /// # Errors
    /// Same as [`fetch`](Self::fetch).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tessera::fallback::fetch",
            skip(self),
            fields(capability = %capability, entity = %entity),
        )
    )]
    pub async fn fetch_with_report(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<(CompositeRecord, FetchReport), TesseraError> {
        let candidates = self.ordered_for(capability);
        if candidates.is_empty() {
            return Err(TesseraError::unsupported(capability));
        }
        let rule = self.rule_for(capability);

        let cache_outcome = match &self.cache {
            None => CacheOutcome::Disabled,
            Some(cache) => match cache.get(capability, entity).await {
                CacheLookup::Hit(entry) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(providers = ?entry.providers, "cache hit");

                    let mut report = FetchReport::new(capability, entity.clone(), CacheOutcome::Hit);
                    report.complete = rule.is_complete(entry.record.fields());
                    return Ok((entry.record, report));
                }
                CacheLookup::Miss(reason) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(reason = ?reason, "cache miss");

                    CacheOutcome::Miss(reason)
                }
            },
        };

        let mut report = FetchReport::new(capability, entity.clone(), cache_outcome);
        let mut composite = CompositeBuilder::new(capability, entity.clone());

        for adapter in candidates {
            let name = adapter.name();
            if report.complete {
                report.attempts.push(skipped(name, SkipReason::AlreadyComplete));
                continue;
            }

            let permit = self.breaker.before_call(name, capability);
            let Permit::Allowed { probe } = permit else {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = %name, "skipping: circuit open");

                report.attempts.push(skipped(name, SkipReason::CircuitOpen));
                continue;
            };
            if !self.limiter.try_acquire(name, capability) {
                if probe {
                    self.breaker.release_probe(name, capability);
                }

                #[cfg(feature = "tracing")]
                tracing::debug!(provider = %name, "skipping: rate limited");

                report.attempts.push(skipped(name, SkipReason::RateLimited));
                continue;
            }

            let started = tokio::time::Instant::now();
            let result = self.attempt(adapter, capability, entity, probe).await;
            let duration = started.elapsed();

            #[cfg(feature = "tracing")]
            tracing::debug!(
                provider = %name,
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                ok = result.is_ok(),
                "provider attempt finished"
            );

            let outcome = match result {
                Ok(record) => {
                    let contributed = composite.merge(&record);
                    report.complete = rule.is_complete(composite.fields());
                    AttemptOutcome::Success { contributed }
                }
                Err(e) => AttemptOutcome::Failed(e),
            };
            report.attempts.push(ProviderAttempt {
                provider: name.to_string(),
                outcome,
                duration: Some(duration),
            });
        }

        if composite.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::warn!(summary = %report.summary(), "no provider populated any field");

            return Err(TesseraError::CapabilityUnavailable {
                capability: capability.to_string(),
                entity: entity.to_string(),
                attempts: report
                    .attempts
                    .iter()
                    .filter_map(|a| a.as_error(capability))
                    .collect(),
            });
        }

        let providers: BTreeSet<String> = composite.field_sources().values().cloned().collect();
        let record = composite.finish(self.clock.now(), self.normalizer.schema_version());

        if let Some(cache) = &self.cache
            && let Err(_e) = cache
                .put(
                    capability,
                    entity,
                    record.clone(),
                    providers,
                    self.cfg.ttl_for(capability),
                )
                .await
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "cache write failed; returning uncached result");
        }

        Ok((record, report))
    }

    /// Call one adapter and settle its breaker outcome.
    ///
    /// The call runs on its own task, so the breaker is updated even if the
    /// caller stops waiting. Panics, timeouts, empty responses, and answers
    /// without a single usable field are failures.
    async fn attempt(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        capability: Capability,
        entity: &EntityId,
        probe: bool,
    ) -> Result<NormalizedRecord, TesseraError> {
        let name = adapter.name();
        let entity = entity.clone();
        let timeout = self.cfg.provider_timeout;
        let normalizer = Arc::clone(&self.normalizer);
        let breaker = Arc::clone(&self.breaker);

        let task = tokio::spawn(async move {
            let fetched = Self::provider_call_with_timeout(name, capability, timeout, async {
                AssertUnwindSafe(adapter.fetch(capability, &entity))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(TesseraError::Other(format!(
                            "{name} panicked during {capability} fetch"
                        )))
                    })
            })
            .await;

            let result = fetched.and_then(|raw| {
                if raw.is_empty() {
                    let msg = raw.error.as_deref().unwrap_or("empty response");
                    return Err(TesseraError::data(name, capability, msg));
                }
                let record = normalizer.normalize(name, capability, &raw)?;
                if record.populated() == 0 {
                    return Err(TesseraError::data(name, capability, "no usable fields"));
                }
                Ok(record)
            });

            match (&result, probe) {
                (Ok(_), false) => breaker.record_result(name, capability, true),
                (Ok(_), true) => breaker.record_probe_result(name, capability, true),
                (Err(e), false) if e.counts_against_breaker() => {
                    breaker.record_result(name, capability, false);
                }
                (Err(e), true) if e.counts_against_breaker() => {
                    breaker.record_probe_result(name, capability, false);
                }
                (Err(_), true) => breaker.release_probe(name, capability),
                (Err(_), false) => {}
            }
            result
        });

        task.await.unwrap_or_else(|e| {
            Err(TesseraError::Other(format!(
                "{name} attempt did not complete: {e}"
            )))
        })
    }
}

fn skipped(provider: &str, reason: SkipReason) -> ProviderAttempt {
    ProviderAttempt {
        provider: provider.to_string(),
        outcome: AttemptOutcome::Skipped(reason),
        duration: None,
    }
}
