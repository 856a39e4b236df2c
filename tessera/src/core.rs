use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tessera_core::completeness::required_fields_known;
use tessera_core::{
    BreakerConfig, Capability, Clock, CompletenessRule, EntityId, FieldMaps, Normalizer,
    ProviderAdapter, ProviderDescriptor, ProviderHealth, RateLimitConfig, RequiredFields,
    SCHEMA_VERSION, SystemClock, TesseraConfig, TesseraError, TtlPolicy, default_rule,
};
use tessera_middleware::{Cache, CacheStore, CircuitBreaker, MemoryCacheStore, RateLimiter};

/// Orchestrator that answers capability requests from a ranked set of
/// providers.
pub struct Tessera {
    pub(crate) adapters: Vec<Arc<dyn ProviderAdapter>>,
    pub(crate) cfg: TesseraConfig,
    pub(crate) normalizer: Arc<Normalizer>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) cache: Option<Cache>,
    pub(crate) rules: HashMap<Capability, Arc<dyn CompletenessRule>>,
    pub(crate) clock: Arc<dyn Clock>,
    descriptors: Vec<ProviderDescriptor>,
}

/// Builder for constructing a `Tessera` orchestrator with custom configuration.
pub struct TesseraBuilder {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    cfg: TesseraConfig,
    field_maps: FieldMaps,
    schema_version: u32,
    rules: HashMap<Capability, Arc<dyn CompletenessRule>>,
    required: HashMap<Capability, RequiredFields>,
    cache_store: Option<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
    limiter: Option<Arc<RateLimiter>>,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl Default for TesseraBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseraBuilder {
    /// Create a new builder with sensible defaults.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no adapters; you must register at least one via [`with_adapter`](Self::with_adapter).
    /// - Defaults: 10-token buckets refilling at 1/s, breakers opening after 3
    ///   consecutive failures for 60s, 5s provider timeout, an in-memory cache,
    ///   and the built-in completeness rule per capability.
    /// - Providers without a field map are read verbatim under canonical names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: vec![],
            cfg: TesseraConfig::default(),
            field_maps: FieldMaps::new(),
            schema_version: SCHEMA_VERSION,
            rules: HashMap::new(),
            required: HashMap::new(),
            cache_store: Some(Arc::new(MemoryCacheStore::default())),
            clock: Arc::new(SystemClock),
            limiter: None,
            breaker: None,
        }
    }

    /// Register a provider adapter.
    ///
    /// Behavior and trade-offs:
    /// - Registration order is used only for capabilities without an explicit
    ///   priority list, and for capable providers missing from that list.
    /// - Names must be unique; `build()` rejects duplicates because guard
    ///   state and provenance are keyed by name.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Replace the whole configuration.
    ///
    /// Priorities set earlier through [`prefer_for`](Self::prefer_for) are
    /// discarded.
    #[must_use]
    pub fn config(mut self, cfg: TesseraConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set preferred providers for a capability using adapter instances.
    ///
    /// Behavior and trade-offs:
    /// - Listed adapters are tried first, in order; capable but unlisted
    ///   adapters remain after them in registration order.
    /// - Type-safe: names come from the adapters themselves.
    #[must_use]
    pub fn prefer_for(
        mut self,
        capability: Capability,
        adapters: &[Arc<dyn ProviderAdapter>],
    ) -> Self {
        let names = adapters.iter().map(|a| a.name().to_string()).collect();
        self.cfg.priorities.insert(capability, names);
        self
    }

    /// Set the per-provider request timeout. Timeouts count as breaker failures.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Override the token bucket for one provider.
    #[must_use]
    pub fn rate_limit(mut self, provider: impl Into<String>, cfg: RateLimitConfig) -> Self {
        self.cfg.rate_limits.insert(provider.into(), cfg);
        self
    }

    /// Override the breaker parameters for one provider.
    #[must_use]
    pub fn breaker(mut self, provider: impl Into<String>, cfg: BreakerConfig) -> Self {
        self.cfg.breakers.insert(provider.into(), cfg);
        self
    }

    /// Override the cache lifetime for a capability.
    #[must_use]
    pub fn ttl(mut self, capability: Capability, policy: TtlPolicy) -> Self {
        self.cfg.ttl.insert(capability, policy);
        self
    }

    /// Provider field maps. Providers without a map for a capability are
    /// read verbatim.
    #[must_use]
    pub fn field_maps(mut self, maps: FieldMaps) -> Self {
        self.field_maps = maps;
        self
    }

    /// Schema version stamped on composites and required of cache entries.
    ///
    /// Defaults to [`SCHEMA_VERSION`]. Bumping it invalidates every cached
    /// entry without touching storage.
    #[must_use]
    pub const fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Inject the completeness rule for a capability.
    #[must_use]
    pub fn completeness(
        mut self,
        capability: Capability,
        rule: Arc<dyn CompletenessRule>,
    ) -> Self {
        self.required.remove(&capability);
        self.rules.insert(capability, rule);
        self
    }

    /// Stop consulting providers once these canonical fields are populated.
    ///
    /// `build()` rejects names outside the capability's schema.
    #[must_use]
    pub fn require_fields(mut self, capability: Capability, fields: &[&'static str]) -> Self {
        let rule = RequiredFields::new(fields.iter().copied());
        self.rules.insert(capability, Arc::new(rule.clone()));
        self.required.insert(capability, rule);
        self
    }

    /// Cache backend. Defaults to a bounded in-memory store.
    #[must_use]
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Disable caching; every fetch runs the provider chain.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache_store = None;
        self
    }

    /// Clock used for cache expiry and `fetched_at` stamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share an existing rate limiter instead of building one from config.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Share an existing circuit breaker instead of building one from config.
    #[must_use]
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Build the `Tessera` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no adapters are registered, two adapters share
    /// a name, a guard parameter is out of range, or a required-fields rule
    /// names a field outside its capability's schema.
    pub fn build(mut self) -> Result<Tessera, TesseraError> {
        if self.adapters.is_empty() {
            return Err(TesseraError::InvalidArg(
                "no adapters registered; add at least one via with_adapter(...)".to_string(),
            ));
        }

        let mut names: HashSet<&'static str> = HashSet::new();
        for a in &self.adapters {
            if !names.insert(a.name()) {
                return Err(TesseraError::InvalidArg(format!(
                    "adapter `{}` registered twice",
                    a.name()
                )));
            }
        }

        self.cfg.validate()?;

        // Drop unknown names and duplicates from priority lists.
        for v in self.cfg.priorities.values_mut() {
            let mut seen: HashSet<String> = HashSet::new();
            v.retain(|n| names.contains(n.as_str()) && seen.insert(n.clone()));
        }

        for (capability, rule) in &self.required {
            if !required_fields_known(*capability, rule) {
                return Err(TesseraError::InvalidArg(format!(
                    "required fields {:?} are not all in the {capability} schema",
                    rule.fields()
                )));
            }
        }

        let mut rules = self.rules;
        for capability in Capability::ALL {
            rules
                .entry(capability)
                .or_insert_with(|| default_rule(capability));
        }

        let descriptors = describe(&self.adapters, &self.cfg.priorities);
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::from_config(&self.cfg)));
        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::from_config(&self.cfg)));
        let cache = self.cache_store.map(|store| {
            Cache::new(store, self.schema_version).with_clock(Arc::clone(&self.clock))
        });

        Ok(Tessera {
            adapters: self.adapters,
            cfg: self.cfg,
            normalizer: Arc::new(
                Normalizer::new(self.field_maps).with_schema_version(self.schema_version),
            ),
            limiter,
            breaker,
            cache,
            rules,
            clock: self.clock,
            descriptors,
        })
    }
}

fn order(
    adapters: &[Arc<dyn ProviderAdapter>],
    priorities: &BTreeMap<Capability, Vec<String>>,
    capability: Capability,
) -> Vec<Arc<dyn ProviderAdapter>> {
    let mut out: Vec<(usize, Arc<dyn ProviderAdapter>)> = adapters
        .iter()
        .filter(|a| a.supports(capability))
        .cloned()
        .enumerate()
        .collect();
    if let Some(pref) = priorities.get(&capability) {
        let pos: HashMap<&str, usize> = pref
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        out.sort_by_key(|(orig_i, a)| {
            (pos.get(a.name()).copied().unwrap_or(usize::MAX), *orig_i)
        });
    }
    out.into_iter().map(|(_, a)| a).collect()
}

fn describe(
    adapters: &[Arc<dyn ProviderAdapter>],
    priorities: &BTreeMap<Capability, Vec<String>>,
) -> Vec<ProviderDescriptor> {
    let mut descriptors: Vec<ProviderDescriptor> = adapters
        .iter()
        .map(|a| ProviderDescriptor {
            name: a.name().to_string(),
            capabilities: BTreeSet::new(),
            priority: BTreeMap::new(),
        })
        .collect();
    for capability in Capability::ALL {
        for (rank, a) in order(adapters, priorities, capability).iter().enumerate() {
            if let Some(d) = descriptors.iter_mut().find(|d| d.name == a.name()) {
                d.capabilities.insert(capability);
                d.priority.insert(capability, rank);
            }
        }
    }
    descriptors
}

impl Tessera {
    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tessera::core::provider_call_with_timeout",
            skip(fut),
            fields(
                provider = provider,
                capability = %capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        provider: &'static str,
        capability: Capability,
        timeout: std::time::Duration,
        fut: Fut,
    ) -> Result<T, TesseraError>
    where
        Fut: core::future::Future<Output = Result<T, TesseraError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(TesseraError::provider_timeout(provider, capability)))
    }

    /// Start building a new `Tessera` instance.
    ///
    /// Typical usage registers adapters, ranks them per capability, and
    /// chooses a cache backend:
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use tessera::{Capability, JsonFileCacheStore, Tessera};
    ///
    /// let finnhub = Arc::new(FinnhubAdapter::new(key));
    /// let fmp = Arc::new(FmpAdapter::new(key));
    ///
    /// let tessera = Tessera::builder()
    ///     .with_adapter(finnhub.clone())
    ///     .with_adapter(fmp.clone())
    ///     .prefer_for(Capability::Fundamentals, &[finnhub, fmp])
    ///     .cache_store(Arc::new(JsonFileCacheStore::new("/var/cache/tessera")))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> TesseraBuilder {
        TesseraBuilder::new()
    }

    /// Adapters that support `capability`, in the order they are tried.
    pub(crate) fn ordered_for(&self, capability: Capability) -> Vec<Arc<dyn ProviderAdapter>> {
        order(&self.adapters, &self.cfg.priorities, capability)
    }

    pub(crate) fn rule_for(&self, capability: Capability) -> Arc<dyn CompletenessRule> {
        self.rules
            .get(&capability)
            .cloned()
            .unwrap_or_else(|| default_rule(capability))
    }

    /// Registered providers with their capabilities and per-capability rank.
    #[must_use]
    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Effective configuration, with priority lists filtered to registered
    /// adapters.
    #[must_use]
    pub const fn config(&self) -> &TesseraConfig {
        &self.cfg
    }

    /// Schema version composites are stamped with.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.normalizer.schema_version()
    }

    /// The rate limiter guarding provider calls.
    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// The circuit breaker guarding provider calls.
    #[must_use]
    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Breaker and limiter state for every provider and capability it serves.
    #[must_use]
    pub fn provider_health(&self) -> Vec<ProviderHealth> {
        let mut out = Vec::new();
        for d in &self.descriptors {
            for &capability in &d.capabilities {
                out.push(ProviderHealth {
                    provider: d.name.clone(),
                    capability,
                    circuit: self.breaker.snapshot(&d.name, capability),
                    rate: self.limiter.snapshot(&d.name, capability),
                });
            }
        }
        out
    }

    /// Drop the cached composite for a key, if caching is enabled.
    ///
    /// # Errors
    /// Returns `Cache` when the backend fails to remove the entry.
    pub async fn invalidate(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<(), TesseraError> {
        match &self.cache {
            Some(cache) => cache.invalidate(capability, entity).await,
            None => Ok(()),
        }
    }
}
