use std::collections::BTreeMap;

use super::{FieldMap, FieldMaps, SCHEMA_VERSION, canonical_fields};
use crate::{Capability, FieldName, NormalizedRecord, RawFetchResult, TesseraError, Value};

/// Applies field maps to raw provider output.
#[derive(Debug, Clone)]
pub struct Normalizer {
    maps: FieldMaps,
    schema_version: u32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(FieldMaps::new())
    }
}

impl Normalizer {
    /// Normalizer over `maps` at the current [`SCHEMA_VERSION`].
    #[must_use]
    pub const fn new(maps: FieldMaps) -> Self {
        Self {
            maps,
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Override the reported schema version.
    ///
    /// Only useful for exercising cache invalidation across versions.
    #[must_use]
    pub const fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Schema version stamped on records produced by this normalizer.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Field maps in use.
    #[must_use]
    pub const fn maps(&self) -> &FieldMaps {
        &self.maps
    }

    /// Map `raw` onto the canonical schema of `capability`.
    ///
    /// Bad data never fails: unmapped, missing, unparsable, or non-finite
    /// values become `None`, as do values of the wrong shape for the field
    /// (text in a numeric field, a series in a scalar one). The worst case is
    /// a record of all `None`.
    ///
    /// # Errors
    /// Returns `MalformedRaw` when `raw` is structurally wrong: an empty
    /// provider name, or a provider or capability different from the one the
    /// adapter was asked for.
    pub fn normalize(
        &self,
        provider: &str,
        capability: Capability,
        raw: &RawFetchResult,
    ) -> Result<NormalizedRecord, TesseraError> {
        if provider.trim().is_empty() || raw.provider.trim().is_empty() {
            return Err(TesseraError::MalformedRaw("empty provider name".into()));
        }
        if raw.provider != provider {
            return Err(TesseraError::MalformedRaw(format!(
                "result from `{}` returned for `{provider}`",
                raw.provider
            )));
        }
        if raw.capability != capability {
            return Err(TesseraError::MalformedRaw(format!(
                "{provider} returned {} for a {capability} request",
                raw.capability
            )));
        }

        let fallback;
        let map = if let Some(m) = self.maps.get(provider, capability) {
            m
        } else {
            fallback = FieldMap::verbatim(provider, capability);
            &fallback
        };

        let mut fields = BTreeMap::new();
        let mut field_sources = BTreeMap::new();
        for &name in canonical_fields(capability) {
            let value = map
                .rule(name)
                .and_then(|rule| {
                    raw.fields
                        .get(&rule.source)
                        .and_then(|v| rule.transform.apply(v))
                })
                .filter(|v| fits_schema(capability, v));
            let key = FieldName::from_static(name);
            if value.is_some() {
                field_sources.insert(key.clone(), provider.to_string());
            }
            fields.insert(key, value);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            provider = %provider,
            capability = %capability,
            populated = field_sources.len(),
            "normalized raw result"
        );

        Ok(NormalizedRecord {
            provider: provider.to_string(),
            capability,
            fields,
            field_sources,
        })
    }
}

/// Profile fields hold text, series capabilities hold series, every other
/// field a number. A mismatched value counts as unknown.
const fn fits_schema(capability: Capability, value: &Value) -> bool {
    match capability {
        Capability::Profile => matches!(value, Value::Text(_)),
        Capability::PriceHistory | Capability::IntradaySeries => {
            matches!(value, Value::Series(_))
        }
        Capability::Fundamentals | Capability::Quote | Capability::BatchScan => {
            matches!(value, Value::Number(_))
        }
    }
}
