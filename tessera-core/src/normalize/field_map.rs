use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Transform, canonical_fields};
use crate::{Capability, FieldName, TesseraError};

/// One canonical field's source key and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Canonical field produced.
    pub canonical: FieldName,
    /// Key in the provider's raw field map.
    pub source: String,
    /// Conversion applied to the raw value.
    pub transform: Transform,
}

impl FieldRule {
    /// Build a rule.
    pub fn new(canonical: &'static str, source: impl Into<String>, transform: Transform) -> Self {
        Self {
            canonical: FieldName::from_static(canonical),
            source: source.into(),
            transform,
        }
    }
}

/// Field rules for one (provider, capability) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    /// Provider name the map applies to.
    pub provider: String,
    /// Capability the map applies to.
    pub capability: Capability,
    /// One rule per mapped canonical field.
    pub rules: Vec<FieldRule>,
}

impl FieldMap {
    /// Rule for a canonical field, if mapped.
    #[must_use]
    pub fn rule(&self, canonical: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.canonical.as_str() == canonical)
    }

    /// Map that reads canonical names verbatim.
    ///
    /// Profile fields use [`Transform::Text`], series fields
    /// [`Transform::Series`], and every other capability is numeric and uses
    /// [`Transform::Identity`], so non-numeric text never fills those fields.
    #[must_use]
    pub fn verbatim(provider: impl Into<String>, capability: Capability) -> Self {
        let rules = canonical_fields(capability)
            .iter()
            .map(|&f| {
                let transform = match capability {
                    Capability::Profile => Transform::Text,
                    Capability::PriceHistory | Capability::IntradaySeries => Transform::Series,
                    _ => Transform::Identity,
                };
                FieldRule::new(f, f, transform)
            })
            .collect();
        Self {
            provider: provider.into(),
            capability,
            rules,
        }
    }

    fn validate(&self) -> Result<(), TesseraError> {
        if self.provider.trim().is_empty() {
            return Err(TesseraError::InvalidArg(
                "field map provider name is empty".into(),
            ));
        }
        let schema = canonical_fields(self.capability);
        for (i, rule) in self.rules.iter().enumerate() {
            if !schema.contains(&rule.canonical.as_str()) {
                return Err(TesseraError::InvalidArg(format!(
                    "{}/{}: `{}` is not a canonical field",
                    self.provider, self.capability, rule.canonical
                )));
            }
            if self.rules[..i].iter().any(|r| r.canonical == rule.canonical) {
                return Err(TesseraError::InvalidArg(format!(
                    "{}/{}: `{}` mapped twice",
                    self.provider, self.capability, rule.canonical
                )));
            }
            if let Transform::Scale(f) = rule.transform
                && !f.is_finite()
            {
                return Err(TesseraError::InvalidArg(format!(
                    "{}/{}: non-finite scale factor for `{}`",
                    self.provider, self.capability, rule.canonical
                )));
            }
        }
        Ok(())
    }
}

/// Immutable lookup of field maps by (provider, capability).
///
/// Resolved once when the orchestrator is built. Pairs without a registered
/// map fall back to [`FieldMap::verbatim`].
#[derive(Debug, Clone, Default)]
pub struct FieldMaps {
    maps: HashMap<(String, Capability), FieldMap>,
}

impl FieldMaps {
    /// Empty table; every pair reads canonical names verbatim.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map, replacing any earlier map for the same pair.
    ///
    /// # Errors
    /// Returns `InvalidArg` for unknown canonical fields, duplicate rules, an
    /// empty provider name, or a non-finite scale factor.
    pub fn insert(&mut self, map: FieldMap) -> Result<(), TesseraError> {
        map.validate()?;
        self.maps
            .insert((map.provider.clone(), map.capability), map);
        Ok(())
    }

    /// Builder-style registration from `(canonical, source, transform)` triples.
    ///
    /// # Errors
    /// See [`FieldMaps::insert`].
    pub fn with(
        mut self,
        provider: &str,
        capability: Capability,
        rules: &[(&'static str, &str, Transform)],
    ) -> Result<Self, TesseraError> {
        self.insert(FieldMap {
            provider: provider.to_string(),
            capability,
            rules: rules
                .iter()
                .map(|&(c, s, t)| FieldRule::new(c, s, t))
                .collect(),
        })?;
        Ok(self)
    }

    /// Registered map for a pair, if any.
    #[must_use]
    pub fn get(&self, provider: &str, capability: Capability) -> Option<&FieldMap> {
        self.maps.get(&(provider.to_string(), capability))
    }

    /// Number of registered maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether no map is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
