//! Raw, normalized, and composite records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Capability, EntityId, FieldName, RawValue, Value};

/// Output of a single adapter call, in the provider's own field names and units.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFetchResult {
    /// Provider that produced the result.
    pub provider: String,
    /// Capability the result answers.
    pub capability: Capability,
    /// Entity the result describes.
    pub entity: EntityId,
    /// Provider-specific field map.
    pub fields: BTreeMap<String, RawValue>,
    /// When the provider answered.
    pub fetched_at: DateTime<Utc>,
    /// Provider-reported soft error accompanying the payload, if any.
    pub error: Option<String>,
}

impl RawFetchResult {
    /// Start an empty result for `provider`/`capability`/`entity`, stamped now.
    #[must_use]
    pub fn new(provider: impl Into<String>, capability: Capability, entity: EntityId) -> Self {
        Self {
            provider: provider.into(),
            capability,
            entity,
            fields: BTreeMap::new(),
            fetched_at: Utc::now(),
            error: None,
        }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// True when the provider returned no field at all, or only `Missing` values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| matches!(v, RawValue::Missing))
    }
}

/// One provider's output mapped onto the canonical schema.
///
/// Every canonical field of the capability is present as a key; `None` marks
/// absence. Values are finite and on their canonical scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Provider the record came from.
    pub provider: String,
    /// Capability of the record.
    pub capability: Capability,
    /// Canonical fields.
    pub fields: BTreeMap<FieldName, Option<Value>>,
    /// Provider per populated field (always `provider` for a single record).
    pub field_sources: BTreeMap<FieldName, String>,
}

impl NormalizedRecord {
    /// Number of non-null fields.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.fields.values().filter(|v| v.is_some()).count()
    }

    /// Value of a field when present and non-null.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).and_then(Option::as_ref)
    }
}

/// Merged result of trying several providers for one `(capability, entity)`.
///
/// Built fresh on every orchestration pass and never mutated afterwards; a
/// later fetch supersedes it with a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    capability: Capability,
    entity: EntityId,
    fields: BTreeMap<FieldName, Option<Value>>,
    field_sources: BTreeMap<FieldName, String>,
    fetched_at: DateTime<Utc>,
    schema_version: u32,
}

impl CompositeRecord {
    /// Assemble a composite from already merged parts.
    #[must_use]
    pub const fn from_parts(
        capability: Capability,
        entity: EntityId,
        fields: BTreeMap<FieldName, Option<Value>>,
        field_sources: BTreeMap<FieldName, String>,
        fetched_at: DateTime<Utc>,
        schema_version: u32,
    ) -> Self {
        Self {
            capability,
            entity,
            fields,
            field_sources,
            fetched_at,
            schema_version,
        }
    }

    /// Capability the record answers.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.capability
    }

    /// Entity the record describes.
    #[must_use]
    pub const fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// All canonical fields, including explicit nulls.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<FieldName, Option<Value>> {
        &self.fields
    }

    /// Provenance: which provider supplied each populated field.
    #[must_use]
    pub const fn field_sources(&self) -> &BTreeMap<FieldName, String> {
        &self.field_sources
    }

    /// When the orchestration pass that built this record finished.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Normalizer schema version the values were produced under.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Value of a field when present and non-null.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).and_then(Option::as_ref)
    }

    /// Numeric value of a field when present and numeric.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Provider that supplied `field`, if it is populated.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&str> {
        self.field_sources.get(field).map(String::as_str)
    }

    /// Number of populated fields.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.fields.values().filter(|v| v.is_some()).count()
    }

    /// Names of fields that are still null.
    pub fn missing(&self) -> impl Iterator<Item = &FieldName> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k)
    }

    /// Distinct providers that contributed at least one field.
    #[must_use]
    pub fn providers(&self) -> BTreeSet<String> {
        self.field_sources.values().cloned().collect()
    }
}
