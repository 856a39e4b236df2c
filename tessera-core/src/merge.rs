use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::normalize::canonical_fields;
use crate::{Capability, CompositeRecord, EntityId, FieldName, NormalizedRecord, Value};

/// Accumulates normalized records into a composite, first non-null wins.
///
/// Starts with every canonical field of the capability set to `None`. Each
/// merged record may only fill fields that are still `None`; populated fields
/// are never overwritten, so merging in priority order lets a lower-priority
/// provider fill gaps without displacing a higher-priority value.
#[derive(Debug, Clone)]
pub struct CompositeBuilder {
    capability: Capability,
    entity: EntityId,
    fields: BTreeMap<FieldName, Option<Value>>,
    field_sources: BTreeMap<FieldName, String>,
}

impl CompositeBuilder {
    /// Empty composite for `capability`/`entity`.
    #[must_use]
    pub fn new(capability: Capability, entity: EntityId) -> Self {
        let fields = canonical_fields(capability)
            .iter()
            .map(|&f| (FieldName::from_static(f), None))
            .collect();
        Self {
            capability,
            entity,
            fields,
            field_sources: BTreeMap::new(),
        }
    }

    /// Merge `record`, returning the fields it was first to populate.
    ///
    /// Records for another capability contribute nothing. Fields outside the
    /// canonical schema are ignored.
    pub fn merge(&mut self, record: &NormalizedRecord) -> Vec<FieldName> {
        let mut contributed = Vec::new();
        if record.capability != self.capability {
            return contributed;
        }
        for (name, slot) in &mut self.fields {
            if slot.is_some() {
                continue;
            }
            if let Some(v) = record.get(name.as_str())
                && v.is_well_formed()
            {
                *slot = Some(v.clone());
                let source = record
                    .field_sources
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or_else(|| record.provider.clone());
                self.field_sources.insert(name.clone(), source);
                contributed.push(name.clone());
            }
        }
        contributed
    }

    /// Current fields, including explicit nulls.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<FieldName, Option<Value>> {
        &self.fields
    }

    /// Current provenance.
    #[must_use]
    pub const fn field_sources(&self) -> &BTreeMap<FieldName, String> {
        &self.field_sources
    }

    /// Number of populated fields.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.field_sources.len()
    }

    /// Whether no field has been populated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_sources.is_empty()
    }

    /// Capability being assembled.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.capability
    }

    /// Freeze into an immutable record.
    #[must_use]
    pub fn finish(self, fetched_at: DateTime<Utc>, schema_version: u32) -> CompositeRecord {
        CompositeRecord::from_parts(
            self.capability,
            self.entity,
            self.fields,
            self.field_sources,
            fetched_at,
            schema_version,
        )
    }
}

/// Merge normalized records in priority order (first is highest).
///
/// Convenience over [`CompositeBuilder`] for callers that already hold every
/// record.
pub fn merge_by_priority<'a, I>(
    capability: Capability,
    entity: EntityId,
    records: I,
    fetched_at: DateTime<Utc>,
    schema_version: u32,
) -> CompositeRecord
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut builder = CompositeBuilder::new(capability, entity);
    for r in records {
        builder.merge(r);
    }
    builder.finish(fetched_at, schema_version)
}
