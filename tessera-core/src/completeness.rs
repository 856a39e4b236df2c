use std::collections::BTreeMap;
use std::sync::Arc;

use crate::normalize::canonical_fields;
use crate::{Capability, FieldName, Value};

/// Decides when a composite is good enough to stop consulting providers.
///
/// Rules see the composite's current fields (every canonical field present,
/// `None` when still missing). Which fields matter is a product decision, so
/// rules are injected per capability rather than fixed here.
pub trait CompletenessRule: Send + Sync + core::fmt::Debug {
    /// Whether `fields` satisfy the rule.
    fn is_complete(&self, fields: &BTreeMap<FieldName, Option<Value>>) -> bool;
}

/// Complete once every canonical field is populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllCanonicalFields;

impl CompletenessRule for AllCanonicalFields {
    fn is_complete(&self, fields: &BTreeMap<FieldName, Option<Value>>) -> bool {
        !fields.is_empty() && fields.values().all(Option::is_some)
    }
}

/// Complete once the listed fields are populated.
#[derive(Debug, Clone)]
pub struct RequiredFields(Vec<FieldName>);

impl RequiredFields {
    /// Rule requiring `fields`.
    #[must_use]
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Required field names.
    #[must_use]
    pub fn fields(&self) -> &[FieldName] {
        &self.0
    }
}

impl CompletenessRule for RequiredFields {
    fn is_complete(&self, fields: &BTreeMap<FieldName, Option<Value>>) -> bool {
        self.0
            .iter()
            .all(|f| fields.get(f.as_str()).is_some_and(Option::is_some))
    }
}

/// Never complete: every capable provider is consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl CompletenessRule for Exhaustive {
    fn is_complete(&self, _fields: &BTreeMap<FieldName, Option<Value>>) -> bool {
        false
    }
}

/// Rule backed by a closure.
pub struct FnRule<F>(pub F);

impl<F> core::fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnRule")
    }
}

impl<F> CompletenessRule for FnRule<F>
where
    F: Fn(&BTreeMap<FieldName, Option<Value>>) -> bool + Send + Sync,
{
    fn is_complete(&self, fields: &BTreeMap<FieldName, Option<Value>>) -> bool {
        (self.0)(fields)
    }
}

/// Built-in rule for a capability.
///
/// - Fundamentals: `roe`, `eps_growth`, `revenue_growth`
/// - Quote and BatchScan: `price`
/// - PriceHistory and IntradaySeries: `close`
/// - Profile: every canonical field
#[must_use]
pub fn default_rule(capability: Capability) -> Arc<dyn CompletenessRule> {
    match capability {
        Capability::Fundamentals => Arc::new(RequiredFields::new([
            "roe",
            "eps_growth",
            "revenue_growth",
        ])),
        Capability::Quote | Capability::BatchScan => Arc::new(RequiredFields::new(["price"])),
        Capability::PriceHistory | Capability::IntradaySeries => {
            Arc::new(RequiredFields::new(["close"]))
        }
        Capability::Profile => Arc::new(AllCanonicalFields),
    }
}

/// Whether every name the rule could require exists in the schema.
///
/// Used by the orchestrator builder to reject rules naming unknown fields.
#[must_use]
pub fn required_fields_known(capability: Capability, rule: &RequiredFields) -> bool {
    let schema = canonical_fields(capability);
    rule.fields().iter().all(|f| schema.contains(&f.as_str()))
}
