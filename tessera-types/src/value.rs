//! Raw and canonical field values.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Name of a field, either a canonical schema name or a provider source key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldName(Cow<'static, str>);

impl FieldName {
    /// Field name backed by a static string (no allocation).
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FieldName {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for FieldName {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl core::borrow::Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FieldName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value as reported by an upstream provider, before normalization.
///
/// Numbers may be non-finite here; the normalizer is the only component that
/// looks at `RawValue` and it resolves NaN and infinities to absence.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Numeric value in the provider's own unit and scale.
    Number(f64),
    /// Free text.
    Text(String),
    /// Time series of `(unix seconds, value)` points.
    Series(Vec<(i64, f64)>),
    /// Explicitly absent.
    Missing,
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

/// One point of a normalized series. Non-finite inputs become `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Finite value, or `None` when the provider had no usable number.
    pub value: Option<f64>,
}

/// A canonical, normalized value. Numbers are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Finite number on the canonical scale for its field.
    Number(f64),
    /// Free text.
    Text(String),
    /// Ordered series of observations.
    Series(Vec<Observation>),
}

impl Value {
    /// Checked numeric constructor: `None` for NaN and infinities.
    #[must_use]
    pub fn number(v: f64) -> Option<Self> {
        v.is_finite().then_some(Self::Number(v))
    }

    /// Numeric payload, if this is a number.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Series payload, if this is a series.
    #[must_use]
    pub fn as_series(&self) -> Option<&[Observation]> {
        match self {
            Self::Series(s) => Some(s),
            _ => None,
        }
    }

    /// True if no non-finite number is reachable from this value.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Number(v) => v.is_finite(),
            Self::Text(_) => true,
            Self::Series(points) => points
                .iter()
                .all(|p| p.value.is_none_or(f64::is_finite)),
        }
    }
}
