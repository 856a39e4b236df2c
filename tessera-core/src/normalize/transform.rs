use serde::{Deserialize, Serialize};

use crate::{Observation, RawValue, Value};

/// Pure conversion from a provider's raw value to a canonical value.
///
/// Every transform maps absent input to `None` and, separately, maps any
/// non-finite number (before or after scaling) to `None`. The two checks are
/// independent: NaN is not "missing" under float equality and would otherwise
/// slip through.
///
/// Numeric transforms also accept numeric text (`"15.2"`), since several
/// providers quote numbers as strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "factor", rename_all = "snake_case")]
pub enum Transform {
    /// Pass the number through unchanged (sanitized, series point-wise).
    /// Text must parse as a number; placeholders such as `"N/A"` are `None`.
    Identity,
    /// Decimal fraction to percentage: `0.152` becomes `15.2`.
    FractionToPercent,
    /// Multiply by a constant factor, e.g. thousands to units.
    Scale(f64),
    /// Non-empty trimmed text; numbers are rejected.
    Text,
    /// Time series; non-finite points become null observations.
    Series,
}

impl Transform {
    /// Apply the transform.
    #[must_use]
    pub fn apply(&self, raw: &RawValue) -> Option<Value> {
        match self {
            Self::Identity => scaled(raw, 1.0),
            Self::FractionToPercent => scaled(raw, 100.0),
            Self::Scale(factor) => scaled(raw, *factor),
            Self::Text => match raw {
                RawValue::Text(s) => text(s),
                _ => None,
            },
            Self::Series => match raw {
                RawValue::Series(points) => series(points, 1.0),
                _ => None,
            },
        }
    }
}

fn scaled(raw: &RawValue, factor: f64) -> Option<Value> {
    if !factor.is_finite() {
        return None;
    }
    let v = match raw {
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Series(points) => return series(points, factor),
        RawValue::Missing => return None,
    };
    if !v.is_finite() {
        return None;
    }
    Value::number(v * factor)
}

fn text(s: &str) -> Option<Value> {
    let t = s.trim();
    (!t.is_empty()).then(|| Value::Text(t.to_string()))
}

fn series(points: &[(i64, f64)], factor: f64) -> Option<Value> {
    if points.is_empty() {
        return None;
    }
    let mut out: Vec<Observation> = points
        .iter()
        .map(|&(ts, v)| Observation {
            ts,
            value: Some(v * factor).filter(|x| v.is_finite() && x.is_finite()),
        })
        .collect();
    out.sort_by_key(|o| o.ts);
    out.dedup_by_key(|o| o.ts);
    if out.iter().all(|o| o.value.is_none()) {
        return None;
    }
    Some(Value::Series(out))
}
