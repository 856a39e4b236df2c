use core::fmt;
use serde::{Deserialize, Serialize};

/// High-level capability labels for routing, caching, errors, and telemetry.
///
/// Each provider adapter declares the subset it supports. Labels map
/// one-to-one with orchestrator endpoints and allow consistent `Display`
/// formatting and match-exhaustive handling when adding new capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Daily price history (end-of-day closes and volumes).
    PriceHistory,
    /// Fundamental ratios and growth figures.
    Fundamentals,
    /// Point-in-time quote.
    Quote,
    /// Intraday bar series.
    IntradaySeries,
    /// Screener-style snapshot used when scanning many entities.
    BatchScan,
    /// Slow-changing company attributes (name, sector, industry, country).
    Profile,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PriceHistory,
        Self::Fundamentals,
        Self::Quote,
        Self::IntradaySeries,
        Self::BatchScan,
        Self::Profile,
    ];

    /// Stable, kebab-case identifier for logs, errors, and cache paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceHistory => "price-history",
            Self::Fundamentals => "fundamentals",
            Self::Quote => "quote",
            Self::IntradaySeries => "intraday-series",
            Self::BatchScan => "batch-scan",
            Self::Profile => "profile",
        }
    }

    /// Whether the underlying data changes with market sessions rather than
    /// with corporate reporting.
    #[must_use]
    pub const fn is_time_series(self) -> bool {
        matches!(
            self,
            Self::PriceHistory | Self::IntradaySeries | Self::Quote | Self::BatchScan
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Capability> for String {
    fn from(c: Capability) -> Self {
        c.as_str().to_string()
    }
}

impl core::str::FromStr for Capability {
    type Err = crate::TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::TesseraError::InvalidArg(format!("unknown capability: {s}")))
    }
}
