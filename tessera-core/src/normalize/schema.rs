use crate::Capability;

/// Version of the canonical schema and transform semantics.
///
/// Bump whenever any transform's output changes meaning (a field renamed,
/// a ratio moved from fraction to percent, a field added or dropped). Cache
/// entries written under another version are never served.
pub const SCHEMA_VERSION: u32 = 1;

const FUNDAMENTALS: &[&str] = &[
    "roe",
    "eps_growth",
    "revenue_growth",
    "profit_margin",
    "pe_ratio",
    "debt_to_equity",
    "market_cap",
];
const QUOTE: &[&str] = &["price", "previous_close", "change_percent", "volume"];
const SERIES: &[&str] = &["close", "volume"];
const BATCH_SCAN: &[&str] = &["price", "change_percent", "volume", "market_cap"];
const PROFILE: &[&str] = &["name", "sector", "industry", "country"];

/// Canonical field names for a capability.
///
/// Ratios and growth rates (`roe`, `eps_growth`, `revenue_growth`,
/// `profit_margin`, `change_percent`) are percentages: `15.2` means 15.2%.
/// `close` and `volume` are series for `PriceHistory` and `IntradaySeries`.
#[must_use]
pub const fn canonical_fields(capability: Capability) -> &'static [&'static str] {
    match capability {
        Capability::Fundamentals => FUNDAMENTALS,
        Capability::Quote => QUOTE,
        Capability::PriceHistory | Capability::IntradaySeries => SERIES,
        Capability::BatchScan => BATCH_SCAN,
        Capability::Profile => PROFILE,
    }
}
