use std::collections::BTreeMap;

use tessera_core::{Capability, RawValue};

mod fundamentals;
mod history;
mod profile;
mod quotes;

/// Raw fields for a capability/symbol pair, in canonical names.
pub fn by_symbol(capability: Capability, symbol: &str) -> Option<BTreeMap<String, RawValue>> {
    let pairs: Vec<(&'static str, RawValue)> = match capability {
        Capability::Fundamentals => fundamentals::by_symbol(symbol)?,
        Capability::Quote => quotes::by_symbol(symbol)?,
        Capability::BatchScan => quotes::scan_by_symbol(symbol)?,
        Capability::PriceHistory => history::daily_by_symbol(symbol)?,
        Capability::IntradaySeries => history::intraday_by_symbol(symbol)?,
        Capability::Profile => profile::by_symbol(symbol)?,
    };
    Some(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}
