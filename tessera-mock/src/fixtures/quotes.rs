use tessera_core::RawValue;

fn base(s: &str) -> Option<(f64, f64, f64)> {
    match s {
        "AAPL" => Some((189.84, 187.15, 52_164_500.0)),
        "MSFT" => Some((415.5, 411.22, 18_220_100.0)),
        "GOOG" => Some((171.9, 173.05, 21_008_300.0)),
        _ => None,
    }
}

fn change_percent(price: f64, previous: f64) -> f64 {
    (price - previous) / previous * 100.0
}

pub fn by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (price, previous, volume) = base(s)?;
    Some(vec![
        ("price", RawValue::Number(price)),
        ("previous_close", RawValue::Number(previous)),
        ("change_percent", RawValue::Number(change_percent(price, previous))),
        ("volume", RawValue::Number(volume)),
    ])
}

pub fn scan_by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (price, previous, volume) = base(s)?;
    let cap = match s {
        "AAPL" => 3.4e12,
        "MSFT" => 3.1e12,
        _ => 2.1e12,
    };
    Some(vec![
        ("price", RawValue::Number(price)),
        ("change_percent", RawValue::Number(change_percent(price, previous))),
        ("volume", RawValue::Number(volume)),
        ("market_cap", RawValue::Number(cap)),
    ])
}
