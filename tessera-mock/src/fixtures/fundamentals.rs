use tessera_core::RawValue;

pub fn by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (roe, eps, rev, margin, pe, de, cap) = match s {
        "AAPL" => (147.2, 10.1, 2.0, 24.3, 29.8, 1.79, 3.4e12),
        "MSFT" => (38.5, 20.4, 15.7, 36.3, 35.1, 0.33, 3.1e12),
        "GOOG" => (29.8, 31.2, 13.9, 27.7, 23.4, 0.09, 2.1e12),
        _ => return None,
    };
    Some(vec![
        ("roe", RawValue::Number(roe)),
        ("eps_growth", RawValue::Number(eps)),
        ("revenue_growth", RawValue::Number(rev)),
        ("profit_margin", RawValue::Number(margin)),
        ("pe_ratio", RawValue::Number(pe)),
        ("debt_to_equity", RawValue::Number(de)),
        ("market_cap", RawValue::Number(cap)),
    ])
}
