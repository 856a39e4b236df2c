use tessera_core::RawValue;

pub fn by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (name, sector, industry) = match s {
        "AAPL" => ("Apple Inc.", "Technology", "Consumer Electronics"),
        "MSFT" => ("Microsoft Corporation", "Technology", "Software - Infrastructure"),
        "GOOG" => ("Alphabet Inc.", "Communication Services", "Internet Content & Information"),
        _ => return None,
    };
    Some(vec![
        ("name", RawValue::Text(name.into())),
        ("sector", RawValue::Text(sector.into())),
        ("industry", RawValue::Text(industry.into())),
        ("country", RawValue::Text("United States".into())),
    ])
}
